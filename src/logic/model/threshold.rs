//! Contamination Threshold
//!
//! Turns a score vector into labels. With `k = floor(contamination * n)` the
//! cut-off is the score ranked `k + 1`; a row is anomalous only when its score
//! lies strictly above it. Equal scores always get equal labels, so at most
//! `k` rows are flagged and a uniform population flags none.

use serde::{Deserialize, Serialize};

use super::Label;
use crate::logic::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContaminationThreshold {
    pub contamination: f64,
    pub anomalous_count: usize,
    /// Highest score still labelled normal; `None` when `k` is 0
    pub cutoff: Option<f64>,
}

impl ContaminationThreshold {
    pub fn validate(contamination: f64) -> PipelineResult<()> {
        if contamination.is_finite() && contamination > 0.0 && contamination < 1.0 {
            Ok(())
        } else {
            Err(PipelineError::config(format!(
                "contamination must lie in (0, 1), got {}",
                contamination
            )))
        }
    }

    pub fn anomalous_count(rows: usize, contamination: f64) -> usize {
        ((contamination * rows as f64).floor() as usize).min(rows)
    }

    /// Label `scores` and report the derived cut-off
    pub fn apply(scores: &[f64], contamination: f64) -> PipelineResult<(Self, Vec<Label>)> {
        Self::validate(contamination)?;

        let k = Self::anomalous_count(scores.len(), contamination);
        let mut ranked: Vec<f64> = scores.to_vec();
        ranked.sort_by(|a, b| b.total_cmp(a));

        let cutoff = if k == 0 { None } else { ranked.get(k).copied() };
        let labels: Vec<Label> = scores
            .iter()
            .map(|score| match cutoff {
                Some(cut) if *score > cut => Label::Anomalous,
                _ => Label::Normal,
            })
            .collect();
        let anomalous_count = labels.iter().filter(|l| **l == Label::Anomalous).count();

        Ok((
            Self {
                contamination,
                anomalous_count,
                cutoff,
            },
            labels,
        ))
    }
}
