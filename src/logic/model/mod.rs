//! Model Module - Unsupervised outlier detection
//!
//! Fits a model on the retrieved matrix and labels every row.
//! The model is a strategy object; the pipeline only needs `OutlierModel`.

pub mod forest;
pub mod threshold;

#[cfg(test)]
mod tests;

pub use forest::IsolationForest;
pub use threshold::ContaminationThreshold;

use serde::{Deserialize, Serialize};

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FeatureVector;

/// Minimum rows needed to fit
pub const MIN_FIT_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    Anomalous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub key: String,
    pub label: Label,
    /// In [0, 1]; higher = more anomalous
    pub score: f64,
}

impl DetectionResult {
    pub fn is_anomalous(&self) -> bool {
        self.label == Label::Anomalous
    }
}

/// Labels of one fit together with the cut-off that produced them
#[derive(Debug, Clone)]
pub struct Detection {
    pub results: Vec<DetectionResult>,
    pub threshold: ContaminationThreshold,
}

/// Unsupervised model that labels a whole matrix at once
pub trait OutlierModel: Send + Sync {
    fn name(&self) -> &str;

    /// One result per row, in row order. `keys[i]` names `vectors[i]`.
    fn fit(&self, keys: &[String], vectors: &[FeatureVector], contamination: f64) -> PipelineResult<Detection>;

    fn fit_and_label(
        &self,
        keys: &[String],
        vectors: &[FeatureVector],
        contamination: f64,
    ) -> PipelineResult<Vec<DetectionResult>> {
        self.fit(keys, vectors, contamination).map(|d| d.results)
    }
}

/// Shape checks shared by model implementations
pub(crate) fn check_matrix(keys: &[String], vectors: &[FeatureVector]) -> PipelineResult<usize> {
    if keys.len() != vectors.len() {
        return Err(PipelineError::config(format!(
            "{} keys supplied for {} vectors",
            keys.len(),
            vectors.len()
        )));
    }
    if vectors.len() < MIN_FIT_ROWS {
        return Err(PipelineError::InsufficientData {
            found: vectors.len(),
            required: MIN_FIT_ROWS,
        });
    }

    let dim = vectors[0].dim();
    for (key, vector) in keys.iter().zip(vectors) {
        if vector.dim() != dim {
            return Err(PipelineError::DimensionMismatch {
                key: key.clone(),
                expected: dim,
                actual: vector.dim(),
            });
        }
        if !vector.is_finite() {
            return Err(PipelineError::InvalidVector {
                key: key.clone(),
                reason: "non-finite component".to_string(),
            });
        }
    }
    Ok(dim)
}
