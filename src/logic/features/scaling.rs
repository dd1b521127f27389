//! Column scaling vectorizers
//!
//! - `RawVectorizer`: numeric fields as-is (transactions, network logs)
//! - `MinMaxVectorizer`: per-column `(x - min) / (max - min)`
//! - `MaxScaleVectorizer`: per-column `x / max(|x|)` (on-chain transfers)

use super::record::Record;
use super::vector::{check_output, numeric_matrix, FeatureVector, Vectorizer};
use crate::logic::error::PipelineResult;

// ============================================================================
// RAW
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RawVectorizer;

impl Vectorizer for RawVectorizer {
    fn name(&self) -> &str {
        "raw"
    }

    fn vectorize(&self, records: &[Record]) -> PipelineResult<Vec<FeatureVector>> {
        let rows = numeric_matrix(records)?;
        let vectors: Vec<FeatureVector> = rows.iter().map(|r| FeatureVector::from_f64(r)).collect();
        check_output(records, &vectors)?;
        Ok(vectors)
    }
}

// ============================================================================
// MIN-MAX
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MinMaxVectorizer;

impl Vectorizer for MinMaxVectorizer {
    fn name(&self) -> &str {
        "min_max"
    }

    fn vectorize(&self, records: &[Record]) -> PipelineResult<Vec<FeatureVector>> {
        let rows = numeric_matrix(records)?;
        let width = rows.first().map_or(0, |r| r.len());

        let mut min_vals = vec![f64::INFINITY; width];
        let mut max_vals = vec![f64::NEG_INFINITY; width];
        for row in &rows {
            for (j, v) in row.iter().enumerate() {
                min_vals[j] = min_vals[j].min(*v);
                max_vals[j] = max_vals[j].max(*v);
            }
        }

        let vectors: Vec<FeatureVector> = rows
            .iter()
            .map(|row| {
                let scaled: Vec<f64> = row
                    .iter()
                    .enumerate()
                    .map(|(j, v)| {
                        let range = max_vals[j] - min_vals[j];
                        // Constant column carries no signal
                        if range > 0.0 { (v - min_vals[j]) / range } else { 0.0 }
                    })
                    .collect();
                FeatureVector::from_f64(&scaled)
            })
            .collect();

        check_output(records, &vectors)?;
        Ok(vectors)
    }
}

// ============================================================================
// MAX-SCALE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MaxScaleVectorizer;

impl Vectorizer for MaxScaleVectorizer {
    fn name(&self) -> &str {
        "max_scale"
    }

    fn vectorize(&self, records: &[Record]) -> PipelineResult<Vec<FeatureVector>> {
        let rows = numeric_matrix(records)?;
        let width = rows.first().map_or(0, |r| r.len());

        let mut max_abs = vec![0.0_f64; width];
        for row in &rows {
            for (j, v) in row.iter().enumerate() {
                max_abs[j] = max_abs[j].max(v.abs());
            }
        }

        let vectors: Vec<FeatureVector> = rows
            .iter()
            .map(|row| {
                let scaled: Vec<f64> = row
                    .iter()
                    .zip(&max_abs)
                    .map(|(v, m)| if *m > 0.0 { v / m } else { 0.0 })
                    .collect();
                FeatureVector::from_f64(&scaled)
            })
            .collect();

        check_output(records, &vectors)?;
        Ok(vectors)
    }
}
