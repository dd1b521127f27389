//! Feature Vector - Core data structure for detection input
//!
//! Fixed-dimension float vector derived once per record. Every vectorizer
//! strategy goes through `check_output` so downstream stages can rely on
//! equal dimensions and finite components.

use serde::{Deserialize, Serialize};

use super::record::Record;
use crate::logic::error::{PipelineError, PipelineResult};

// ============================================================================
// FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Build from f64 columns
    pub fn from_f64(values: &[f64]) -> Self {
        Self {
            values: values.iter().map(|v| *v as f32).collect(),
        }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.values
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Keep the first `dim` components (strips store-side padding)
    pub fn truncated(mut self, dim: usize) -> Self {
        self.values.truncate(dim);
        self
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

// ============================================================================
// VECTORIZER STRATEGY
// ============================================================================

/// Turns records into feature vectors, one per record, all of equal dimension.
///
/// Implementations must be deterministic for the same input.
pub trait Vectorizer: Send + Sync {
    fn name(&self) -> &str;

    fn vectorize(&self, records: &[Record]) -> PipelineResult<Vec<FeatureVector>>;
}

/// Numeric columns of every record as a row-major matrix.
///
/// Rejects ragged input and non-finite values, naming the offending record.
pub fn numeric_matrix(records: &[Record]) -> PipelineResult<Vec<Vec<f64>>> {
    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };
    let width = first.fields.len();

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        if record.fields.len() != width {
            return Err(PipelineError::DimensionMismatch {
                key: record.id.clone(),
                expected: width,
                actual: record.fields.len(),
            });
        }
        if let Some(pos) = record.fields.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidVector {
                key: record.id.clone(),
                reason: format!("field {} is not finite", pos),
            });
        }
        rows.push(record.fields.clone());
    }
    Ok(rows)
}

/// Validate vectorizer output against its input.
pub fn check_output(records: &[Record], vectors: &[FeatureVector]) -> PipelineResult<()> {
    if records.len() != vectors.len() {
        return Err(PipelineError::config(format!(
            "vectorizer produced {} vectors for {} records",
            vectors.len(),
            records.len()
        )));
    }

    let Some(first) = vectors.first() else {
        return Ok(());
    };
    let dim = first.dim();
    if dim == 0 {
        return Err(PipelineError::InvalidVector {
            key: records[0].id.clone(),
            reason: "vectorizer produced a zero-dimension vector".to_string(),
        });
    }

    for (record, vector) in records.iter().zip(vectors) {
        if vector.dim() != dim {
            return Err(PipelineError::DimensionMismatch {
                key: record.id.clone(),
                expected: dim,
                actual: vector.dim(),
            });
        }
        if !vector.is_finite() {
            return Err(PipelineError::InvalidVector {
                key: record.id.clone(),
                reason: "vector contains NaN or Inf".to_string(),
            });
        }
    }
    Ok(())
}
