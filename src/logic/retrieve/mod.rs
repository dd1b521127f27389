//! Retriever - point reads of previously written vectors
//!
//! Reads keys back in their original order, strips store padding down to the
//! run's dimension and reports keys that were not found. A missing key is
//! excluded from the matrix and never replaced with a zero vector.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::logic::error::PipelineError;
use crate::logic::features::FeatureVector;
use crate::logic::pipeline::RunControl;
use crate::logic::store::VectorStoreClient;

/// Outcome of one point Read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Fetched {
    Found { key: String, vector: FeatureVector },
    /// Store answered `found=false`
    Missing { key: String },
    Failed { key: String, error: String },
}

impl Fetched {
    pub fn key(&self) -> &str {
        match self {
            Fetched::Found { key, .. } | Fetched::Missing { key } | Fetched::Failed { key, .. } => key,
        }
    }
}

/// Aligned matrix of the vectors that came back, plus what didn't
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalSummary {
    pub keys: Vec<String>,
    pub vectors: Vec<FeatureVector>,
    pub missing: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl RetrievalSummary {
    pub fn from_fetched(fetched: Vec<Fetched>) -> Self {
        let mut summary = Self::default();
        for item in fetched {
            match item {
                Fetched::Found { key, vector } => {
                    summary.keys.push(key);
                    summary.vectors.push(vector);
                }
                Fetched::Missing { key } => summary.missing.push(key),
                Fetched::Failed { key, error } => summary.failed.push((key, error)),
            }
        }
        summary
    }

    pub fn found(&self) -> usize {
        self.vectors.len()
    }
}

pub struct Retriever {
    client: VectorStoreClient,
    control: RunControl,
}

impl Retriever {
    pub fn new(client: VectorStoreClient) -> Self {
        Self {
            client,
            control: RunControl::default(),
        }
    }

    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    /// One Read per key, results in key order.
    ///
    /// Stored vectors longer than `expected_dim` are truncated (padding);
    /// shorter ones are reported as `Failed`. Once the run is cancelled the
    /// remaining keys are `Failed` without a Read.
    pub async fn fetch(&self, keys: &[String], keyspace: &str, table: &str, expected_dim: usize) -> Vec<Fetched> {
        let mut fetched = Vec::with_capacity(keys.len());

        for key in keys {
            if self.control.is_cancelled() {
                fetched.push(Fetched::Failed {
                    key: key.clone(),
                    error: PipelineError::Cancelled.to_string(),
                });
                continue;
            }

            let item = match self.client.read(keyspace, table, key).await {
                Ok(Some(raw)) => strip_padding(key, raw, expected_dim),
                Ok(None) => {
                    log::warn!(
                        "{} ({}.{}); excluded from detection",
                        PipelineError::MissingKey(key.clone()),
                        keyspace,
                        table
                    );
                    Fetched::Missing { key: key.clone() }
                }
                Err(e) => {
                    log::error!("Read of '{}' from {}.{} failed: {}", key, keyspace, table, e);
                    Fetched::Failed { key: key.clone(), error: e.to_string() }
                }
            };
            fetched.push(item);
        }

        let (found, missing, failed) = fetched.iter().fold((0, 0, 0), |(f, m, e), item| match item {
            Fetched::Found { .. } => (f + 1, m, e),
            Fetched::Missing { .. } => (f, m + 1, e),
            Fetched::Failed { .. } => (f, m, e + 1),
        });
        log::info!(
            "Retrieved {}/{} vectors ({} missing, {} failed)",
            found,
            keys.len(),
            missing,
            failed
        );

        fetched
    }

    pub async fn fetch_summary(&self, keys: &[String], keyspace: &str, table: &str, expected_dim: usize) -> RetrievalSummary {
        RetrievalSummary::from_fetched(self.fetch(keys, keyspace, table, expected_dim).await)
    }
}

fn strip_padding(key: &str, raw: Vec<f32>, expected_dim: usize) -> Fetched {
    if raw.len() < expected_dim {
        let err = PipelineError::DimensionMismatch {
            key: key.to_string(),
            expected: expected_dim,
            actual: raw.len(),
        };
        log::error!("{}", err);
        return Fetched::Failed { key: key.to_string(), error: err.to_string() };
    }

    let vector = FeatureVector::new(raw).truncated(expected_dim);
    if !vector.is_finite() {
        let err = PipelineError::InvalidVector {
            key: key.to_string(),
            reason: "stored vector contains NaN or infinite components".to_string(),
        };
        log::error!("{}", err);
        return Fetched::Failed { key: key.to_string(), error: err.to_string() };
    }

    Fetched::Found { key: key.to_string(), vector }
}
