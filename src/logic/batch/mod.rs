//! Batch Upsert Module - BatchWrite dispatch and per-batch accounting
//!
//! Partitions an ordered collection of (key, vector) pairs into contiguous
//! batches and sends one BatchWrite per batch. A failed batch is recorded and
//! the next batch is still sent. Nothing is retried unless the caller asks
//! for it through `retry_failed`.

pub mod keys;


pub use keys::KeyBuilder;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FeatureVector;
use crate::logic::pipeline::RunControl;
use crate::logic::store::VectorStoreClient;

pub type KeyedVector = (String, FeatureVector);

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOutcome {
    Written,
    /// Store answered `success=false`
    Rejected,
    TransportFailed,
    /// Never dispatched because the run was cancelled
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchWriteResult {
    pub batch_index: usize,
    pub attempted: usize,
    pub succeeded: bool,
    pub error_message: Option<String>,
    pub outcome: BatchOutcome,
    /// Keys carried by this batch, in input order
    pub keys: Vec<String>,
}

/// Per-key outcome for the single-Write path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyWriteResult {
    pub key: String,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertSummary {
    pub total_batches: usize,
    pub written_batches: usize,
    pub failed_batches: usize,
    pub cancelled_batches: usize,
    pub vectors_written: usize,
    pub vectors_not_written: usize,
}

impl UpsertSummary {
    pub fn from_results(results: &[BatchWriteResult]) -> Self {
        let mut summary = Self {
            total_batches: results.len(),
            ..Default::default()
        };
        for r in results {
            match r.outcome {
                BatchOutcome::Written => {
                    summary.written_batches += 1;
                    summary.vectors_written += r.attempted;
                }
                BatchOutcome::Cancelled => {
                    summary.cancelled_batches += 1;
                    summary.vectors_not_written += r.attempted;
                }
                BatchOutcome::Rejected | BatchOutcome::TransportFailed => {
                    summary.failed_batches += 1;
                    summary.vectors_not_written += r.attempted;
                }
            }
        }
        summary
    }
}

/// Contiguous ranges of at most `batch_size`; only the last may be shorter
pub fn partition(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    if batch_size == 0 {
        return Vec::new();
    }
    (0..len)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect()
}

// ============================================================================
// COORDINATOR
// ============================================================================

pub struct BatchUpsertCoordinator {
    client: VectorStoreClient,
    max_concurrent: usize,
    control: RunControl,
}

impl BatchUpsertCoordinator {
    pub fn new(client: VectorStoreClient) -> Self {
        Self {
            client,
            max_concurrent: 1,
            control: RunControl::default(),
        }
    }

    /// Allow up to `n` batches in flight at once (results stay in batch order)
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    /// Write `keyed` in batches of `batch_size`, one result per batch.
    ///
    /// Only an invalid `batch_size` is an error; store failures land in the
    /// returned results.
    pub async fn upsert(
        &self,
        keyed: &[KeyedVector],
        keyspace: &str,
        table: &str,
        batch_size: usize,
    ) -> PipelineResult<Vec<BatchWriteResult>> {
        if batch_size == 0 {
            return Err(PipelineError::config("batch_size must be >= 1"));
        }

        let ranges = partition(keyed.len(), batch_size);
        log::info!(
            "Writing {} vectors to {}.{} in {} batches of up to {}",
            keyed.len(),
            keyspace,
            table,
            ranges.len(),
            batch_size
        );

        let results: Vec<BatchWriteResult> = stream::iter(ranges.into_iter().enumerate())
            .map(move |(index, range)| self.dispatch(index, &keyed[range], keyspace, table))
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let summary = UpsertSummary::from_results(&results);
        log::info!(
            "Upsert finished: {}/{} batches written, {} failed, {} cancelled",
            summary.written_batches,
            summary.total_batches,
            summary.failed_batches,
            summary.cancelled_batches
        );

        Ok(results)
    }

    /// Re-send only the batches of `previous` that were not written.
    ///
    /// Batch indices of the original run are kept. Written batches are not
    /// repeated and do not appear in the output.
    pub async fn retry_failed(
        &self,
        keyed: &[KeyedVector],
        previous: &[BatchWriteResult],
        keyspace: &str,
        table: &str,
    ) -> Vec<BatchWriteResult> {
        let by_key: HashMap<&str, &KeyedVector> = keyed.iter().map(|kv| (kv.0.as_str(), kv)).collect();

        let mut retries: Vec<(usize, Vec<KeyedVector>)> = Vec::new();
        for result in previous.iter().filter(|r| r.outcome != BatchOutcome::Written) {
            let mut members = Vec::with_capacity(result.keys.len());
            for key in &result.keys {
                match by_key.get(key.as_str()) {
                    Some(kv) => members.push((*kv).clone()),
                    None => log::warn!("Retry of batch {}: key '{}' no longer in input", result.batch_index, key),
                }
            }
            retries.push((result.batch_index, members));
        }

        log::info!("Retrying {} unwritten batches", retries.len());

        stream::iter(retries.iter())
            .map(move |(index, members)| self.dispatch(*index, members, keyspace, table))
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// One Write RPC per key; failures are recorded and the loop continues.
    pub async fn write_each(&self, keyed: &[KeyedVector], keyspace: &str, table: &str) -> Vec<KeyWriteResult> {
        let mut results = Vec::with_capacity(keyed.len());

        for (key, vector) in keyed {
            if self.control.is_cancelled() {
                results.push(KeyWriteResult {
                    key: key.clone(),
                    succeeded: false,
                    error_message: Some(PipelineError::Cancelled.to_string()),
                });
                continue;
            }

            let outcome = self.client.write(keyspace, table, key, vector.as_slice()).await;
            let result = match outcome {
                Ok(true) => KeyWriteResult { key: key.clone(), succeeded: true, error_message: None },
                Ok(false) => {
                    log::warn!("Write of '{}' reported success=false", key);
                    KeyWriteResult {
                        key: key.clone(),
                        succeeded: false,
                        error_message: Some("store reported success=false".to_string()),
                    }
                }
                Err(e) => {
                    log::error!("Write of '{}' failed: {}", key, e);
                    KeyWriteResult { key: key.clone(), succeeded: false, error_message: Some(e.to_string()) }
                }
            };
            results.push(result);
        }
        results
    }

    async fn dispatch(&self, batch_index: usize, chunk: &[KeyedVector], keyspace: &str, table: &str) -> BatchWriteResult {
        let keys: Vec<String> = chunk.iter().map(|(k, _)| k.clone()).collect();
        let attempted = chunk.len();

        if self.control.is_cancelled() {
            log::warn!("Batch {} not dispatched: run cancelled", batch_index);
            return BatchWriteResult {
                batch_index,
                attempted,
                succeeded: false,
                error_message: Some(PipelineError::Cancelled.to_string()),
                outcome: BatchOutcome::Cancelled,
                keys,
            };
        }

        let entries = chunk.iter().map(|(k, v)| (k.as_str(), v.as_slice()));
        let (outcome, error_message) = match self.client.batch_write(keyspace, table, entries).await {
            Ok(response) if response.success => {
                log::info!(
                    "Batch {} written successfully ({} vectors, first key {})",
                    batch_index,
                    attempted,
                    keys.first().map(String::as_str).unwrap_or("-")
                );
                (BatchOutcome::Written, None)
            }
            Ok(response) => {
                let message = response
                    .error_message
                    .unwrap_or_else(|| "store reported success=false".to_string());
                let err = PipelineError::PartialBatchFailure { batch_index, message: message.clone() };
                log::error!("{}", err);
                (BatchOutcome::Rejected, Some(message))
            }
            Err(e) => {
                log::error!("Failed to write batch {}: {}", batch_index, e);
                (BatchOutcome::TransportFailed, Some(e.to_string()))
            }
        };

        BatchWriteResult {
            batch_index,
            attempted,
            succeeded: outcome == BatchOutcome::Written,
            error_message,
            outcome,
            keys,
        }
    }
}
