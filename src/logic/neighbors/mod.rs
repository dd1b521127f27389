//! Neighbor Contextualizer - similarity search around each anomaly
//!
//! One Search RPC per anomalous vector. The store truncates to `top_k`; the
//! result is re-sorted and truncated here as well, so callers can rely on at
//! most `top_k` matches in non-increasing score order.


use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FeatureVector;
use crate::logic::pipeline::RunControl;
use crate::logic::store::{Metric, VectorStoreClient};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborMatch {
    pub source_key: String,
    pub candidate_key: String,
    pub similarity_score: f32,
}

/// Neighbours of one anomaly; `error` is set when its Search failed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyNeighbors {
    pub source_key: String,
    pub matches: Vec<NeighborMatch>,
    pub error: Option<String>,
}

pub struct NeighborContextualizer {
    client: VectorStoreClient,
    control: RunControl,
    exclude_self: bool,
    max_concurrent: usize,
}

impl NeighborContextualizer {
    pub fn new(client: VectorStoreClient) -> Self {
        Self {
            client,
            control: RunControl::default(),
            exclude_self: true,
            max_concurrent: 1,
        }
    }

    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    /// Keep or drop the anomaly's own key in its neighbour list
    pub fn exclude_self(mut self, exclude: bool) -> Self {
        self.exclude_self = exclude;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Nearest stored vectors to `vector` under `metric`.
    ///
    /// An empty list is a valid answer (nothing comparable stored yet).
    pub async fn contextualize(
        &self,
        source_key: &str,
        vector: &[f32],
        keyspace: &str,
        table: &str,
        top_k: usize,
        metric: Metric,
    ) -> PipelineResult<Vec<NeighborMatch>> {
        if top_k == 0 {
            return Err(PipelineError::config("top_k must be >= 1"));
        }
        if self.control.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // The anomaly itself is stored too and usually comes back first
        let requested = if self.exclude_self { top_k.saturating_add(1) } else { top_k };
        let raw = self.client.search(keyspace, table, vector, requested, metric).await?;

        let mut matches: Vec<NeighborMatch> = raw
            .into_iter()
            .filter(|m| !(self.exclude_self && m.key == source_key))
            .map(|m| NeighborMatch {
                source_key: source_key.to_string(),
                candidate_key: m.key,
                similarity_score: m.score,
            })
            .collect();

        matches.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        matches.truncate(top_k);

        if matches.is_empty() {
            log::info!("No similar records found for '{}' in {}.{}", source_key, keyspace, table);
        } else {
            log::debug!(
                "'{}': {} neighbours, best {} ({:.4})",
                source_key,
                matches.len(),
                matches[0].candidate_key,
                matches[0].similarity_score
            );
        }

        Ok(matches)
    }

    /// Search around every anomaly; a failed Search is recorded on its entry
    /// and the others still run. Output follows input order.
    pub async fn contextualize_all(
        &self,
        anomalies: &[(String, FeatureVector)],
        keyspace: &str,
        table: &str,
        top_k: usize,
        metric: Metric,
    ) -> Vec<AnomalyNeighbors> {
        log::info!(
            "Searching neighbours for {} anomalies (top_k={}, metric={})",
            anomalies.len(),
            top_k,
            metric
        );

        stream::iter(anomalies.iter())
            .map(move |(key, vector)| async move {
                match self
                    .contextualize(key, vector.as_slice(), keyspace, table, top_k, metric)
                    .await
                {
                    Ok(matches) => AnomalyNeighbors {
                        source_key: key.clone(),
                        matches,
                        error: None,
                    },
                    Err(e) => {
                        log::error!("Neighbour search for '{}' failed: {}", key, e);
                        AnomalyNeighbors {
                            source_key: key.clone(),
                            matches: Vec::new(),
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }
}
