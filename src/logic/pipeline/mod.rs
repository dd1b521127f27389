//! Pipeline Module - ingest, detect, explain
//!
//! One parameterised run over a batch of records:
//! vectorize -> batch upsert -> read back -> detect -> neighbour search -> report.
//!
//! Each domain injects its own `Vectorizer`, and optionally its own
//! `OutlierModel` and `DeviationRules`. The store handle is passed in by the
//! caller; nothing here owns a global connection.

pub mod control;


pub use control::RunControl;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::logic::batch::{BatchOutcome, BatchUpsertCoordinator, BatchWriteResult, KeyBuilder, KeyedVector, UpsertSummary};
use crate::logic::config::PipelineConfig;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::{check_output, FeatureVector, Record, Vectorizer};
use crate::logic::model::{ContaminationThreshold, DetectionResult, IsolationForest, OutlierModel};
use crate::logic::neighbors::{AnomalyNeighbors, NeighborContextualizer};
use crate::logic::report::{assemble, population_means, DeviationRules, ReportEntry};
use crate::logic::retrieve::{RetrievalSummary, Retriever};
use crate::logic::store::{VectorStore, VectorStoreClient};

// ============================================================================
// RUN REPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Stopped early; everything gathered so far is kept
    Cancelled,
    /// Fewer than two vectors came back, detection skipped
    InsufficientData,
}

/// Everything one run produced, including what failed along the way
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub vectorizer: String,
    pub model: String,
    pub keyspace: String,
    pub table: String,
    pub dimension: usize,
    pub records: usize,
    pub batches: Vec<BatchWriteResult>,
    pub upsert: UpsertSummary,
    pub retrieved_keys: Vec<String>,
    pub missing_keys: Vec<String>,
    pub failed_reads: Vec<(String, String)>,
    pub detections: Vec<DetectionResult>,
    pub threshold: Option<ContaminationThreshold>,
    pub neighbors: Vec<AnomalyNeighbors>,
    pub entries: Vec<ReportEntry>,
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn new(config: &PipelineConfig, vectorizer: &str, model: &str, records: usize) -> Self {
        Self {
            status: RunStatus::Completed,
            vectorizer: vectorizer.to_string(),
            model: model.to_string(),
            keyspace: config.store.keyspace.clone(),
            table: config.store.table.clone(),
            dimension: 0,
            records,
            batches: Vec::new(),
            upsert: UpsertSummary::default(),
            retrieved_keys: Vec::new(),
            missing_keys: Vec::new(),
            failed_reads: Vec::new(),
            detections: Vec::new(),
            threshold: None,
            neighbors: Vec::new(),
            entries: Vec::new(),
            message: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    fn finish(mut self, status: RunStatus, message: Option<String>) -> Self {
        self.status = status;
        self.message = message;
        self.finished_at = Utc::now();
        self
    }

    pub fn anomaly_count(&self) -> usize {
        self.detections.iter().filter(|d| d.is_anomalous()).count()
    }
}

/// Outcome of an explicit key purge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurgeSummary {
    pub deleted: Vec<String>,
    pub not_found: Vec<String>,
    pub failed: Vec<(String, String)>,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline {
    client: VectorStoreClient,
    config: PipelineConfig,
    model: Box<dyn OutlierModel>,
    rules: Option<DeviationRules>,
}

impl Pipeline {
    pub fn new(store: Arc<dyn VectorStore>, config: PipelineConfig) -> Self {
        Self {
            client: VectorStoreClient::new(store, config.store.encoding),
            model: Box::new(IsolationForest::from_config(&config.detector)),
            config,
            rules: None,
        }
    }

    pub fn with_model(mut self, model: Box<dyn OutlierModel>) -> Self {
        self.model = model;
        self
    }

    /// Domain-specific deviation rules; defaults to one uniform rule per feature
    pub fn with_rules(mut self, rules: DeviationRules) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn client(&self) -> &VectorStoreClient {
        &self.client
    }

    /// Storage keys this pipeline derives for `records`
    pub fn keys_for(&self, records: &[Record]) -> PipelineResult<Vec<String>> {
        KeyBuilder::new(self.config.batch.key_prefix.clone()).build_all(records)
    }

    /// Run the full cycle over `records`.
    ///
    /// Configuration, key and dimension problems fail before any RPC. After
    /// that, store failures are recorded in the report and the run continues
    /// with whatever made the round trip.
    pub async fn run(
        &self,
        records: &[Record],
        vectorizer: &dyn Vectorizer,
        control: RunControl,
    ) -> PipelineResult<RunReport> {
        self.config.validate()?;
        let keys = self.keys_for(records)?;
        let vectors = vectorizer.vectorize(records)?;
        check_output(records, &vectors)?;

        let dim = vectors.first().map_or(0, FeatureVector::dim);
        if let (Some(expected), Some(first)) = (self.config.store.expected_dimension, vectors.first()) {
            if first.dim() != expected {
                return Err(PipelineError::DimensionMismatch {
                    key: keys[0].clone(),
                    expected,
                    actual: first.dim(),
                });
            }
        }

        let control = match self.config.run_deadline_secs {
            Some(secs) => control.with_deadline(Duration::from_secs(secs)),
            None => control,
        };
        let store = &self.config.store;
        let mut report = RunReport::new(&self.config, vectorizer.name(), self.model.name(), records.len());
        report.dimension = dim;

        log::info!(
            "Pipeline run: {} records, vectorizer={}, dim={}, target {}.{}",
            records.len(),
            vectorizer.name(),
            dim,
            store.keyspace,
            store.table
        );

        // 1. Upsert
        let keyed: Vec<KeyedVector> = keys.into_iter().zip(vectors).collect();
        let coordinator = BatchUpsertCoordinator::new(self.client.clone())
            .with_concurrency(self.config.batch.max_concurrent_batches)
            .with_control(control.clone());
        report.batches = coordinator
            .upsert(&keyed, &store.keyspace, &store.table, self.config.batch.batch_size)
            .await?;
        report.upsert = UpsertSummary::from_results(&report.batches);

        if control.is_cancelled() {
            return Ok(report.finish(RunStatus::Cancelled, Some("cancelled during upsert".to_string())));
        }

        // 2. Read back what was written
        let written: Vec<String> = report
            .batches
            .iter()
            .filter(|b| b.outcome == BatchOutcome::Written)
            .flat_map(|b| b.keys.iter().cloned())
            .collect();
        let retriever = Retriever::new(self.client.clone()).with_control(control.clone());
        let RetrievalSummary { keys, vectors, missing, failed } =
            retriever.fetch_summary(&written, &store.keyspace, &store.table, dim).await;
        report.retrieved_keys = keys.clone();
        report.missing_keys = missing;
        report.failed_reads = failed;

        if control.is_cancelled() {
            return Ok(report.finish(RunStatus::Cancelled, Some("cancelled during read-back".to_string())));
        }

        // 3. Detect
        let contamination = self.config.detector.contamination;
        match self.model.fit(&keys, &vectors, contamination) {
            Ok(detection) => {
                report.detections = detection.results;
                report.threshold = Some(detection.threshold);
            }
            Err(err @ PipelineError::InsufficientData { .. }) => {
                log::warn!("Detection skipped: {}", err);
                return Ok(report.finish(RunStatus::InsufficientData, Some(err.to_string())));
            }
            Err(e) => return Err(e),
        }

        // 4. Neighbours of each anomaly
        let anomalies: Vec<(String, FeatureVector)> = report
            .detections
            .iter()
            .zip(&vectors)
            .filter(|(d, _)| d.is_anomalous())
            .map(|(d, v)| (d.key.clone(), v.clone()))
            .collect();
        let contextualizer = NeighborContextualizer::new(self.client.clone())
            .with_control(control.clone())
            .exclude_self(self.config.neighbors.exclude_self)
            .with_concurrency(self.config.neighbors.max_concurrent_searches);
        report.neighbors = contextualizer
            .contextualize_all(
                &anomalies,
                &store.keyspace,
                &store.table,
                self.config.neighbors.top_k,
                self.config.neighbors.metric,
            )
            .await;

        // 5. Report
        let (normal_mean, anomalous_mean) = population_means(&vectors, &report.detections);
        let rules = self.rules.clone().unwrap_or_else(|| self.default_rules(dim));
        report.entries = assemble(
            &report.detections,
            &vectors,
            &report.neighbors,
            normal_mean.as_ref(),
            anomalous_mean.as_ref(),
            &rules,
        );

        let status = if control.is_cancelled() {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };
        log::info!(
            "Pipeline finished ({:?}): {} written, {} retrieved, {} missing, {} anomalies",
            status,
            report.upsert.vectors_written,
            report.retrieved_keys.len(),
            report.missing_keys.len(),
            report.entries.len()
        );

        Ok(report.finish(status, None))
    }

    /// Delete `keys` from the configured table. Never run implicitly.
    pub async fn purge(&self, keys: &[String]) -> PurgeSummary {
        let store = &self.config.store;
        let mut summary = PurgeSummary::default();

        for key in keys {
            match self.client.delete(&store.keyspace, &store.table, key).await {
                Ok(true) => summary.deleted.push(key.clone()),
                Ok(false) => summary.not_found.push(key.clone()),
                Err(e) => {
                    log::error!("Delete of '{}' failed: {}", key, e);
                    summary.failed.push((key.clone(), e.to_string()));
                }
            }
        }

        log::info!(
            "Purged {} keys from {}.{} ({} not found, {} failed)",
            summary.deleted.len(),
            store.keyspace,
            store.table,
            summary.not_found.len(),
            summary.failed.len()
        );
        summary
    }

    fn default_rules(&self, dim: usize) -> DeviationRules {
        let multiplier = self.config.report.deviation_multiplier;
        let names = &self.config.report.feature_names;
        if names.len() == dim {
            DeviationRules::uniform(names, multiplier)
        } else {
            if !names.is_empty() {
                log::warn!("{} feature names configured for {} dimensions; using generic names", names.len(), dim);
            }
            DeviationRules::generic(dim, multiplier)
        }
    }
}
