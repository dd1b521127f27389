//! Pipeline Configuration
//!
//! Typed, validated settings for every component.
//! Can be loaded from environment, from a JSON file, or built in code.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::store::{Metric, VectorEncoding};

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Vector store base URL
    pub url: String,
    pub keyspace: String,
    pub table: String,
    /// Payload encoding used for both writes and reads
    pub encoding: VectorEncoding,
    /// Per-RPC timeout (seconds)
    pub timeout_seconds: u64,
    /// Expected vector dimension; checked against vectorizer output before any RPC
    pub expected_dimension: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_STORE_URL.to_string(),
            keyspace: constants::DEFAULT_KEYSPACE.to_string(),
            table: constants::DEFAULT_TABLE.to_string(),
            encoding: VectorEncoding::Floats,
            timeout_seconds: constants::DEFAULT_TIMEOUT_SECS,
            expected_dimension: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: usize,
    /// 1 = sequential dispatch
    pub max_concurrent_batches: usize,
    /// Prefix joined to each record's natural id, e.g. "utility" -> "utility_85001"
    pub key_prefix: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: constants::DEFAULT_BATCH_SIZE,
            max_concurrent_batches: 1,
            key_prefix: "record".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Expected anomalous fraction, in (0, 1)
    pub contamination: f64,
    pub seed: u64,
    pub n_trees: usize,
    pub max_samples: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: constants::DEFAULT_CONTAMINATION,
            seed: constants::DEFAULT_SEED,
            n_trees: constants::DEFAULT_TREES,
            max_samples: constants::DEFAULT_MAX_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborConfig {
    pub top_k: usize,
    pub metric: Metric,
    /// Drop the anomaly's own key from its neighbour list
    pub exclude_self: bool,
    /// 1 = one Search at a time
    pub max_concurrent_searches: usize,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            top_k: constants::DEFAULT_TOP_K,
            metric: Metric::Cosine,
            exclude_self: true,
            max_concurrent_searches: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Reason attached when value > mean * multiplier
    pub deviation_multiplier: f32,
    /// Optional per-component names; defaults to "feature_{i}"
    pub feature_names: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            deviation_multiplier: constants::DEFAULT_DEVIATION_MULTIPLIER,
            feature_names: Vec::new(),
        }
    }
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub store: StoreConfig,
    pub batch: BatchConfig,
    pub detector: DetectorConfig,
    pub neighbors: NeighborConfig,
    pub report: ReportConfig,
    /// Stop dispatching new RPCs after this many seconds
    pub run_deadline_secs: Option<u64>,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables take defaults; a set variable that does not parse is a
    /// `Configuration` error naming it.
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let vars = Vars(lookup);

        Ok(Self {
            store: StoreConfig {
                url: vars.string("VECTOR_STORE_URL", &defaults.store.url),
                keyspace: vars.string("VECTOR_KEYSPACE", &defaults.store.keyspace),
                table: vars.string("VECTOR_TABLE", &defaults.store.table),
                encoding: vars.opt("VECTOR_ENCODING")?.unwrap_or(defaults.store.encoding),
                timeout_seconds: vars.opt("VECTOR_TIMEOUT_SECS")?.unwrap_or(defaults.store.timeout_seconds),
                expected_dimension: vars.opt("VECTOR_DIMENSION")?,
            },
            batch: BatchConfig {
                batch_size: vars.opt("VECTOR_BATCH_SIZE")?.unwrap_or(defaults.batch.batch_size),
                max_concurrent_batches: vars.opt("VECTOR_MAX_CONCURRENT_BATCHES")?
                    .unwrap_or(defaults.batch.max_concurrent_batches),
                key_prefix: vars.string("VECTOR_KEY_PREFIX", &defaults.batch.key_prefix),
            },
            detector: DetectorConfig {
                contamination: vars.opt("VECTOR_CONTAMINATION")?.unwrap_or(defaults.detector.contamination),
                seed: vars.opt("VECTOR_SEED")?.unwrap_or(defaults.detector.seed),
                n_trees: vars.opt("VECTOR_TREES")?.unwrap_or(defaults.detector.n_trees),
                max_samples: vars.opt("VECTOR_MAX_SAMPLES")?.unwrap_or(defaults.detector.max_samples),
            },
            neighbors: NeighborConfig {
                top_k: vars.opt("VECTOR_TOP_K")?.unwrap_or(defaults.neighbors.top_k),
                metric: vars.opt("VECTOR_METRIC")?.unwrap_or(defaults.neighbors.metric),
                exclude_self: vars.flag("VECTOR_EXCLUDE_SELF", defaults.neighbors.exclude_self)?,
                max_concurrent_searches: vars.opt("VECTOR_MAX_CONCURRENT_SEARCHES")?
                    .unwrap_or(defaults.neighbors.max_concurrent_searches),
            },
            report: ReportConfig {
                deviation_multiplier: vars.opt("VECTOR_DEVIATION_MULTIPLIER")?
                    .unwrap_or(defaults.report.deviation_multiplier),
                feature_names: vars.get("VECTOR_FEATURE_NAMES")
                    .map(|s| s.split(',').map(|n| n.trim().to_string()).filter(|n| !n.is_empty()).collect())
                    .unwrap_or_default(),
            },
            run_deadline_secs: vars.opt("VECTOR_RUN_DEADLINE_SECS")?,
        })
    }

    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Reject configurations no component can run with
    pub fn validate(&self) -> PipelineResult<()> {
        if self.store.url.trim().is_empty() {
            return Err(PipelineError::config("store.url is required"));
        }
        if self.store.keyspace.trim().is_empty() || self.store.table.trim().is_empty() {
            return Err(PipelineError::config("store.keyspace and store.table are required"));
        }
        if self.store.expected_dimension == Some(0) {
            return Err(PipelineError::config("store.expected_dimension must be >= 1"));
        }
        if self.batch.batch_size == 0 {
            return Err(PipelineError::config("batch.batch_size must be >= 1"));
        }
        if self.batch.max_concurrent_batches == 0 {
            return Err(PipelineError::config("batch.max_concurrent_batches must be >= 1"));
        }
        let c = self.detector.contamination;
        if !(c > 0.0 && c < 1.0) {
            return Err(PipelineError::config(format!(
                "detector.contamination must be in (0, 1), got {}",
                c
            )));
        }
        if self.detector.n_trees == 0 || self.detector.max_samples < 2 {
            return Err(PipelineError::config("detector needs n_trees >= 1 and max_samples >= 2"));
        }
        if self.neighbors.top_k == 0 {
            return Err(PipelineError::config("neighbors.top_k must be >= 1"));
        }
        if self.neighbors.max_concurrent_searches == 0 {
            return Err(PipelineError::config("neighbors.max_concurrent_searches must be >= 1"));
        }
        let m = self.report.deviation_multiplier;
        if !(m.is_finite() && m > 0.0) {
            return Err(PipelineError::config("report.deviation_multiplier must be > 0"));
        }
        Ok(())
    }
}

/// Variable source for `PipelineConfig::from_lookup`
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn opt<T: std::str::FromStr>(&self, name: &str) -> PipelineResult<Option<T>> {
        constants::parse_var(name, self.get(name)).map_err(PipelineError::Configuration)
    }

    fn flag(&self, name: &str, default: bool) -> PipelineResult<bool> {
        constants::parse_flag(name, self.get(name))
            .map(|v| v.unwrap_or(default))
            .map_err(PipelineError::Configuration)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.keyspace, "redwing_keyspace");
        assert_eq!(config.store.table, "vectors");
        assert_eq!(config.detector.contamination, 0.05);
    }

    #[test]
    fn test_reject_out_of_range_contamination() {
        for bad in [0.0, 1.0, -0.1, f64::NAN] {
            let mut config = PipelineConfig::default();
            config.detector.contamination = bad;
            assert!(matches!(config.validate(), Err(PipelineError::Configuration(_))));
        }
    }

    #[test]
    fn test_reject_zero_batch_size() {
        let mut config = PipelineConfig::default();
        config.batch.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(
            &path,
            r#"{"batch": {"batch_size": 150}, "neighbors": {"metric": "manhattan", "top_k": 1}}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.batch.batch_size, 150);
        assert_eq!(config.batch.max_concurrent_batches, 1);
        assert_eq!(config.neighbors.metric, Metric::Manhattan);
        assert_eq!(config.neighbors.top_k, 1);
        assert_eq!(config.detector.seed, 42);
        assert!(config.validate().is_ok());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_unset_variables_take_defaults() {
        let config = PipelineConfig::from_lookup(vars(&[("VECTOR_TOP_K", "3"), ("VECTOR_METRIC", "pearson")])).unwrap();
        assert_eq!(config.neighbors.top_k, 3);
        assert_eq!(config.neighbors.metric, Metric::Pearson);
        assert_eq!(config.detector.contamination, 0.05);
        assert_eq!(config.store.expected_dimension, None);
        assert!(config.neighbors.exclude_self);
    }

    #[test]
    fn test_unparsable_variable_is_a_configuration_error() {
        let err = PipelineConfig::from_lookup(vars(&[("VECTOR_CONTAMINATION", "five-percent")])).unwrap_err();
        match err {
            PipelineError::Configuration(msg) => assert_eq!(msg, "VECTOR_CONTAMINATION: five-percent"),
            other => panic!("unexpected error: {}", other),
        }

        let err = PipelineConfig::from_lookup(vars(&[("VECTOR_METRIC", "hamming")])).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(ref msg) if msg == "VECTOR_METRIC: hamming"));

        let err = PipelineConfig::from_lookup(vars(&[("VECTOR_EXCLUDE_SELF", "maybe")])).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
