//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Environment overrides are resolved in `logic::config`.

/// Default vector store URL (local development server)
pub const DEFAULT_STORE_URL: &str = "http://localhost:50051";

/// Default keyspace when the caller does not name one
pub const DEFAULT_KEYSPACE: &str = "redwing_keyspace";

/// Default table when the caller does not name one
pub const DEFAULT_TABLE: &str = "vectors";

/// Default request timeout for store RPCs (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of vectors per BatchWrite call
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default expected fraction of anomalous rows
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Default random seed for the isolation forest
pub const DEFAULT_SEED: u64 = 42;

/// Default number of isolation trees
pub const DEFAULT_TREES: usize = 100;

/// Upper bound on the sub-sample drawn per tree
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// Default neighbour count per anomaly
pub const DEFAULT_TOP_K: usize = 10;

/// Default deviation multiplier for report reasoning (value > mean * 1.2)
pub const DEFAULT_DEVIATION_MULTIPLIER: f32 = 1.2;

/// Default number of PCA components
pub const DEFAULT_PCA_COMPONENTS: usize = 3;

/// Default TF-IDF vocabulary size
pub const DEFAULT_TFIDF_FEATURES: usize = 100;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Vector Sentinel";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Parse a raw variable value. `None` when unset; a set value that does
/// not parse comes back as `Err("NAME: value")`.
pub fn parse_var<T: std::str::FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, String> {
    match raw {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("{}: {}", name, value)),
    }
}

/// Parse a boolean variable: true/false, 1/0, yes/no, on/off
pub fn parse_flag(name: &str, raw: Option<String>) -> Result<Option<bool>, String> {
    match raw {
        None => Ok(None),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(format!("{}: {}", name, value)),
        },
    }
}

/// Read and parse an env variable, falling back to `default` only when unset
pub fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    Ok(parse_var(name, std::env::var(name).ok())?.unwrap_or(default))
}
