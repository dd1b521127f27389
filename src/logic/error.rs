//! Error taxonomy
//!
//! Every component returns typed errors. Logging happens alongside, never instead.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// RPC unreachable or transport-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// BatchWrite answered `success=false`
    #[error("Batch {batch_index} rejected by store: {message}")]
    PartialBatchFailure { batch_index: usize, message: String },

    #[error("Key not found in store: {0}")]
    MissingKey(String),

    /// Not enough retrieved vectors to fit a model
    #[error("Insufficient data: {found} vectors retrieved, at least {required} required")]
    InsufficientData { found: usize, required: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Dimension mismatch for '{key}': expected {expected}, got {actual}")]
    DimensionMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid vector for '{key}': {reason}")]
    InvalidVector { key: String, reason: String },

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        PipelineError::Configuration(msg.into())
    }
}
