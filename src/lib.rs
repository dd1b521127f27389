//! Vector Sentinel - vector-store backed outlier detection
//!
//! Vectorize records, upsert them into a remote key/vector store in batches,
//! read them back, label outliers and explain each one with its nearest
//! stored neighbours.

pub mod constants;
pub mod logic;

pub use logic::config::PipelineConfig;
pub use logic::error::{PipelineError, PipelineResult};
pub use logic::features::{FeatureVector, Record, Vectorizer};
pub use logic::pipeline::{Pipeline, RunControl, RunReport, RunStatus};
pub use logic::store::{HttpVectorStore, InMemoryVectorStore, VectorStore};
