//! Logic Module - Vector pipeline engines
//!
//! ## Layout
//! - `features/` - Vectorizers (scaling, PCA, TF-IDF)
//! - `store/` - Vector store RPC boundary (HTTP client, in-memory store)
//! - `batch/` - Batched upsert and key construction
//! - `retrieve/` - Read-back of written vectors
//! - `model/` - Outlier detection (isolation forest, contamination threshold)
//! - `neighbors/` - Similarity search around anomalies
//! - `report/` - Deviation reasoning and export
//! - `pipeline/` - Orchestration and run control

// Shared
pub mod config;
pub mod error;

// Stages
pub mod features;
pub mod store;
pub mod batch;
pub mod retrieve;
pub mod model;
pub mod neighbors;
pub mod report;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;
