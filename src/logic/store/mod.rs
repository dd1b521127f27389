//! Vector Store Module - RPC boundary to the remote key/vector store
//!
//! This module handles:
//! - Wire types for Write, Read, Update, Delete, BatchWrite, Search
//! - Payload encoding (float sequence or packed f32 bytes)
//! - `VectorStore` transport trait (HTTP client, in-memory fake)
//! - `VectorStoreClient`, the typed handle the pipeline components share

pub mod types;
pub mod codec;
pub mod metric;
pub mod client;
pub mod memory;

#[cfg(test)]
mod tests;

pub use client::{HttpStoreConfig, HttpVectorStore};
pub use codec::VectorEncoding;
pub use memory::InMemoryVectorStore;
pub use types::{
    Metric, SearchMatch, SuccessResponse, VectorBatchWriteRequest, VectorBatchWriteResponse,
    VectorDeleteRequest, VectorPayload, VectorReadRequest, VectorReadResponse,
    VectorSearchRequest, VectorSearchResponse, VectorUpdateRequest, VectorWriteRequest,
};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::logic::error::PipelineError;

/// Store client errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error: {0}")]
    Server(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::Transport(err.to_string())
    }
}

// ============================================================================
// TRANSPORT TRAIT
// ============================================================================

/// Raw RPC surface of the vector store.
///
/// Implementations must be shareable across concurrent calls; the pipeline
/// holds one `Arc<dyn VectorStore>` for the whole run.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn write(&self, request: VectorWriteRequest) -> Result<SuccessResponse, StoreError>;
    async fn read(&self, request: VectorReadRequest) -> Result<VectorReadResponse, StoreError>;
    async fn update(&self, request: VectorUpdateRequest) -> Result<SuccessResponse, StoreError>;
    async fn delete(&self, request: VectorDeleteRequest) -> Result<SuccessResponse, StoreError>;
    async fn batch_write(
        &self,
        request: VectorBatchWriteRequest,
    ) -> Result<VectorBatchWriteResponse, StoreError>;
    async fn search(&self, request: VectorSearchRequest) -> Result<VectorSearchResponse, StoreError>;
}

// ============================================================================
// TYPED CLIENT
// ============================================================================

/// Typed handle over a shared store connection.
///
/// Applies the deployment's single payload encoding to both the write and the
/// read path.
#[derive(Clone)]
pub struct VectorStoreClient {
    store: Arc<dyn VectorStore>,
    encoding: VectorEncoding,
}

impl VectorStoreClient {
    pub fn new(store: Arc<dyn VectorStore>, encoding: VectorEncoding) -> Self {
        Self { store, encoding }
    }

    pub fn encoding(&self) -> VectorEncoding {
        self.encoding
    }

    pub fn write_request(&self, keyspace: &str, table: &str, key: &str, vector: &[f32]) -> VectorWriteRequest {
        VectorWriteRequest {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            key: key.to_string(),
            vector: codec::encode(vector, self.encoding),
        }
    }

    pub async fn write(&self, keyspace: &str, table: &str, key: &str, vector: &[f32]) -> Result<bool, StoreError> {
        let request = self.write_request(keyspace, table, key, vector);
        Ok(self.store.write(request).await?.success)
    }

    /// Point read. `Ok(None)` means the store answered `found=false`.
    pub async fn read(&self, keyspace: &str, table: &str, key: &str) -> Result<Option<Vec<f32>>, StoreError> {
        let response = self
            .store
            .read(VectorReadRequest {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
                key: key.to_string(),
            })
            .await?;

        if !response.found {
            return Ok(None);
        }
        match response.vector {
            Some(payload) => codec::decode(&payload, self.encoding).map(Some),
            None => Err(StoreError::Parse(format!("read of '{}' reported found without a vector", key))),
        }
    }

    pub async fn update(&self, keyspace: &str, table: &str, key: &str, vector: &[f32]) -> Result<bool, StoreError> {
        let request = self.write_request(keyspace, table, key, vector);
        Ok(self.store.update(request).await?.success)
    }

    pub async fn delete(&self, keyspace: &str, table: &str, key: &str) -> Result<bool, StoreError> {
        let response = self
            .store
            .delete(VectorDeleteRequest {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
                key: key.to_string(),
            })
            .await?;
        Ok(response.success)
    }

    /// One BatchWrite RPC; member order follows `entries`.
    pub async fn batch_write<'a, I>(
        &self,
        keyspace: &str,
        table: &str,
        entries: I,
    ) -> Result<VectorBatchWriteResponse, StoreError>
    where
        I: IntoIterator<Item = (&'a str, &'a [f32])>,
    {
        let vectors = entries
            .into_iter()
            .map(|(key, vector)| self.write_request(keyspace, table, key, vector))
            .collect();

        self.store
            .batch_write(VectorBatchWriteRequest {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
                vectors,
            })
            .await
    }

    pub async fn search(
        &self,
        keyspace: &str,
        table: &str,
        query: &[f32],
        top_k: usize,
        metric: Metric,
    ) -> Result<Vec<SearchMatch>, StoreError> {
        let response = self
            .store
            .search(VectorSearchRequest {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
                query: codec::encode(query, self.encoding),
                top_k: u32::try_from(top_k).unwrap_or(u32::MAX),
                metric,
            })
            .await?;
        Ok(response.matches)
    }
}
