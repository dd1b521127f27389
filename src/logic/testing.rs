//! Test doubles shared by the module tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::logic::store::*;

/// In-memory store with injectable failures.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryVectorStore,
    /// BatchWrite containing any of these keys answers `success=false` (nothing applied)
    pub reject_batches_with: HashSet<String>,
    /// BatchWrite containing any of these keys fails at the transport level
    pub unreachable_batches_with: HashSet<String>,
    /// Writes of these keys are acknowledged but never applied (replication lag)
    pub lost_keys: HashSet<String>,
    /// Reads of these keys fail at the transport level
    pub unreadable_keys: HashSet<String>,
    /// Searches whose query equals one of these vectors fail
    pub failing_queries: Vec<Vec<f32>>,
    /// Order in which BatchWrite calls arrived (first key of each)
    pub batch_log: Mutex<Vec<String>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn client(self: &Arc<Self>) -> VectorStoreClient {
        VectorStoreClient::new(self.clone(), VectorEncoding::Floats)
    }
}

fn keys_of(request: &VectorBatchWriteRequest) -> impl Iterator<Item = &str> {
    request.vectors.iter().map(|v| v.key.as_str())
}

#[async_trait]
impl VectorStore for FaultyStore {
    async fn write(&self, request: VectorWriteRequest) -> Result<SuccessResponse, StoreError> {
        if self.lost_keys.contains(&request.key) {
            return Ok(SuccessResponse { success: true });
        }
        self.inner.write(request).await
    }

    async fn read(&self, request: VectorReadRequest) -> Result<VectorReadResponse, StoreError> {
        if self.unreadable_keys.contains(&request.key) {
            return Err(StoreError::Network("connection reset".to_string()));
        }
        self.inner.read(request).await
    }

    async fn update(&self, request: VectorUpdateRequest) -> Result<SuccessResponse, StoreError> {
        self.inner.update(request).await
    }

    async fn delete(&self, request: VectorDeleteRequest) -> Result<SuccessResponse, StoreError> {
        self.inner.delete(request).await
    }

    async fn batch_write(
        &self,
        mut request: VectorBatchWriteRequest,
    ) -> Result<VectorBatchWriteResponse, StoreError> {
        if let Some(first) = request.vectors.first() {
            self.batch_log.lock().push(first.key.clone());
        }
        if keys_of(&request).any(|k| self.unreachable_batches_with.contains(k)) {
            return Err(StoreError::Network("store unreachable".to_string()));
        }
        if keys_of(&request).any(|k| self.reject_batches_with.contains(k)) {
            return Ok(VectorBatchWriteResponse {
                success: false,
                error_message: Some("write quota exceeded".to_string()),
            });
        }
        request.vectors.retain(|v| !self.lost_keys.contains(&v.key));
        self.inner.batch_write(request).await
    }

    async fn search(&self, request: VectorSearchRequest) -> Result<VectorSearchResponse, StoreError> {
        let query = codec::decode_any(&request.query)?;
        if self.failing_queries.iter().any(|q| *q == query) {
            return Err(StoreError::Server(503));
        }
        self.inner.search(request).await
    }
}
