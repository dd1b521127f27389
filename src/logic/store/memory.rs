//! In-memory vector store
//!
//! Behaves like the remote store at the RPC boundary: upsert writes, optional
//! fixed-width padding on read, similarity search over vectors whose dimension
//! matches the query. Used by tests and local dry runs.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use super::codec::{self, VectorEncoding};
use super::metric::similarity;
use super::types::*;
use super::{StoreError, VectorStore};

type TableId = (String, String);

pub struct InMemoryVectorStore {
    tables: RwLock<HashMap<TableId, BTreeMap<String, Vec<f32>>>>,
    encoding: VectorEncoding,
    pad_width: Option<usize>,
    batch_calls: AtomicU64,
    search_calls: AtomicU64,
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new(VectorEncoding::Floats)
    }
}

impl InMemoryVectorStore {
    /// `encoding` is the form vectors are returned in on Read
    pub fn new(encoding: VectorEncoding) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            encoding,
            pad_width: None,
            batch_calls: AtomicU64::new(0),
            search_calls: AtomicU64::new(0),
        }
    }

    /// Zero-pad every vector returned by Read to `width` components
    pub fn with_padding(mut self, width: usize) -> Self {
        self.pad_width = Some(width);
        self
    }

    pub fn len(&self, keyspace: &str, table: &str) -> usize {
        self.tables
            .read()
            .get(&(keyspace.to_string(), table.to_string()))
            .map_or(0, |t| t.len())
    }

    pub fn is_empty(&self, keyspace: &str, table: &str) -> bool {
        self.len(keyspace, table) == 0
    }

    /// Unpadded stored vector
    pub fn get(&self, keyspace: &str, table: &str, key: &str) -> Option<Vec<f32>> {
        self.tables
            .read()
            .get(&(keyspace.to_string(), table.to_string()))
            .and_then(|t| t.get(key).cloned())
    }

    pub fn batch_calls(&self) -> u64 {
        self.batch_calls.load(Ordering::Relaxed)
    }

    pub fn search_calls(&self) -> u64 {
        self.search_calls.load(Ordering::Relaxed)
    }

    fn upsert(&self, table_id: TableId, key: String, vector: Vec<f32>) {
        self.tables.write().entry(table_id).or_default().insert(key, vector);
    }

    fn padded(&self, mut vector: Vec<f32>) -> Vec<f32> {
        if let Some(width) = self.pad_width {
            if vector.len() < width {
                vector.resize(width, 0.0);
            }
        }
        vector
    }
}

fn table_id(keyspace: &str, table: &str) -> TableId {
    (keyspace.to_string(), table.to_string())
}

fn decode_entry(request: &VectorWriteRequest) -> Result<Vec<f32>, StoreError> {
    if request.key.is_empty() {
        return Err(StoreError::Parse("write request without key".to_string()));
    }
    codec::decode_any(&request.vector)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn write(&self, request: VectorWriteRequest) -> Result<SuccessResponse, StoreError> {
        let vector = decode_entry(&request)?;
        self.upsert(table_id(&request.keyspace, &request.table), request.key, vector);
        Ok(SuccessResponse { success: true })
    }

    async fn read(&self, request: VectorReadRequest) -> Result<VectorReadResponse, StoreError> {
        match self.get(&request.keyspace, &request.table, &request.key) {
            Some(vector) => Ok(VectorReadResponse {
                found: true,
                vector: Some(codec::encode(&self.padded(vector), self.encoding)),
            }),
            None => Ok(VectorReadResponse { found: false, vector: None }),
        }
    }

    async fn update(&self, request: VectorUpdateRequest) -> Result<SuccessResponse, StoreError> {
        let vector = decode_entry(&request)?;
        let mut tables = self.tables.write();
        let slot = tables
            .get_mut(&table_id(&request.keyspace, &request.table))
            .and_then(|t| t.get_mut(&request.key));
        match slot {
            Some(existing) => {
                *existing = vector;
                Ok(SuccessResponse { success: true })
            }
            None => Ok(SuccessResponse { success: false }),
        }
    }

    async fn delete(&self, request: VectorDeleteRequest) -> Result<SuccessResponse, StoreError> {
        let removed = self
            .tables
            .write()
            .get_mut(&table_id(&request.keyspace, &request.table))
            .and_then(|t| t.remove(&request.key));
        Ok(SuccessResponse { success: removed.is_some() })
    }

    async fn batch_write(
        &self,
        request: VectorBatchWriteRequest,
    ) -> Result<VectorBatchWriteResponse, StoreError> {
        self.batch_calls.fetch_add(1, Ordering::Relaxed);

        let mut failed = Vec::new();
        for entry in request.vectors {
            let keyspace = if entry.keyspace.is_empty() { &request.keyspace } else { &entry.keyspace };
            let table = if entry.table.is_empty() { &request.table } else { &entry.table };
            match decode_entry(&entry) {
                Ok(vector) => self.upsert(table_id(keyspace, table), entry.key, vector),
                Err(e) => failed.push(format!("{}: {}", entry.key, e)),
            }
        }

        if failed.is_empty() {
            Ok(VectorBatchWriteResponse { success: true, error_message: None })
        } else {
            Ok(VectorBatchWriteResponse {
                success: false,
                error_message: Some(failed.join("; ")),
            })
        }
    }

    async fn search(&self, request: VectorSearchRequest) -> Result<VectorSearchResponse, StoreError> {
        self.search_calls.fetch_add(1, Ordering::Relaxed);

        let query = codec::decode_any(&request.query)?;
        let tables = self.tables.read();
        let Some(table) = tables.get(&table_id(&request.keyspace, &request.table)) else {
            return Ok(VectorSearchResponse::default());
        };

        let mut matches: Vec<SearchMatch> = table
            .iter()
            .filter(|(_, v)| v.len() == query.len())
            .map(|(key, v)| SearchMatch {
                key: key.clone(),
                score: similarity(request.metric, &query, v),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
        matches.truncate(request.top_k as usize);

        Ok(VectorSearchResponse { matches })
    }
}
