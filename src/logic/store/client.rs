//! HTTP Vector Store Client
//!
//! JSON transport to the vector store server. Each RPC is a POST to
//! `{base_url}/VectorDB/{Rpc}` carrying the wire request body.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::types::*;
use super::{StoreError, VectorStore};
use crate::logic::config::StoreConfig;

/// Store connection configuration
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl From<&StoreConfig> for HttpStoreConfig {
    fn from(config: &StoreConfig) -> Self {
        Self {
            base_url: config.url.clone(),
            timeout_seconds: config.timeout_seconds,
        }
    }
}

/// Long-lived HTTP client; the inner connection pool is shared by every call.
pub struct HttpVectorStore {
    config: HttpStoreConfig,
    http_client: reqwest::Client,
}

impl HttpVectorStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to create HTTP client: {}", e)))?;

        log::info!("Vector store client configured for {}", config.base_url);

        Ok(Self { config, http_client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn rpc_url(&self, rpc: &str) -> String {
        format!("{}/VectorDB/{}", self.config.base_url.trim_end_matches('/'), rpc)
    }

    async fn call<Req, Resp>(&self, rpc: &str, request: &Req) -> Result<Resp, StoreError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.rpc_url(rpc);

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| StoreError::Parse(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            log::debug!("{} failed ({}): {}", rpc, status, error_text);
            Err(StoreError::Server(status))
        }
    }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    async fn write(&self, request: VectorWriteRequest) -> Result<SuccessResponse, StoreError> {
        self.call("Write", &request).await
    }

    async fn read(&self, request: VectorReadRequest) -> Result<VectorReadResponse, StoreError> {
        self.call("Read", &request).await
    }

    async fn update(&self, request: VectorUpdateRequest) -> Result<SuccessResponse, StoreError> {
        self.call("Update", &request).await
    }

    async fn delete(&self, request: VectorDeleteRequest) -> Result<SuccessResponse, StoreError> {
        self.call("Delete", &request).await
    }

    async fn batch_write(
        &self,
        request: VectorBatchWriteRequest,
    ) -> Result<VectorBatchWriteResponse, StoreError> {
        self.call("BatchWrite", &request).await
    }

    async fn search(&self, request: VectorSearchRequest) -> Result<VectorSearchResponse, StoreError> {
        self.call("Search", &request).await
    }
}
