//! Wire types for the vector store RPC contract.
//!
//! Field names are the interoperability contract with the store server and
//! must not be renamed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// VECTOR PAYLOAD
// ============================================================================

/// Vector as carried on the wire: a float sequence or a packed
/// little-endian f32 buffer (base64 in JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorPayload {
    Floats(Vec<f32>),
    Packed(String),
}

// ============================================================================
// SIMILARITY METRIC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    Manhattan,
    Pearson,
    Jaccard,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Pearson => "pearson",
            Metric::Jaccard => "jaccard",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            "manhattan" => Ok(Metric::Manhattan),
            "pearson" => Ok(Metric::Pearson),
            "jaccard" => Ok(Metric::Jaccard),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

// ============================================================================
// REQUESTS / RESPONSES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorWriteRequest {
    #[serde(default)]
    pub keyspace: String,
    #[serde(default)]
    pub table: String,
    pub key: String,
    pub vector: VectorPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorReadRequest {
    #[serde(default)]
    pub keyspace: String,
    #[serde(default)]
    pub table: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorReadResponse {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<VectorPayload>,
}

pub type VectorUpdateRequest = VectorWriteRequest;
pub type VectorDeleteRequest = VectorReadRequest;

/// Response shape shared by Write, Update and Delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorBatchWriteRequest {
    #[serde(default)]
    pub keyspace: String,
    #[serde(default)]
    pub table: String,
    pub vectors: Vec<VectorWriteRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorBatchWriteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchRequest {
    #[serde(default)]
    pub keyspace: String,
    #[serde(default)]
    pub table: String,
    pub query: VectorPayload,
    pub top_k: u32,
    pub metric: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub key: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VectorSearchResponse {
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
}
