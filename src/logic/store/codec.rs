//! Vector payload codec
//!
//! One encoding per deployment. Decoding a payload of the other variant is an
//! error instead of a silent reinterpretation.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

use super::types::VectorPayload;
use super::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VectorEncoding {
    /// JSON array of floats
    #[default]
    Floats,
    /// Little-endian f32 bytes, base64 encoded
    PackedF32Le,
}

impl std::str::FromStr for VectorEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "floats" | "float" => Ok(VectorEncoding::Floats),
            "packed" | "packed_f32_le" | "bytes" => Ok(VectorEncoding::PackedF32Le),
            other => Err(format!("unknown vector encoding '{}'", other)),
        }
    }
}

pub fn pack_f32_le(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

pub fn unpack_f32_le(bytes: &[u8]) -> Result<Vec<f32>, StoreError> {
    if bytes.len() % 4 != 0 {
        return Err(StoreError::Encoding(format!(
            "packed buffer length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub fn encode(values: &[f32], encoding: VectorEncoding) -> VectorPayload {
    match encoding {
        VectorEncoding::Floats => VectorPayload::Floats(values.to_vec()),
        VectorEncoding::PackedF32Le => VectorPayload::Packed(BASE64.encode(pack_f32_le(values))),
    }
}

/// Decode a payload that must use `expected` encoding
pub fn decode(payload: &VectorPayload, expected: VectorEncoding) -> Result<Vec<f32>, StoreError> {
    match (payload, expected) {
        (VectorPayload::Floats(_), VectorEncoding::Floats)
        | (VectorPayload::Packed(_), VectorEncoding::PackedF32Le) => decode_any(payload),
        (VectorPayload::Floats(_), VectorEncoding::PackedF32Le) => Err(StoreError::Encoding(
            "encoding mismatch: expected packed bytes, got float sequence".to_string(),
        )),
        (VectorPayload::Packed(_), VectorEncoding::Floats) => Err(StoreError::Encoding(
            "encoding mismatch: expected float sequence, got packed bytes".to_string(),
        )),
    }
}

/// Decode whichever variant arrived (store side)
pub fn decode_any(payload: &VectorPayload) -> Result<Vec<f32>, StoreError> {
    match payload {
        VectorPayload::Floats(values) => Ok(values.clone()),
        VectorPayload::Packed(text) => {
            let bytes = BASE64
                .decode(text)
                .map_err(|e| StoreError::Encoding(format!("invalid base64 payload: {}", e)))?;
            unpack_f32_le(&bytes)
        }
    }
}
