use serde::{Deserialize, Serialize};

/// Domain record handed over by a data source.
///
/// `id` is the natural identity (ZIP code, transaction nonce, complaint ID, ...)
/// and is what storage keys are derived from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,

    // Numeric columns, in a fixed order per data domain
    #[serde(default)]
    pub fields: Vec<f64>,

    // Free text (complaint narratives, paper abstracts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Record {
    pub fn numeric(id: impl Into<String>, fields: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            fields,
            text: None,
        }
    }

    pub fn textual(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
            text: Some(text.into()),
        }
    }
}
