//! Storage key construction
//!
//! Keys come from a record's natural identity, never from its position, so a
//! re-run overwrites the same logical entity.

use std::collections::HashSet;

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::Record;

#[derive(Debug, Clone)]
pub struct KeyBuilder {
    prefix: String,
}

impl KeyBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn key(&self, natural_id: &str) -> String {
        if self.prefix.is_empty() {
            natural_id.to_string()
        } else {
            format!("{}_{}", self.prefix, natural_id)
        }
    }

    /// Recover the natural id from a key built by this builder
    pub fn natural_id<'a>(&self, key: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            return Some(key);
        }
        key.strip_prefix(self.prefix.as_str())?.strip_prefix('_')
    }

    /// Keys for all records, in record order.
    ///
    /// Empty ids and duplicate keys are rejected before anything is written.
    pub fn build_all(&self, records: &[Record]) -> PipelineResult<Vec<String>> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut keys = Vec::with_capacity(records.len());

        for record in records {
            if record.id.trim().is_empty() {
                return Err(PipelineError::config("record with empty natural id"));
            }
            let key = self.key(&record.id);
            if !seen.insert(key.clone()) {
                return Err(PipelineError::config(format!("duplicate storage key '{}'", key)));
            }
            keys.push(key);
        }
        Ok(keys)
    }
}
