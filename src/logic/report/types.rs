use serde::{Deserialize, Serialize};

use crate::logic::features::FeatureVector;
use crate::logic::model::DetectionResult;
use crate::logic::neighbors::NeighborMatch;

/// One triggered deviation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationReason {
    pub feature_index: usize,
    pub feature_name: String,
    pub value: f32,
    pub mean: f32,
    pub multiplier: f32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub key: String,
    pub vector: FeatureVector,
    pub detection: DetectionResult,
    pub neighbors: Vec<NeighborMatch>,
    /// Search for this anomaly failed; `neighbors` is empty
    pub neighbor_error: Option<String>,
    pub no_similar_found: bool,
    pub normal_mean: Option<FeatureVector>,
    pub anomalous_mean: Option<FeatureVector>,
    pub reasons: Vec<DeviationReason>,
}

impl ReportEntry {
    /// All triggered reasons, in rule order
    pub fn explanation(&self) -> String {
        if self.reasons.is_empty() {
            return "no feature above its deviation threshold".to_string();
        }
        self.reasons
            .iter()
            .map(|r| r.reason.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
