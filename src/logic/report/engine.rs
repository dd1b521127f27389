use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{DeviationReason, ReportEntry};
use crate::logic::features::FeatureVector;
use crate::logic::model::{DetectionResult, Label};
use crate::logic::neighbors::AnomalyNeighbors;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationRule {
    pub feature_index: usize,
    pub feature_name: String,
    /// Triggers when value > mean * multiplier
    pub multiplier: f32,
    pub reason: String,
}

impl DeviationRule {
    fn check(&self, vector: &FeatureVector, mean: &FeatureVector) -> Option<DeviationReason> {
        let value = vector.get(self.feature_index)?;
        let mean = mean.get(self.feature_index)?;
        (value > mean * self.multiplier).then(|| DeviationReason {
            feature_index: self.feature_index,
            feature_name: self.feature_name.clone(),
            value,
            mean,
            multiplier: self.multiplier,
            reason: self.reason.clone(),
        })
    }
}

/// Ordered rule set; every triggered rule is reported
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviationRules {
    pub rules: Vec<DeviationRule>,
}

impl DeviationRules {
    pub fn new(rules: Vec<DeviationRule>) -> Self {
        Self { rules }
    }

    /// One rule per named feature, all with the same multiplier
    pub fn uniform<S: AsRef<str>>(names: &[S], multiplier: f32) -> Self {
        let rules = names
            .iter()
            .enumerate()
            .map(|(i, name)| DeviationRule {
                feature_index: i,
                feature_name: name.as_ref().to_string(),
                multiplier,
                reason: format!("{} above {}x normal mean", name.as_ref(), multiplier),
            })
            .collect();
        Self { rules }
    }

    /// `uniform` over `feature_0 .. feature_{dim-1}`
    pub fn generic(dim: usize, multiplier: f32) -> Self {
        let names: Vec<String> = (0..dim).map(|i| format!("feature_{}", i)).collect();
        Self::uniform(&names, multiplier)
    }

    pub fn evaluate(&self, vector: &FeatureVector, mean: &FeatureVector) -> Vec<DeviationReason> {
        self.rules.iter().filter_map(|rule| rule.check(vector, mean)).collect()
    }
}

/// Component-wise means of the normal and anomalous populations.
///
/// `vectors[i]` belongs to `detections[i]`. An empty population has no mean.
pub fn population_means(
    vectors: &[FeatureVector],
    detections: &[DetectionResult],
) -> (Option<FeatureVector>, Option<FeatureVector>) {
    let mean_of = |label: Label| -> Option<FeatureVector> {
        let members: Vec<&FeatureVector> = vectors
            .iter()
            .zip(detections)
            .filter(|(_, d)| d.label == label)
            .map(|(v, _)| v)
            .collect();
        let first = members.first()?;

        let mut sums = vec![0f64; first.dim()];
        for v in &members {
            for (sum, x) in sums.iter_mut().zip(v.as_slice()) {
                *sum += f64::from(*x);
            }
        }
        let count = members.len() as f64;
        Some(FeatureVector::from_f64(
            &sums.iter().map(|s| s / count).collect::<Vec<_>>(),
        ))
    };

    (mean_of(Label::Normal), mean_of(Label::Anomalous))
}

/// One entry per anomalous detection, in detection order.
pub fn assemble(
    detections: &[DetectionResult],
    vectors: &[FeatureVector],
    neighbor_matches: &[AnomalyNeighbors],
    normal_mean: Option<&FeatureVector>,
    anomalous_mean: Option<&FeatureVector>,
    rules: &DeviationRules,
) -> Vec<ReportEntry> {
    let by_source: HashMap<&str, &AnomalyNeighbors> =
        neighbor_matches.iter().map(|n| (n.source_key.as_str(), n)).collect();

    detections
        .iter()
        .zip(vectors)
        .filter(|(d, _)| d.is_anomalous())
        .map(|(detection, vector)| {
            let found = by_source.get(detection.key.as_str());
            let neighbors = found.map(|n| n.matches.clone()).unwrap_or_default();
            let reasons = normal_mean
                .map(|mean| rules.evaluate(vector, mean))
                .unwrap_or_default();

            ReportEntry {
                key: detection.key.clone(),
                vector: vector.clone(),
                detection: detection.clone(),
                no_similar_found: neighbors.is_empty(),
                neighbors,
                neighbor_error: found.and_then(|n| n.error.clone()),
                normal_mean: normal_mean.cloned(),
                anomalous_mean: anomalous_mean.cloned(),
                reasons,
            }
        })
        .collect()
}
