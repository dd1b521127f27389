use super::*;
use crate::logic::features::FeatureVector;
use crate::logic::model::{DetectionResult, Label};
use crate::logic::neighbors::{AnomalyNeighbors, NeighborMatch};
use tempfile::tempdir;

fn detection(key: &str, label: Label, score: f64) -> DetectionResult {
    DetectionResult { key: key.to_string(), label, score }
}

fn fixture() -> (Vec<DetectionResult>, Vec<FeatureVector>) {
    let detections = vec![
        detection("zip_85001", Label::Normal, 0.41),
        detection("zip_85002", Label::Normal, 0.39),
        detection("zip_85003", Label::Anomalous, 0.72),
        detection("zip_85004", Label::Anomalous, 0.80),
    ];
    let vectors = vec![
        FeatureVector::new(vec![1.0, 2.0, 10.0]),
        FeatureVector::new(vec![3.0, 2.0, 10.0]),
        FeatureVector::new(vec![5.0, 5.0, 10.0]),
        FeatureVector::new(vec![1.0, 1.0, 30.0]),
    ];
    (detections, vectors)
}

#[test]
fn test_population_means() {
    let (detections, vectors) = fixture();
    let (normal, anomalous) = population_means(&vectors, &detections);
    assert_eq!(normal.unwrap().as_slice(), &[2.0, 2.0, 10.0]);
    assert_eq!(anomalous.unwrap().as_slice(), &[3.0, 3.0, 20.0]);
}

#[test]
fn test_empty_population_has_no_mean() {
    let detections = vec![detection("a", Label::Normal, 0.1), detection("b", Label::Normal, 0.2)];
    let vectors = vec![FeatureVector::new(vec![1.0]), FeatureVector::new(vec![3.0])];
    let (normal, anomalous) = population_means(&vectors, &detections);
    assert_eq!(normal.unwrap().as_slice(), &[2.0]);
    assert!(anomalous.is_none());
}

#[test]
fn test_every_triggered_reason_is_reported() {
    let (detections, vectors) = fixture();
    let (normal, anomalous) = population_means(&vectors, &detections);
    let rules = DeviationRules::uniform(&["avg_rate", "peak_rate", "tiered_rate"], 1.2);

    let entries = assemble(&detections, &vectors, &[], normal.as_ref(), anomalous.as_ref(), &rules);

    assert_eq!(entries.len(), 2);
    // [5, 5, 10] vs mean [2, 2, 10]: first two exceed 1.2x, third does not
    let names: Vec<&str> = entries[0].reasons.iter().map(|r| r.feature_name.as_str()).collect();
    assert_eq!(names, vec!["avg_rate", "peak_rate"]);
    assert_eq!(
        entries[0].explanation(),
        "avg_rate above 1.2x normal mean; peak_rate above 1.2x normal mean"
    );
    // [1, 1, 30]: only the third
    assert_eq!(entries[1].reasons.len(), 1);
    assert_eq!(entries[1].reasons[0].feature_index, 2);
    assert_eq!(entries[1].reasons[0].mean, 10.0);
}

#[test]
fn test_custom_rules_keep_their_order_and_text() {
    let (detections, vectors) = fixture();
    let (normal, _) = population_means(&vectors, &detections);
    let rules = DeviationRules::new(vec![
        DeviationRule {
            feature_index: 1,
            feature_name: "volatility".to_string(),
            multiplier: 2.0,
            reason: "High volatility".to_string(),
        },
        DeviationRule {
            feature_index: 0,
            feature_name: "volume".to_string(),
            multiplier: 1.5,
            reason: "Unusual trading volume".to_string(),
        },
        // Out of range for a 3-d vector; ignored
        DeviationRule {
            feature_index: 9,
            feature_name: "spread".to_string(),
            multiplier: 1.0,
            reason: "Wide spread".to_string(),
        },
    ]);

    let entries = assemble(&detections, &vectors, &[], normal.as_ref(), None, &rules);
    assert_eq!(entries[0].explanation(), "High volatility; Unusual trading volume");
    assert!(entries[0].anomalous_mean.is_none());
}

#[test]
fn test_neighbours_attached_and_missing_flagged() {
    let (detections, vectors) = fixture();
    let (normal, anomalous) = population_means(&vectors, &detections);
    let neighbors = vec![
        AnomalyNeighbors {
            source_key: "zip_85003".to_string(),
            matches: vec![NeighborMatch {
                source_key: "zip_85003".to_string(),
                candidate_key: "zip_85002".to_string(),
                similarity_score: 0.93,
            }],
            error: None,
        },
        AnomalyNeighbors {
            source_key: "zip_85004".to_string(),
            matches: vec![],
            error: Some("Transport error: Server error: 503".to_string()),
        },
    ];

    let entries = assemble(
        &detections,
        &vectors,
        &neighbors,
        normal.as_ref(),
        anomalous.as_ref(),
        &DeviationRules::generic(3, 1.2),
    );

    assert!(!entries[0].no_similar_found);
    assert_eq!(entries[0].neighbors[0].candidate_key, "zip_85002");
    assert!(entries[1].no_similar_found);
    assert!(entries[1].neighbor_error.is_some());
    assert_eq!(entries[1].reasons[0].feature_name, "feature_2");
}

#[test]
fn test_no_anomalies_no_entries() {
    let detections = vec![detection("a", Label::Normal, 0.1)];
    let vectors = vec![FeatureVector::new(vec![1.0])];
    let entries = assemble(&detections, &vectors, &[], None, None, &DeviationRules::default());
    assert!(entries.is_empty());
}

#[test]
fn test_jsonl_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.jsonl");
    let (detections, vectors) = fixture();
    let (normal, anomalous) = population_means(&vectors, &detections);
    let entries = assemble(
        &detections,
        &vectors,
        &[],
        normal.as_ref(),
        anomalous.as_ref(),
        &DeviationRules::generic(3, 1.2),
    );

    let written = to_jsonl(&entries, &path).unwrap();
    assert_eq!(written, 2);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["key"], "zip_85003");
    assert_eq!(first["detection"]["label"], "anomalous");
    assert_eq!(first["no_similar_found"], true);
    assert_eq!(first["vector"].as_array().unwrap().len(), 3);
}
