use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

fn clustered(seed: u64) -> (Vec<String>, Vec<FeatureVector>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys = Vec::new();
    let mut vectors = Vec::new();

    for i in 0..100 {
        keys.push(format!("normal_{}", i));
        vectors.push(FeatureVector::new((0..3).map(|_| rng.gen_range(-1.0..1.0)).collect()));
    }
    for i in 0..5 {
        keys.push(format!("outlier_{}", i));
        vectors.push(FeatureVector::new((0..3).map(|_| 100.0 + rng.gen_range(-1.0..1.0)).collect()));
    }
    (keys, vectors)
}

#[test]
fn test_five_far_points_are_the_anomalies() {
    let (keys, vectors) = clustered(11);
    let results = IsolationForest::new(42).fit_and_label(&keys, &vectors, 0.05).unwrap();

    assert_eq!(results.len(), 105);
    let anomalous: Vec<&str> = results
        .iter()
        .filter(|r| r.is_anomalous())
        .map(|r| r.key.as_str())
        .collect();
    assert_eq!(
        anomalous,
        vec!["outlier_0", "outlier_1", "outlier_2", "outlier_3", "outlier_4"]
    );
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
}

#[test]
fn test_results_follow_row_order() {
    let (keys, vectors) = clustered(3);
    let results = IsolationForest::new(42).fit_and_label(&keys, &vectors, 0.1).unwrap();
    let returned: Vec<&String> = results.iter().map(|r| &r.key).collect();
    assert_eq!(returned, keys.iter().collect::<Vec<_>>());
}

#[test]
fn test_same_seed_same_labels() {
    let (keys, vectors) = clustered(5);
    let model = IsolationForest::new(1234).with_trees(50);

    let first = model.fit_and_label(&keys, &vectors, 0.1).unwrap();
    let second = model.fit_and_label(&keys, &vectors, 0.1).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_max_samples_below_row_count() {
    let (keys, vectors) = clustered(9);
    let results = IsolationForest::new(42)
        .with_max_samples(32)
        .fit_and_label(&keys, &vectors, 0.05)
        .unwrap();
    let flagged = results.iter().filter(|r| r.is_anomalous()).count();
    assert_eq!(flagged, 5);
    assert!(results[100..].iter().all(|r| r.is_anomalous()));
}

#[test]
fn test_single_row_is_insufficient_data() {
    let keys = vec!["only".to_string()];
    let vectors = vec![FeatureVector::new(vec![1.0, 2.0])];
    let err = IsolationForest::default().fit_and_label(&keys, &vectors, 0.05).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientData { found: 1, required: 2 }));

    let err = IsolationForest::default().fit_and_label(&[], &[], 0.05).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientData { found: 0, .. }));
}

#[test]
fn test_ragged_matrix_rejected() {
    let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let vectors = vec![
        FeatureVector::new(vec![1.0, 2.0]),
        FeatureVector::new(vec![1.0, 2.0]),
        FeatureVector::new(vec![1.0]),
    ];
    let err = IsolationForest::default().fit_and_label(&keys, &vectors, 0.3).unwrap_err();
    match err {
        PipelineError::DimensionMismatch { key, expected, actual } => {
            assert_eq!(key, "c");
            assert_eq!((expected, actual), (2, 1));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_contamination_outside_unit_interval() {
    let (keys, vectors) = clustered(1);
    for bad in [0.0, 1.0] {
        let err = IsolationForest::default().fit_and_label(&keys, &vectors, bad).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}

#[test]
fn test_feature_order_does_not_change_labels() {
    let (keys, vectors) = clustered(21);
    let reversed: Vec<FeatureVector> = vectors
        .iter()
        .map(|v| FeatureVector::new(v.as_slice().iter().rev().copied().collect()))
        .collect();

    let model = IsolationForest::new(42);
    let labels = |vs: &[FeatureVector]| -> Vec<Label> {
        model
            .fit_and_label(&keys, vs, 0.05)
            .unwrap()
            .into_iter()
            .map(|r| r.label)
            .collect()
    };
    assert_eq!(labels(&vectors), labels(&reversed));
}

#[test]
fn test_identical_rows_are_never_flagged_alone() {
    let keys: Vec<String> = (0..40).map(|i| format!("k{}", i)).collect();
    let vectors = vec![FeatureVector::new(vec![1.0, 2.0, 3.0]); 40];

    let detection = IsolationForest::new(42).fit(&keys, &vectors, 0.1).unwrap();

    assert_eq!(detection.threshold.anomalous_count, 0);
    assert!(detection.results.iter().all(|r| !r.is_anomalous()));
}

#[test]
fn test_duplicate_vectors_share_label_and_score() {
    let (mut keys, mut vectors) = clustered(11);
    keys.push("outlier_dup".to_string());
    vectors.push(vectors[104].clone());

    let detection = IsolationForest::new(42).fit(&keys, &vectors, 0.05).unwrap();
    let original = &detection.results[104];
    let duplicate = &detection.results[105];

    assert_eq!(original.score, duplicate.score);
    assert_eq!(original.label, duplicate.label);
    let flagged = detection.results.iter().filter(|r| r.is_anomalous()).count();
    assert_eq!(flagged, detection.threshold.anomalous_count);
    assert!(flagged <= 5);
}
