//! Isolation Forest
//!
//! Random axis-aligned splits isolate outliers in fewer steps than normal
//! rows. Every tree is grown on a subsample of `psi` rows with a height limit
//! of `ceil(log2(psi))`; a row's score is `2^(-E[h(x)] / c(psi))`.

use rand::rngs::StdRng;
use rand::{seq::index, Rng, SeedableRng};

use super::threshold::ContaminationThreshold;
use super::{check_matrix, Detection, DetectionResult, OutlierModel};
use crate::constants;
use crate::logic::config::DetectorConfig;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FeatureVector;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_trees: usize,
    max_samples: usize,
    seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new(constants::DEFAULT_SEED)
    }
}

impl IsolationForest {
    pub fn new(seed: u64) -> Self {
        Self {
            n_trees: constants::DEFAULT_TREES,
            max_samples: constants::DEFAULT_MAX_SAMPLES,
            seed,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            max_samples: config.max_samples,
            seed: config.seed,
        }
    }

    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Anomaly score per row, in row order
    pub fn score_samples(&self, rows: &[Vec<f64>]) -> PipelineResult<Vec<f64>> {
        if self.n_trees == 0 || self.max_samples == 0 {
            return Err(PipelineError::config("n_trees and max_samples must be >= 1"));
        }
        let n = rows.len();
        if n < super::MIN_FIT_ROWS {
            return Err(PipelineError::InsufficientData {
                found: n,
                required: super::MIN_FIT_ROWS,
            });
        }

        let psi = self.max_samples.min(n);
        let height_limit = (psi as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees: Vec<Node> = (0..self.n_trees)
            .map(|_| {
                let sample = index::sample(&mut rng, n, psi).into_vec();
                grow(rows, sample, 0, height_limit, &mut rng)
            })
            .collect();

        let normaliser = average_path_length(psi);
        let scores = rows
            .iter()
            .map(|row| {
                let mean_depth = trees.iter().map(|t| t.path_length(row, 0)).sum::<f64>() / trees.len() as f64;
                2f64.powf(-mean_depth / normaliser)
            })
            .collect();

        Ok(scores)
    }
}

impl OutlierModel for IsolationForest {
    fn name(&self) -> &str {
        "isolation_forest"
    }

    fn fit(&self, keys: &[String], vectors: &[FeatureVector], contamination: f64) -> PipelineResult<Detection> {
        ContaminationThreshold::validate(contamination)?;
        let dim = check_matrix(keys, vectors)?;

        let rows: Vec<Vec<f64>> = vectors
            .iter()
            .map(|v| v.as_slice().iter().map(|x| f64::from(*x)).collect())
            .collect();
        let scores = self.score_samples(&rows)?;
        let (threshold, labels) = ContaminationThreshold::apply(&scores, contamination)?;

        log::info!(
            "Isolation forest: {} rows x {} dims, {} trees, {} anomalous (cut-off {:?})",
            rows.len(),
            dim,
            self.n_trees,
            threshold.anomalous_count,
            threshold.cutoff
        );

        let results = keys
            .iter()
            .zip(scores)
            .zip(labels)
            .map(|((key, score), label)| DetectionResult {
                key: key.clone(),
                label,
                score,
            })
            .collect();

        Ok(Detection { results, threshold })
    }
}

// ============================================================================
// TREE
// ============================================================================

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn path_length(&self, row: &[f64], depth: usize) -> f64 {
        match self {
            Node::Leaf { size } => depth as f64 + average_path_length(*size),
            Node::Split { feature, value, left, right } => {
                if row[*feature] < *value {
                    left.path_length(row, depth + 1)
                } else {
                    right.path_length(row, depth + 1)
                }
            }
        }
    }
}

fn grow(rows: &[Vec<f64>], members: Vec<usize>, depth: usize, limit: usize, rng: &mut StdRng) -> Node {
    if depth >= limit || members.len() <= 1 {
        return Node::Leaf { size: members.len() };
    }

    // Only features that still vary inside this node can split it
    let dim = rows[members[0]].len();
    let candidates: Vec<(usize, f64, f64)> = (0..dim)
        .filter_map(|f| {
            let (lo, hi) = members.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                (lo.min(rows[r][f]), hi.max(rows[r][f]))
            });
            (lo < hi).then_some((f, lo, hi))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf { size: members.len() };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let value = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) = members.into_iter().partition(|&r| rows[r][feature] < value);

    Node::Split {
        feature,
        value,
        left: Box::new(grow(rows, left, depth + 1, limit, rng)),
        right: Box::new(grow(rows, right, depth + 1, limit, rng)),
    }
}

/// Average path length of an unsuccessful BST search over `n` items
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}
