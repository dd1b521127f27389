//! Similarity scoring used by the in-memory store.
//!
//! Every metric is mapped to "higher is more similar" so matches can always
//! be ordered descending. Distances become `1 / (1 + d)`.

use super::types::Metric;

pub fn similarity(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    match metric {
        Metric::Cosine => cosine(a, b),
        Metric::Euclidean => {
            let d: f32 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f32>().sqrt();
            1.0 / (1.0 + d)
        }
        Metric::Manhattan => {
            let d: f32 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
            1.0 / (1.0 + d)
        }
        Metric::Pearson => pearson(a, b),
        Metric::Jaccard => jaccard(a, b),
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn pearson(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len() as f32;
    if n == 0.0 {
        return 0.0;
    }
    let ma = a.iter().sum::<f32>() / n;
    let mb = b.iter().sum::<f32>() / n;
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - ma;
        let dy = y - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    if va == 0.0 || vb == 0.0 {
        0.0
    } else {
        cov / (va.sqrt() * vb.sqrt())
    }
}

/// Weighted Jaccard over magnitudes: sum(min) / sum(max)
fn jaccard(a: &[f32], b: &[f32]) -> f32 {
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (x.abs(), y.abs());
        num += x.min(y);
        den += x.max(y);
    }
    if den == 0.0 {
        1.0
    } else {
        num / den
    }
}
