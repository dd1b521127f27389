//! PCA projection vectorizer
//!
//! Projects centred numeric columns onto the leading principal components
//! (at most `max_components`, never more than the number of features or
//! samples). A single record cannot be reduced and is passed through raw.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{s, Array1, Array2, Axis};

use super::record::Record;
use super::vector::{check_output, numeric_matrix, FeatureVector, Vectorizer};
use crate::logic::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone)]
pub struct PcaVectorizer {
    pub max_components: usize,
}

impl Default for PcaVectorizer {
    fn default() -> Self {
        Self {
            max_components: crate::constants::DEFAULT_PCA_COMPONENTS,
        }
    }
}

impl PcaVectorizer {
    pub fn new(max_components: usize) -> Self {
        Self { max_components }
    }

    /// Output dimension for a given input shape
    pub fn output_dim(&self, n_samples: usize, n_features: usize) -> usize {
        if n_samples < 2 {
            n_features
        } else {
            self.max_components.min(n_features).min(n_samples)
        }
    }
}

impl Vectorizer for PcaVectorizer {
    fn name(&self) -> &str {
        "pca"
    }

    fn vectorize(&self, records: &[Record]) -> PipelineResult<Vec<FeatureVector>> {
        if self.max_components == 0 {
            return Err(PipelineError::config("PCA needs at least one component"));
        }

        let rows = numeric_matrix(records)?;
        let n = rows.len();
        let p = rows.first().map_or(0, |r| r.len());

        if n < 2 || p == 0 {
            let vectors: Vec<FeatureVector> = rows.iter().map(|r| FeatureVector::from_f64(r)).collect();
            check_output(records, &vectors)?;
            return Ok(vectors);
        }

        let k = self.output_dim(n, p);
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((n, p), flat)
            .map_err(|e| PipelineError::config(format!("PCA input shape: {}", e)))?;

        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::config("PCA on empty matrix"))?;
        let centered = &data - &mean;
        let cov = centered.t().dot(&centered) / (n - 1) as f64;

        let (_, axes) = principal_axes(&cov);
        let basis = axes.slice(s![.., ..k]).to_owned();

        let projected = centered.dot(&basis);
        let vectors: Vec<FeatureVector> = projected
            .rows()
            .into_iter()
            .map(|row| FeatureVector::from_f64(&row.to_vec()))
            .collect();

        check_output(records, &vectors)?;
        Ok(vectors)
    }
}

/// Flip the sign so the largest-magnitude loading is positive
fn orient(column: &mut Array1<f64>) {
    let mut pivot = 0.0_f64;
    for v in column.iter() {
        if v.abs() > pivot.abs() {
            pivot = *v;
        }
    }
    if pivot < 0.0 {
        column.mapv_inplace(|v| -v);
    }
}

/// Eigen-decomposition of a covariance matrix, largest eigenvalue first.
///
/// Columns of the returned matrix are the matching unit eigenvectors, each
/// oriented by `orient`. Equal eigenvalues keep their solver order.
fn principal_axes(cov: &Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let p = cov.nrows();
    let values: Vec<f64> = cov.iter().copied().collect();
    let eigen = SymmetricEigen::new(DMatrix::from_row_slice(p, p, &values));

    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]).then(a.cmp(&b)));

    let mut axes = Array2::<f64>::zeros((p, p));
    for (out_col, &idx) in order.iter().enumerate() {
        let mut column: Array1<f64> = eigen.eigenvectors.column(idx).iter().copied().collect();
        orient(&mut column);
        axes.column_mut(out_col).assign(&column);
    }

    (order.iter().map(|&i| eigen.eigenvalues[i]).collect(), axes)
}
