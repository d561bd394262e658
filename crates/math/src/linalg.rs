//! Least squares through a singular value decomposition.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::MathError;

/// Coefficients and fit quality of one regression window.
#[derive(Debug, Clone)]
pub struct LeastSquaresResult {
    /// Estimated coefficients, one per design column.
    pub coefficients: Array1<f64>,
    /// In-sample residuals.
    pub residuals: Array1<f64>,
    /// In-sample R².
    pub r_squared: f64,
    /// Numerical rank of the design matrix.
    pub rank: usize,
}

/// Ordinary least squares of `y` on `x` through the pseudo-inverse of `x`.
///
/// The design matrix is used as given; an intercept column must be added by
/// the caller. A rank-deficient design (an all-zero column, or two columns
/// moving together) still yields the minimum-norm least-squares solution.
/// Singular values at or below `max(rows, cols) * eps * s_max` count as zero.
///
/// # Errors
/// Returns [`MathError::DimensionMismatch`] when `x` and `y` disagree on the
/// row count, [`MathError::Underdetermined`] when there are more columns than
/// rows, [`MathError::EmptyData`] for an empty design and
/// [`MathError::NumericalInstability`] when the input or a coefficient is
/// not finite.
pub fn ordinary_least_squares(
    y: &Array1<f64>,
    x: &Array2<f64>,
) -> Result<LeastSquaresResult, MathError> {
    let n = y.len();
    if x.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: x.nrows() });
    }
    let p = x.ncols();
    if n == 0 || p == 0 {
        return Err(MathError::EmptyData);
    }
    if p > n {
        return Err(MathError::Underdetermined { observations: n, parameters: p });
    }
    if y.iter().chain(x.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::NumericalInstability("non-finite input".to_string()));
    }

    let design = DMatrix::from_fn(n, p, |i, j| x[[i, j]]);
    let response = DVector::from_iterator(n, y.iter().copied());
    let svd = design.svd(true, true);
    let largest = svd.singular_values.max();
    let cutoff = n.max(p) as f64 * f64::EPSILON * largest;
    let rank = svd.singular_values.iter().filter(|s| **s > cutoff).count();
    let solution =
        svd.solve(&response, cutoff).map_err(|e| MathError::LinearAlgebra(e.to_string()))?;

    let coefficients: Array1<f64> = solution.iter().copied().collect();
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(MathError::NumericalInstability("non-finite coefficient".to_string()));
    }

    let residuals = y - &x.dot(&coefficients);
    let y_mean = y.mean().unwrap_or(0.0);
    let ss_tot: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Ok(LeastSquaresResult { coefficients, residuals, r_squared, rank })
}
