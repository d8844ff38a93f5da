//! # Covariance Matrix Calculations
//!
//! Parameter covariance of a least-squares fit, estimated from the Jacobian
//! at the solution as `covar = redchi * pinv(J^T J)`.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Covariance matrix from a Jacobian and the reduced chi-square.
///
/// When `J^T J` is rank deficient some parameter combination is not
/// determined by the data; every entry is then `+inf`, as it is when
/// `redchi` itself is infinite (no degrees of freedom).
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Array2<f64> {
    let n = jacobian.ncols();
    let unknown = Array2::from_elem((n, n), f64::INFINITY);
    if !redchi.is_finite() || jacobian.iter().any(|v| !v.is_finite()) {
        return unknown;
    }

    let j = ndarray_to_nalgebra(jacobian);
    let jtj: DMatrix<f64> = j.transpose() * &j;
    let svd = jtj.svd(true, true);

    let largest = svd.singular_values.amax();
    let tolerance = largest * n as f64 * f64::EPSILON;
    if largest == 0.0 || svd.singular_values.iter().any(|&s| s <= tolerance) {
        return unknown;
    }

    match svd.pseudo_inverse(tolerance) {
        Ok(inverse) => nalgebra_to_ndarray(&inverse).mapv(|v| v * redchi),
        Err(_) => unknown,
    }
}

/// Correlation matrix: `correl[i, j] = covar[i, j] / sqrt(covar[i, i] * covar[j, j])`.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                correl[[i, j]] = if denom > 0.0 && denom.is_finite() {
                    covar[[i, j]] / denom
                } else {
                    0.0
                };
            }
        }
    }

    correl
}

/// Square roots of the covariance diagonal.
///
/// A zero variance (perfect fit) gives a zero error; a negative or NaN
/// variance has no meaningful error and gives `+inf`.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar.diag().mapv(|v| {
        if v >= 0.0 {
            v.sqrt()
        } else {
            f64::INFINITY
        }
    })
}
