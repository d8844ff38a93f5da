//! Finite difference approximations of the residual Jacobian.

use ndarray::{Array1, Array2};

use crate::error::{Result, RheoError};
use crate::problem::Problem;

/// Default relative step size.
const DEFAULT_EPSILON: f64 = 1e-8;

/// Jacobian by forward differences: `J[i, j] = d residual[i] / d param[j]`.
///
/// The step for each parameter is `epsilon * |param|`, or `epsilon` itself
/// when the parameter is smaller than that.
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;
    if residuals.len() != n_residuals {
        return Err(RheoError::LengthMismatch {
            shear_rate: n_residuals,
            viscosity: residuals.len(),
        });
    }

    let mut jac = Array2::zeros((n_residuals, n_params));
    for j in 0..n_params {
        let step = if params[j].abs() > eps {
            params[j].abs() * eps
        } else {
            eps
        };

        let mut perturbed = params.clone();
        perturbed[j] += step;
        let shifted = problem.eval(&perturbed)?;

        for i in 0..n_residuals {
            jac[[i, j]] = (shifted[i] - residuals[i]) / step;
        }
    }

    Ok(jac)
}
