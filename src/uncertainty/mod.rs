//! # Uncertainty Calculation
//!
//! Standard errors of fitted parameters, taken from the covariance matrix at
//! the solution. Propagation of those errors through a model lives with the
//! models themselves (see [`ModelKind::eval_with_uncertainty`](crate::ModelKind::eval_with_uncertainty)).

mod covariance;

pub use covariance::{calculate_correlation, calculate_covariance, standard_errors_from_covariance};

use ndarray::{Array1, Array2};

/// Goodness-of-fit bookkeeping for one fit.
#[derive(Debug, Clone)]
pub struct UncertaintyCalculator {
    /// Degrees of freedom (n_points - n_parameters)
    pub nfree: usize,
    /// Chi-square value at minimum
    pub chisqr: f64,
    /// Reduced chi-square (chi^2 / nfree), infinite without degrees of freedom
    pub redchi: f64,
}

impl UncertaintyCalculator {
    pub fn new(ndata: usize, nvarys: usize, chisqr: f64) -> Self {
        let nfree = ndata.saturating_sub(nvarys);
        let redchi = if nfree == 0 {
            f64::INFINITY
        } else {
            chisqr / nfree as f64
        };

        Self {
            nfree,
            chisqr,
            redchi,
        }
    }

    pub fn covariance(&self, jacobian: &Array2<f64>) -> Array2<f64> {
        calculate_covariance(jacobian, self.redchi)
    }

    pub fn standard_errors(&self, jacobian: &Array2<f64>) -> Array1<f64> {
        standard_errors_from_covariance(&self.covariance(jacobian))
    }
}

/// Standard errors of a fit with `jacobian` at the solution and residual sum of squares `chisqr`.
pub fn standard_errors(jacobian: &Array2<f64>, chisqr: f64) -> Array1<f64> {
    UncertaintyCalculator::new(jacobian.nrows(), jacobian.ncols(), chisqr).standard_errors(jacobian)
}
