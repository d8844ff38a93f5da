//! Least-squares problem definition.
//!
//! The solver only sees the [`Problem`] trait. [`CurveProblem`] adapts a flow
//! model and one window of measurements to it.

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{Result, RheoError};
use crate::models::ModelKind;

/// A nonlinear least-squares problem.
pub trait Problem {
    /// Residuals `model - data` at the given (external) parameters.
    ///
    /// Non-finite residuals are returned as-is; the solver decides what to do
    /// with them.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    fn parameter_count(&self) -> usize;

    fn residual_count(&self) -> usize;

    /// Jacobian of the residuals with respect to the parameters.
    ///
    /// Defaults to forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Whether [`jacobian`](Self::jacobian) is analytic.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Sum of squared residuals.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r * r).sum())
    }
}

/// Fit of one [`ModelKind`] to a window of a measurement series.
#[derive(Debug, Clone)]
pub struct CurveProblem<'a> {
    model: ModelKind,
    x: ArrayView1<'a, f64>,
    y: ArrayView1<'a, f64>,
}

impl<'a> CurveProblem<'a> {
    pub fn new(model: ModelKind, x: ArrayView1<'a, f64>, y: ArrayView1<'a, f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(RheoError::LengthMismatch {
                shear_rate: x.len(),
                viscosity: y.len(),
            });
        }
        if x.is_empty() {
            return Err(RheoError::EmptySeries);
        }
        Ok(Self { model, x, y })
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    fn check_params(&self, params: &Array1<f64>) -> Result<()> {
        if params.len() != self.model.parameter_count() {
            return Err(RheoError::ParameterCount {
                model: self.model.name().to_string(),
                expected: self.model.parameter_count(),
                actual: params.len(),
            });
        }
        Ok(())
    }
}

impl Problem for CurveProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_params(params)?;
        let p = params.to_vec();

        Ok(self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(&xi, &yi)| self.model.evaluate(xi, &p) - yi)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        self.model.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        self.check_params(params)?;
        let p = params.to_vec();
        let n_params = p.len();

        let mut jac = Array2::zeros((self.x.len(), n_params));
        for (i, &xi) in self.x.iter().enumerate() {
            let eta = self.model.value_and_gradient(xi, &p);
            for j in 0..n_params {
                jac[[i, j]] = eta.derivative(j);
            }
        }
        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}
