//! Curve fitting: one model, one window, one solver run.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RheoError};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::models::ModelKind;
use crate::parameters::Bounds;
use crate::problem::CurveProblem;
use crate::uncertainty;

/// Parameters of a converged fit and their standard errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterFit {
    pub params: Vec<f64>,
    pub errors: Vec<f64>,
    /// Sum of squared residuals at the solution.
    pub cost: f64,
    pub iterations: usize,
}

/// Fits flow models to measurement windows.
///
/// Holds only solver configuration, so one fitter can be shared by every
/// candidate of a search, across threads.
#[derive(Debug, Clone, Default)]
pub struct CurveFitter {
    solver: LevenbergMarquardt,
}

impl CurveFitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LmConfig) -> Self {
        Self {
            solver: LevenbergMarquardt::with_config(config),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.solver = self.solver.with_max_iterations(max_iterations);
        self
    }

    /// Fit `model` to `(x, y)` within `bounds`.
    ///
    /// Without an initial guess the model's data-driven guess is used. Errors
    /// are `sqrt(diag(cov))`; they are infinite when the window has no more
    /// points than the model has parameters.
    pub fn fit<'a>(
        &self,
        model: ModelKind,
        x: ArrayView1<'a, f64>,
        y: ArrayView1<'a, f64>,
        initial_guess: Option<&[f64]>,
        bounds: &[Bounds],
    ) -> Result<ParameterFit> {
        let initial = match initial_guess {
            Some(guess) => guess.to_vec(),
            None => model.initial_guess(&x, &y),
        };
        if initial.len() != model.parameter_count() {
            return Err(RheoError::ParameterCount {
                model: model.name().to_string(),
                expected: model.parameter_count(),
                actual: initial.len(),
            });
        }

        let problem = CurveProblem::new(model, x, y)?;
        let result = self.solver.minimize(&problem, &Array1::from_vec(initial), bounds)?;
        let errors = uncertainty::standard_errors(&result.jacobian, result.cost);

        tracing::trace!(
            model = model.name(),
            iterations = result.iterations,
            cost = result.cost,
            "{}",
            result.message()
        );

        Ok(ParameterFit {
            params: result.params.to_vec(),
            errors: errors.to_vec(),
            cost: result.cost,
            iterations: result.iterations,
        })
    }
}
