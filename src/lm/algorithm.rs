//! Implementation of the bounded Levenberg-Marquardt algorithm.
//!
//! The solver iterates on unbounded internal parameters and evaluates the
//! problem at the matching bounded external parameters (see
//! [`BoundsTransform`]). Each step solves the Marquardt-scaled system
//! `(J^T J + lambda * diag(J^T J)) delta = -J^T r`.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{FitFailure, Result, RheoError};
use crate::parameters::{Bounds, BoundsTransform};
use crate::problem::Problem;
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

use super::config::{DecompositionMethod, LmConfig};
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};

/// Result of a successful minimisation.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimised (external) parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of residual evaluations
    pub func_evals: usize,

    /// Criterion that stopped the iteration
    pub status: ConvergenceStatus,

    /// The Jacobian with respect to the external parameters at the solution
    pub jacobian: Array2<f64>,
}

impl LmResult {
    pub fn message(&self) -> &'static str {
        self.status.description()
    }
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Status: {}", self.message())?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params.to_vec())?;
        Ok(())
    }
}

/// A point the solver has evaluated.
struct Trial {
    internal: Array1<f64>,
    params: Array1<f64>,
    residuals: Array1<f64>,
    cost: f64,
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of accepted steps.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial damping.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the magnitude beyond which a parameter counts as diverged.
    pub fn with_overflow_limit(mut self, limit: f64) -> Self {
        self.config.overflow_limit = limit;
        self
    }

    pub fn with_decomposition_method(mut self, method: DecompositionMethod) -> Self {
        self.config.decomposition_method = method;
        self
    }

    /// Minimize the sum of squared residuals of `problem` within `bounds`.
    ///
    /// Start values sitting on a bound are moved slightly inside it first.
    ///
    /// # Errors
    ///
    /// * [`FitFailure::DomainError`] if the residuals or the Jacobian are not
    ///   finite at the start or at an accepted point
    /// * [`FitFailure::Overflow`] if a parameter becomes non-finite or exceeds
    ///   the overflow limit
    /// * [`FitFailure::NoConvergence`] if the iteration budget runs out
    /// * [`RheoError::InvalidBounds`] or [`RheoError::ParameterCount`] for
    ///   inconsistent inputs
    pub fn minimize<P: Problem>(
        &self,
        problem: &P,
        initial_params: &Array1<f64>,
        bounds: &[Bounds],
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(RheoError::ParameterCount {
                model: "least-squares problem".to_string(),
                expected: n_params,
                actual: initial_params.len(),
            });
        }
        if bounds.len() != n_params {
            return Err(RheoError::InvalidBounds(format!(
                "expected {} bounds, got {}",
                n_params,
                bounds.len()
            )));
        }

        let transforms: Vec<BoundsTransform> = bounds.iter().map(|b| BoundsTransform::new(*b)).collect();
        let mut internal = Array1::zeros(n_params);
        for (i, transform) in transforms.iter().enumerate() {
            internal[i] = transform.to_internal(bounds[i].interior_start(initial_params[i]))?;
        }

        let mut params = to_external(&transforms, &internal);
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;
        if !all_finite(residuals.iter()) {
            return Err(FitFailure::DomainError(
                "residuals are not finite at the starting point".to_string(),
            )
            .into());
        }
        let mut cost = sum_of_squares(&residuals);

        let criteria = ConvergenceCriteria::new(
            self.config.xtol,
            self.config.ftol,
            self.config.gtol,
            self.config.max_iterations,
        );
        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;

        let status = loop {
            let jac = problem.jacobian(&params)?;
            if !all_finite(jac.iter()) {
                return Err(FitFailure::DomainError(format!(
                    "Jacobian is not finite at {:?}",
                    params.to_vec()
                ))
                .into());
            }

            let j = internal_jacobian(&jac, &transforms, &internal);
            let jt = j.transpose();
            let jtj = &jt * &j;
            let gradient = &jt * ndarray_vec_to_nalgebra(&residuals);

            let gradient_norm = gradient.amax();
            if gradient_norm < self.config.gtol || cost == 0.0 {
                break ConvergenceStatus::GradientConvergence;
            }

            let scale = marquardt_scale(&jtj);
            let rhs = -gradient;

            let mut accepted = None;
            while accepted.is_none() {
                let mut system = jtj.clone();
                for i in 0..n_params {
                    system[(i, i)] += lambda * scale[i];
                }

                if let Some(delta) = self.solve(system, &rhs) {
                    let trial_internal = &internal + &nalgebra_vec_to_ndarray(&delta);
                    let trial_params = to_external(&transforms, &trial_internal);
                    if !all_finite(trial_params.iter()) {
                        return Err(FitFailure::Overflow(format!(
                            "trial parameters {:?} are not finite",
                            trial_params.to_vec()
                        ))
                        .into());
                    }

                    let trial_residuals = problem.eval(&trial_params)?;
                    func_evals += 1;

                    // Steps into the region where the model is undefined are
                    // rejected like any other uphill step.
                    if all_finite(trial_residuals.iter()) {
                        let trial_cost = sum_of_squares(&trial_residuals);
                        if trial_cost < cost {
                            accepted = Some(Trial {
                                internal: trial_internal,
                                params: trial_params,
                                residuals: trial_residuals,
                                cost: trial_cost,
                            });
                            continue;
                        }
                    }
                }

                lambda *= self.config.lambda_up_factor;
                if lambda > self.config.max_lambda {
                    break;
                }
            }

            let Some(trial) = accepted else {
                break ConvergenceStatus::Stalled;
            };

            iterations += 1;
            let status = criteria.check(
                &params,
                &trial.params,
                cost,
                trial.cost,
                gradient_norm,
                iterations,
            );

            internal = trial.internal;
            params = trial.params;
            residuals = trial.residuals;
            cost = trial.cost;
            lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);

            if let Some((index, value)) = params
                .iter()
                .enumerate()
                .find(|(_, v)| v.abs() > self.config.overflow_limit)
            {
                return Err(FitFailure::Overflow(format!(
                    "parameter {} reached {:e}",
                    index, value
                ))
                .into());
            }

            match status {
                ConvergenceStatus::Running => continue,
                ConvergenceStatus::MaxIterationsReached => {
                    return Err(FitFailure::NoConvergence(format!(
                        "maximum iterations ({}) reached",
                        self.config.max_iterations
                    ))
                    .into());
                }
                converged => break converged,
            }
        };

        let jacobian = problem.jacobian(&params)?;

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            status,
            jacobian,
        })
    }

    /// Solve the damped system, or `None` when it has no finite solution.
    fn solve(&self, system: DMatrix<f64>, rhs: &DVector<f64>) -> Option<DVector<f64>> {
        let solution = match self.config.decomposition_method {
            DecompositionMethod::Auto => match system.clone().cholesky() {
                Some(cholesky) => Some(cholesky.solve(rhs)),
                None => solve_svd(system, rhs),
            },
            DecompositionMethod::Svd => solve_svd(system, rhs),
        }?;

        if solution.iter().all(|v| v.is_finite()) {
            Some(solution)
        } else {
            None
        }
    }
}

fn solve_svd(system: DMatrix<f64>, rhs: &DVector<f64>) -> Option<DVector<f64>> {
    system.svd(true, true).solve(rhs, f64::EPSILON).ok()
}

fn to_external(transforms: &[BoundsTransform], internal: &Array1<f64>) -> Array1<f64> {
    transforms
        .iter()
        .zip(internal.iter())
        .map(|(t, &u)| t.to_external(u))
        .collect()
}

/// Chain rule from the external Jacobian to the internal one.
fn internal_jacobian(
    jac: &Array2<f64>,
    transforms: &[BoundsTransform],
    internal: &Array1<f64>,
) -> DMatrix<f64> {
    let mut j = ndarray_to_nalgebra(jac);
    for (col, transform) in transforms.iter().enumerate() {
        let factor = transform.external_derivative(internal[col]);
        j.column_mut(col).scale_mut(factor);
    }
    j
}

/// Diagonal of `J^T J`, floored so every parameter keeps some damping.
fn marquardt_scale(jtj: &DMatrix<f64>) -> DVector<f64> {
    let diag = jtj.diagonal();
    let largest = diag.amax();
    let floor = if largest > 0.0 { largest * 1e-12 } else { 1.0 };
    diag.map(|d| d.max(floor))
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

fn all_finite<'a>(mut values: impl Iterator<Item = &'a f64>) -> bool {
    values.all(|v| v.is_finite())
}
