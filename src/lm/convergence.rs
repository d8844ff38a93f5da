//! Convergence criteria for the solver.

use ndarray::Array1;

/// Possible states of a run after an accepted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    Running,

    /// Small relative parameter change.
    ParameterConvergence,

    /// Small relative cost reduction.
    FunctionValueConvergence,

    /// Small gradient.
    GradientConvergence,

    /// The damping hit its ceiling without finding a better point.
    Stalled,

    /// Iteration budget exhausted before any criterion was met.
    MaxIterationsReached,
}

impl ConvergenceStatus {
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
                | ConvergenceStatus::Stalled
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small cost change",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::Stalled => "Converged: no further improvement possible",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
        }
    }
}

/// Tolerances checked after every accepted step.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    pub xtol: f64,
    pub ftol: f64,
    pub gtol: f64,
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            xtol: 1e-10,
            ftol: 1e-10,
            gtol: 1e-12,
            max_iterations: 400,
        }
    }
}

impl ConvergenceCriteria {
    pub fn new(xtol: f64, ftol: f64, gtol: f64, max_iterations: usize) -> Self {
        Self {
            xtol,
            ftol,
            gtol,
            max_iterations,
        }
    }

    /// Status after a step from `params` to `new_params`.
    ///
    /// Convergence is tested before the iteration budget, so a step that both
    /// converges and uses the last iteration counts as converged.
    pub fn check(
        &self,
        params: &Array1<f64>,
        new_params: &Array1<f64>,
        cost: f64,
        new_cost: f64,
        gradient_norm: f64,
        iterations: usize,
    ) -> ConvergenceStatus {
        if gradient_norm < self.gtol || new_cost == 0.0 {
            return ConvergenceStatus::GradientConvergence;
        }

        let param_change = new_params
            .iter()
            .zip(params.iter())
            .map(|(a, b)| (a - b).abs() / b.abs().max(1.0))
            .fold(0.0, f64::max);
        if param_change < self.xtol {
            return ConvergenceStatus::ParameterConvergence;
        }

        let cost_change = (cost - new_cost).abs() / cost.max(f64::MIN_POSITIVE);
        if cost_change < self.ftol {
            return ConvergenceStatus::FunctionValueConvergence;
        }

        if iterations >= self.max_iterations {
            return ConvergenceStatus::MaxIterationsReached;
        }

        ConvergenceStatus::Running
    }
}
