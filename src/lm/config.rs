//! Configuration options for the Levenberg-Marquardt solver.

/// Method for solving the damped normal equations of each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionMethod {
    /// Cholesky factorisation, falling back to SVD when the system is not
    /// positive definite.
    #[default]
    Auto,

    /// Always use the SVD pseudo-inverse.
    Svd,
}

/// Configuration options for the Levenberg-Marquardt solver.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Maximum number of accepted steps. Default: 400
    pub max_iterations: usize,

    /// Relative tolerance on the cost reduction. Default: 1e-10
    pub ftol: f64,

    /// Relative tolerance on the parameter change. Default: 1e-10
    pub xtol: f64,

    /// Tolerance on the infinity norm of the scaled gradient. Default: 1e-12
    pub gtol: f64,

    /// Initial damping. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor applied to the damping after a rejected step. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor applied to the damping after an accepted step. Default: 0.1
    pub lambda_down_factor: f64,

    /// Lower clamp for the damping. Default: 1e-12
    pub min_lambda: f64,

    /// Damping above which the solver gives up improving. Default: 1e12
    pub max_lambda: f64,

    /// Magnitude beyond which a parameter counts as diverged. Default: 1e100
    pub overflow_limit: f64,

    /// Linear solver for each step. Default: Auto
    pub decomposition_method: DecompositionMethod,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 400,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            overflow_limit: 1e100,
            decomposition_method: DecompositionMethod::default(),
        }
    }
}
