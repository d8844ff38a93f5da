//! Levenberg-Marquardt solver.
//!
//! A bounded, Marquardt-scaled implementation with the failure semantics the
//! range searches rely on: a run either converges or reports why it did not
//! as a [`FitFailure`](crate::error::FitFailure).

pub mod algorithm;
pub mod config;
pub mod convergence;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DecompositionMethod, LmConfig};
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
