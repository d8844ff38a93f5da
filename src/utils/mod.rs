//! Numerical helpers shared by the solver and the uncertainty estimates.

pub mod finite_difference;
pub mod matrix_convert;
