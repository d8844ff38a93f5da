//! Solver and uncertainty tests

mod covariance_tests;
mod lm_tests;
