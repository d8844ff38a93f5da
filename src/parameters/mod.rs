//! # Parameter Bounds
//!
//! Fitted parameters are plain ordered slices; this module only provides the
//! box constraints the solver enforces and the transformation it enforces them
//! with.

pub mod bounds;

pub use bounds::{Bounds, BoundsTransform};
