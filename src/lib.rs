//! # rheofit
//!
//! `rheofit` fits rheological models to rheometer flow curves and picks the
//! part of each curve a model describes best.
//!
//! The library provides:
//! - Linear (Newtonian plateau), Power-Law, Carreau, Cross and Carreau-Yasuda
//!   models, with first-order uncertainty propagation
//! - A bounded Levenberg-Marquardt solver with covariance-derived standard errors
//! - Range searches: every linear index window, or every nonlinear start index,
//!   ranked by parameter error
//! - Collaborators for batch use: export reader, record files, plot data
//!
//! ## Basic Usage
//!
//! ```
//! use rheofit::{LinearRangeSearch, LinearSorting, MeasurementSeries};
//!
//! let pairs: Vec<(f64, f64)> = (0..12)
//!     .map(|i| (0.1 * 1.5f64.powi(i), if i % 2 == 0 { 101.0 } else { 99.0 }))
//!     .collect();
//! let series = MeasurementSeries::from_pairs(&pairs).unwrap();
//!
//! let result = LinearRangeSearch::new(LinearSorting::ByErrorOverLength)
//!     .run(&series)
//!     .unwrap();
//! let (eta_0, _error) = result.viscosity();
//! assert!((eta_0 - 100.0).abs() < 2.0);
//! ```

pub mod config;
pub mod error;
pub mod fitting;
pub mod io;
pub mod lm;
pub mod models;
pub mod parameters;
pub mod problem;
pub mod result;
pub mod search;
pub mod series;
pub mod session;
pub mod uncertainty;

mod utils;

// Re-exports for convenience
pub use config::Settings;
pub use error::{FitFailure, Result, RheoError};
pub use fitting::{CurveFitter, ParameterFit};
pub use lm::LevenbergMarquardt;
pub use models::{FitLimits, ModelKind};
pub use problem::Problem;
pub use result::{FitResult, Method, Provenance, Sorting, WarningFlag};
pub use search::{
    FitCandidate, LinearRangeSearch, LinearSorting, NonlinearRangeSearch, NonlinearSorting,
};
pub use series::{MeasurementSeries, Window};
pub use session::{FileReport, FitOutcome, FitSession};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
