//! Batch settings.
//!
//! Settings are read from a TOML file whose keys are the upper-case option
//! names (`DO_LIN`, `NL_FITTING_METHOD`, ...). Missing keys take their
//! defaults. Method names stay strings until [`Settings::validate`] or one of
//! the typed accessors parses them, so a typo is reported as a configuration
//! error instead of silently falling back to a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RheoError};
use crate::fitting::CurveFitter;
use crate::models::{FitLimits, ModelKind, SLOPE_LIMIT, VISC_LIMIT};
use crate::search::{
    LinearRangeSearch, LinearSorting, NonlinearRangeSearch, NonlinearSorting, WindowBounds,
    MIN_WINDOW_SPAN,
};

/// Every recognised option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default, deny_unknown_fields)]
pub struct Settings {
    /// Run the linear plateau fit.
    pub do_lin: bool,
    /// Run the nonlinear fit.
    pub do_nl: bool,
    /// Search linear windows instead of fitting the whole series.
    pub auto_lin: bool,
    /// Search nonlinear start indices instead of fitting the whole series.
    pub auto_nl: bool,
    pub nl_fitting_method: String,
    pub lin_sorting_method: String,
    pub nl_sorting_method: String,
    /// Verbose console logging.
    pub debug: bool,
    pub save_graphs: bool,
    pub plot_graphs: bool,
    /// Process every file with extension `ext` in the working directory.
    pub treat_all: bool,
    pub ext: String,
    pub first_point_max: usize,
    pub visc_limit: f64,
    pub slope_limit: f64,
    pub first_divisor: usize,
    pub last_divisor: usize,
    pub min_span: usize,
    pub max_iterations: usize,
    pub parallel: bool,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let windows = WindowBounds::default();
        Self {
            do_lin: true,
            do_nl: true,
            auto_lin: true,
            auto_nl: true,
            nl_fitting_method: ModelKind::Carreau.name().to_string(),
            lin_sorting_method: LinearSorting::ByErrorOverLength.name().to_string(),
            nl_sorting_method: NonlinearSorting::ByAggregateError.name().to_string(),
            debug: false,
            save_graphs: false,
            plot_graphs: false,
            treat_all: false,
            ext: "txt".to_string(),
            first_point_max: crate::search::FIRST_POINT_MAX,
            visc_limit: VISC_LIMIT,
            slope_limit: SLOPE_LIMIT,
            first_divisor: windows.first_divisor,
            last_divisor: windows.last_divisor,
            min_span: windows.min_span,
            max_iterations: 400,
            parallel: false,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check every option that can be wrong.
    pub fn validate(&self) -> Result<()> {
        self.nl_model()?;
        self.lin_sorting()?;
        self.nl_sorting()?;

        for (name, value) in [
            ("FIRST_DIVISOR", self.first_divisor),
            ("LAST_DIVISOR", self.last_divisor),
            ("MAX_ITERATIONS", self.max_iterations),
        ] {
            if value == 0 {
                return Err(invalid(name, "must be at least 1"));
            }
        }
        if self.min_span < MIN_WINDOW_SPAN {
            return Err(invalid("MIN_SPAN", "must be at least 2"));
        }
        for (name, value) in [("VISC_LIMIT", self.visc_limit), ("SLOPE_LIMIT", self.slope_limit)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, "must be a positive number"));
            }
        }
        if self.ext.is_empty() {
            return Err(invalid("EXT", "must not be empty"));
        }
        Ok(())
    }

    /// Model of the nonlinear fit.
    ///
    /// Only the shear-thinning models with a zero-shear plateau are accepted.
    pub fn nl_model(&self) -> Result<ModelKind> {
        let model: ModelKind = self.nl_fitting_method.parse()?;
        match model {
            ModelKind::Carreau | ModelKind::Cross | ModelKind::CarreauYasuda => Ok(model),
            _ => Err(RheoError::UnknownModel(self.nl_fitting_method.clone())),
        }
    }

    pub fn lin_sorting(&self) -> Result<LinearSorting> {
        self.lin_sorting_method.parse()
    }

    pub fn nl_sorting(&self) -> Result<NonlinearSorting> {
        self.nl_sorting_method.parse()
    }

    /// Whether curve bands should be exported.
    pub fn export_bands(&self) -> bool {
        self.save_graphs || self.plot_graphs
    }

    pub fn limits(&self) -> FitLimits {
        FitLimits {
            visc_limit: self.visc_limit,
            slope_limit: self.slope_limit,
        }
    }

    pub fn window_bounds(&self) -> WindowBounds {
        WindowBounds {
            first_divisor: self.first_divisor,
            last_divisor: self.last_divisor,
            min_span: self.min_span,
        }
    }

    pub fn fitter(&self) -> CurveFitter {
        CurveFitter::new().with_max_iterations(self.max_iterations)
    }

    /// The configured linear search.
    pub fn linear_search(&self) -> Result<LinearRangeSearch> {
        Ok(LinearRangeSearch::new(self.lin_sorting()?)
            .with_window_bounds(self.window_bounds())
            .with_limits(self.limits())
            .with_fitter(self.fitter())
            .with_parallel(self.parallel))
    }

    /// The configured nonlinear search.
    pub fn nonlinear_search(&self) -> Result<NonlinearRangeSearch> {
        Ok(NonlinearRangeSearch::new(self.nl_model()?, self.nl_sorting()?)
            .with_first_point_max(self.first_point_max)
            .with_limits(self.limits())
            .with_fitter(self.fitter())
            .with_parallel(self.parallel))
    }
}

fn invalid(name: &str, reason: &str) -> RheoError {
    RheoError::InvalidSetting {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
