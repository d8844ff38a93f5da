//! Rheological flow models.
//!
//! Each model maps shear rate and an ordered parameter slice to viscosity.
//! Evaluation comes in scalar and vectorised form, each with a variant that
//! propagates parameter standard errors to first order.
//!
//! No model validates its domain: negative shear rates or parameters that make
//! a fractional power of a negative base produce NaN, and callers filter their
//! data beforehand.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayBase, Data, Ix1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RheoError};
use crate::parameters::Bounds;

mod flow;
mod scalar;

pub use flow::{carreau, carreau_yasuda, cross, linear, power_law};
pub use scalar::{Real, Uncertain, MAX_PARAMS};

/// Default upper bound for fitted viscosities.
pub const VISC_LIMIT: f64 = 10_000_000.0;

/// Default upper bound for the slope of a plateau fit.
pub const SLOPE_LIMIT: f64 = 1e-4;

/// Limits used to build the default parameter bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitLimits {
    /// Upper bound of the linear intercept.
    pub visc_limit: f64,
    /// Upper bound of the linear slope.
    pub slope_limit: f64,
}

impl Default for FitLimits {
    fn default() -> Self {
        Self {
            visc_limit: VISC_LIMIT,
            slope_limit: SLOPE_LIMIT,
        }
    }
}

/// The supported flow models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// `eta = a + b * x`
    Linear,
    /// `eta = k * x^(n - 1)`
    PowerLaw,
    /// `eta = eta_inf + (eta_0 - eta_inf) / (1 + (x / GP_b)^2)^(n / 2)`
    Carreau,
    /// `eta = eta_inf + (eta_0 - eta_inf) / (1 + (x / GP_b)^n)`
    Cross,
    /// `eta = eta_inf + (eta_0 - eta_inf) * (1 + (lambda * x)^a)^((n - 1) / a)`
    CarreauYasuda,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Linear,
        ModelKind::PowerLaw,
        ModelKind::Carreau,
        ModelKind::Cross,
        ModelKind::CarreauYasuda,
    ];

    /// Name used in settings, record files and provenance strings.
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Linear => "Linear",
            ModelKind::PowerLaw => "Power-Law",
            ModelKind::Carreau => "Carreau",
            ModelKind::Cross => "Cross",
            ModelKind::CarreauYasuda => "Carreau-Yasuda",
        }
    }

    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Linear => &["a", "b"],
            ModelKind::PowerLaw => &["k", "n"],
            ModelKind::Carreau | ModelKind::Cross => &["eta_0", "eta_inf", "GP_b", "n"],
            ModelKind::CarreauYasuda => &["eta_0", "eta_inf", "lambda", "a", "n"],
        }
    }

    pub fn parameter_count(self) -> usize {
        self.parameter_names().len()
    }

    pub fn is_linear(self) -> bool {
        self == ModelKind::Linear
    }

    /// Evaluate at one shear rate over any [`Real`] scalar.
    ///
    /// # Panics
    ///
    /// Panics if `params` holds fewer than
    /// [`parameter_count`](Self::parameter_count) values; [`eval`](Self::eval)
    /// checks the count instead.
    pub fn evaluate<T: Real>(self, x: f64, params: &[T]) -> T {
        match self {
            ModelKind::Linear => linear(x, params),
            ModelKind::PowerLaw => power_law(x, params),
            ModelKind::Carreau => carreau(x, params),
            ModelKind::Cross => cross(x, params),
            ModelKind::CarreauYasuda => carreau_yasuda(x, params),
        }
    }

    /// Viscosity at a single shear rate.
    pub fn eval(self, x: f64, params: &[f64]) -> Result<f64> {
        self.check_count(params.len())?;
        Ok(self.evaluate(x, params))
    }

    /// Viscosity at every shear rate of `x`.
    pub fn eval_array<S: Data<Elem = f64>>(
        self,
        x: &ArrayBase<S, Ix1>,
        params: &[f64],
    ) -> Result<Array1<f64>> {
        self.check_count(params.len())?;
        Ok(x.mapv(|xi| self.evaluate(xi, params)))
    }

    /// Viscosity and its propagated standard error at a single shear rate.
    pub fn eval_with_uncertainty(self, x: f64, params: &[f64], errors: &[f64]) -> Result<(f64, f64)> {
        let vars = self.uncertain_params(params, errors)?;
        let eta = self.evaluate(x, &vars);
        Ok((eta.value(), eta.std_dev()))
    }

    /// Vectorised [`eval_with_uncertainty`](Self::eval_with_uncertainty).
    pub fn eval_array_with_uncertainty<S: Data<Elem = f64>>(
        self,
        x: &ArrayBase<S, Ix1>,
        params: &[f64],
        errors: &[f64],
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        let vars = self.uncertain_params(params, errors)?;
        let mut values = Array1::zeros(x.len());
        let mut std_devs = Array1::zeros(x.len());
        for (i, &xi) in x.iter().enumerate() {
            let eta = self.evaluate(xi, &vars);
            values[i] = eta.value();
            std_devs[i] = eta.std_dev();
        }
        Ok((values, std_devs))
    }

    /// Value and parameter derivatives at one shear rate.
    pub(crate) fn value_and_gradient(self, x: f64, params: &[f64]) -> Uncertain {
        let vars: Vec<Uncertain> = params
            .iter()
            .enumerate()
            .map(|(i, &p)| Uncertain::variable(i, p, 1.0))
            .collect();
        self.evaluate(x, &vars)
    }

    /// Data-driven starting point for the solver.
    pub fn initial_guess<S: Data<Elem = f64>>(
        self,
        x: &ArrayBase<S, Ix1>,
        y: &ArrayBase<S, Ix1>,
    ) -> Vec<f64> {
        match self {
            ModelKind::Linear => {
                let mean = y.mean().unwrap_or(0.0);
                vec![mean.max(0.0), 0.0]
            }
            ModelKind::PowerLaw => match flow::log_log_slope(x, y) {
                Some((slope, intercept)) => vec![intercept.exp(), slope + 1.0],
                None => vec![1.0, 1.0],
            },
            ModelKind::Carreau | ModelKind::Cross => {
                let shape = flow::curve_shape(x, y);
                let n = (-shape.tail_slope).clamp(0.05, 1.5);
                vec![shape.plateau, shape.floor, shape.break_rate, n]
            }
            ModelKind::CarreauYasuda => {
                let shape = flow::curve_shape(x, y);
                let n = (1.0 + shape.tail_slope).clamp(0.05, 0.95);
                vec![shape.plateau, shape.floor, 1.0 / shape.break_rate, 2.0, n]
            }
        }
    }

    /// Parameter bounds used by the range search.
    pub fn default_bounds(self, limits: &FitLimits) -> Vec<Bounds> {
        match self {
            ModelKind::Linear => vec![
                Bounds {
                    min: 0.0,
                    max: limits.visc_limit,
                },
                Bounds {
                    min: 0.0,
                    max: limits.slope_limit,
                },
            ],
            ModelKind::Carreau | ModelKind::Cross => vec![Bounds::min_only(0.0); 4],
            ModelKind::PowerLaw | ModelKind::CarreauYasuda => {
                vec![Bounds::unbounded(); self.parameter_count()]
            }
        }
    }

    fn check_count(self, actual: usize) -> Result<()> {
        if actual != self.parameter_count() {
            return Err(RheoError::ParameterCount {
                model: self.name().to_string(),
                expected: self.parameter_count(),
                actual,
            });
        }
        Ok(())
    }

    fn uncertain_params(self, params: &[f64], errors: &[f64]) -> Result<Vec<Uncertain>> {
        self.check_count(params.len())?;
        self.check_count(errors.len())?;
        Ok(params
            .iter()
            .zip(errors.iter())
            .enumerate()
            .map(|(i, (&p, &e))| Uncertain::variable(i, p, e))
            .collect())
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = RheoError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "linear" => Ok(ModelKind::Linear),
            "powerlaw" => Ok(ModelKind::PowerLaw),
            "carreau" => Ok(ModelKind::Carreau),
            "cross" => Ok(ModelKind::Cross),
            "carreauyasuda" => Ok(ModelKind::CarreauYasuda),
            _ => Err(RheoError::UnknownModel(s.to_string())),
        }
    }
}
