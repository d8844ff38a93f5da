//! Selected fits and their provenance.
//!
//! A [`FitResult`] is a plain value returned by a search; nothing is cached
//! between calls. Its [`Provenance`] records how it was obtained in the
//! `;`-separated form used in record files:
//!
//! ```text
//! {first};{last};{method};{sorting}[;{flag}...]
//! ```
//!
//! e.g. `0;11;linear_auto;by_error_length` or
//! `2;39;nonlinear_auto_Carreau;overall;param_overflow_during_fitting`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RheoError};
use crate::models::ModelKind;
use crate::search::{FitCandidate, LinearSorting, NonlinearSorting};
use crate::series::Window;

/// How a fit was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    LinearAuto,
    LinearManual,
    NonlinearAuto(ModelKind),
    NonlinearManual(ModelKind),
}

const NONLINEAR_AUTO: &str = "nonlinear_auto_";
const NONLINEAR_MANUAL: &str = "nonlinear_manual_";

impl Method {
    pub fn model(self) -> ModelKind {
        match self {
            Method::LinearAuto | Method::LinearManual => ModelKind::Linear,
            Method::NonlinearAuto(model) | Method::NonlinearManual(model) => model,
        }
    }

    pub fn is_manual(self) -> bool {
        matches!(self, Method::LinearManual | Method::NonlinearManual(_))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::LinearAuto => f.write_str("linear_auto"),
            Method::LinearManual => f.write_str("linear_manual"),
            Method::NonlinearAuto(model) => write!(f, "{}{}", NONLINEAR_AUTO, model.name()),
            Method::NonlinearManual(model) => write!(f, "{}{}", NONLINEAR_MANUAL, model.name()),
        }
    }
}

impl FromStr for Method {
    type Err = RheoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear_auto" => Ok(Method::LinearAuto),
            "linear_manual" => Ok(Method::LinearManual),
            _ => {
                if let Some(model) = s.strip_prefix(NONLINEAR_AUTO) {
                    Ok(Method::NonlinearAuto(parse_model(s, model)?))
                } else if let Some(model) = s.strip_prefix(NONLINEAR_MANUAL) {
                    Ok(Method::NonlinearManual(parse_model(s, model)?))
                } else {
                    Err(RheoError::MalformedProvenance(format!("unknown method {}", s)))
                }
            }
        }
    }
}

fn parse_model(method: &str, name: &str) -> Result<ModelKind> {
    name.parse()
        .map_err(|_| RheoError::MalformedProvenance(format!("unknown model in method {}", method)))
}

/// Ranking used to pick a fit; `Manual` fits were not ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sorting {
    Linear(LinearSorting),
    Nonlinear(NonlinearSorting),
    Manual,
}

impl fmt::Display for Sorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sorting::Linear(sorting) => write!(f, "{}", sorting),
            Sorting::Nonlinear(sorting) => write!(f, "{}", sorting),
            Sorting::Manual => f.write_str("-"),
        }
    }
}

impl FromStr for Sorting {
    type Err = RheoError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "-" {
            return Ok(Sorting::Manual);
        }
        s.parse::<LinearSorting>()
            .map(Sorting::Linear)
            .or_else(|_| s.parse::<NonlinearSorting>().map(Sorting::Nonlinear))
            .map_err(|_| RheoError::MalformedProvenance(format!("unknown sorting {}", s)))
    }
}

/// Solver trouble seen by some candidate of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningFlag {
    /// A candidate overflowed or ran out of iterations.
    ParamOverflow,
    /// A candidate left the model's domain.
    DomainError,
}

impl WarningFlag {
    pub fn name(self) -> &'static str {
        match self {
            WarningFlag::ParamOverflow => "param_overflow_during_fitting",
            WarningFlag::DomainError => "domain_error_during_fitting",
        }
    }
}

impl fmt::Display for WarningFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WarningFlag {
    type Err = RheoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "param_overflow_during_fitting" => Ok(WarningFlag::ParamOverflow),
            "domain_error_during_fitting" => Ok(WarningFlag::DomainError),
            _ => Err(RheoError::MalformedProvenance(format!("unknown flag {}", s))),
        }
    }
}

/// Where a fit came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Provenance {
    pub window: Window,
    pub method: Method,
    pub sorting: Sorting,
    pub flags: Vec<WarningFlag>,
}

impl Provenance {
    pub fn new(window: Window, method: Method, sorting: Sorting) -> Self {
        Self {
            window,
            method,
            sorting,
            flags: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: Vec<WarningFlag>) -> Self {
        self.flags = flags;
        self
    }

    pub fn model(&self) -> ModelKind {
        self.method.model()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.window.first, self.window.last, self.method, self.sorting
        )?;
        for flag in &self.flags {
            write!(f, ";{}", flag)?;
        }
        Ok(())
    }
}

impl FromStr for Provenance {
    type Err = RheoError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.trim().split(';').collect();
        if fields.len() < 4 {
            return Err(RheoError::MalformedProvenance(s.to_string()));
        }

        let index = |field: &str| {
            field
                .parse::<usize>()
                .map_err(|_| RheoError::MalformedProvenance(format!("bad index {} in {}", field, s)))
        };
        let window = Window::new(index(fields[0])?, index(fields[1])?);
        if window.first > window.last {
            return Err(RheoError::MalformedProvenance(s.to_string()));
        }

        let flags = fields[4..]
            .iter()
            .map(|flag| flag.parse())
            .collect::<Result<Vec<WarningFlag>>>()?;

        Ok(Self {
            window,
            method: fields[2].parse()?,
            sorting: fields[3].parse()?,
            flags,
        })
    }
}

impl From<Provenance> for String {
    fn from(provenance: Provenance) -> Self {
        provenance.to_string()
    }
}

impl TryFrom<String> for Provenance {
    type Error = RheoError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// The selected fit of one search or manual fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    candidate: FitCandidate,
    provenance: Provenance,
}

impl FitResult {
    pub fn new(candidate: FitCandidate, provenance: Provenance) -> Self {
        Self {
            candidate,
            provenance,
        }
    }

    pub fn model(&self) -> ModelKind {
        self.candidate.model
    }

    pub fn window(&self) -> Window {
        self.candidate.window
    }

    pub fn parameters(&self) -> &[f64] {
        &self.candidate.parameters
    }

    pub fn parameter_errors(&self) -> &[f64] {
        &self.candidate.parameter_errors
    }

    /// Zero-shear viscosity: the linear intercept or `eta_0`.
    pub fn viscosity(&self) -> (f64, f64) {
        (self.candidate.parameters[0], self.candidate.parameter_errors[0])
    }

    pub fn candidate(&self) -> &FitCandidate {
        &self.candidate
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }
}
