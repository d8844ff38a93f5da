//! # Range Search
//!
//! Automatic selection of the part of a flow curve a model describes best.
//!
//! * [`LinearRangeSearch`] fits the Newtonian plateau on every candidate index
//!   window and ranks the windows by the intercept error.
//! * [`NonlinearRangeSearch`] fits a shear-thinning model from each candidate
//!   start index to the end of the series and ranks by parameter errors.
//!
//! Every candidate is fitted independently; failures are logged to the
//! `incident` target and excluded from the ranking. Ranking happens only
//! after all candidates are collected and uses a stable sort, so ties keep
//! iteration order whether or not the fits ran in parallel.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{FitFailure, Result, RheoError};
use crate::models::ModelKind;
use crate::result::{FitResult, Method, Provenance, Sorting, WarningFlag};
use crate::series::Window;

mod linear;
mod nonlinear;

pub use linear::{LinearRangeSearch, WindowBounds, MIN_WINDOW_SPAN};
pub use nonlinear::{NonlinearRangeSearch, FIRST_POINT_MAX};

/// Ranking heuristic for linear windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinearSorting {
    /// Ascending `ln(intercept_error)`.
    ByError,
    /// Ascending `ln(intercept_error) / (last - first)`.
    ByErrorOverLength,
}

impl LinearSorting {
    pub fn name(self) -> &'static str {
        match self {
            LinearSorting::ByError => "by_error",
            LinearSorting::ByErrorOverLength => "by_error_length",
        }
    }

    /// Sort key of a candidate; lower ranks first.
    ///
    /// A candidate without errors ranks last.
    pub fn key(self, candidate: &FitCandidate) -> f64 {
        let Some(error) = candidate.parameter_errors.first() else {
            return f64::INFINITY;
        };
        let log_error = error.ln();
        match self {
            LinearSorting::ByError => log_error,
            LinearSorting::ByErrorOverLength => log_error / candidate.window.span() as f64,
        }
    }
}

impl fmt::Display for LinearSorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LinearSorting {
    type Err = RheoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "by_error" => Ok(LinearSorting::ByError),
            "by_error_length" => Ok(LinearSorting::ByErrorOverLength),
            _ => Err(RheoError::UnknownSortingMethod(s.to_string())),
        }
    }
}

/// Ranking heuristic for nonlinear start indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NonlinearSorting {
    /// Ascending error of the zero-shear viscosity (parameter 0).
    ByEta0,
    /// Ascending sum of all parameter errors.
    ByAggregateError,
}

impl NonlinearSorting {
    pub fn name(self) -> &'static str {
        match self {
            NonlinearSorting::ByEta0 => "eta_0",
            NonlinearSorting::ByAggregateError => "overall",
        }
    }

    /// Sort key of a candidate; lower ranks first. A candidate without
    /// errors ranks last.
    pub fn key(self, candidate: &FitCandidate) -> f64 {
        if candidate.parameter_errors.is_empty() {
            return f64::INFINITY;
        }
        match self {
            NonlinearSorting::ByEta0 => candidate.parameter_errors[0],
            NonlinearSorting::ByAggregateError => candidate.parameter_errors.iter().sum(),
        }
    }
}

impl fmt::Display for NonlinearSorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NonlinearSorting {
    type Err = RheoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "eta_0" => Ok(NonlinearSorting::ByEta0),
            "overall" => Ok(NonlinearSorting::ByAggregateError),
            _ => Err(RheoError::UnknownSortingMethod(s.to_string())),
        }
    }
}

/// One successful fit of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitCandidate {
    pub window: Window,
    pub parameters: Vec<f64>,
    pub parameter_errors: Vec<f64>,
    pub model: ModelKind,
}

/// Which kinds of solver failure a search ran into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureTally {
    /// Overflow or iteration-limit failures.
    pub overflow: usize,
    pub domain: usize,
    /// Anything else, e.g. a start value that could not be placed in bounds.
    pub other: usize,
}

impl FailureTally {
    pub fn total(&self) -> usize {
        self.overflow + self.domain + self.other
    }

    pub fn flags(&self) -> Vec<WarningFlag> {
        let mut flags = Vec::new();
        if self.overflow > 0 {
            flags.push(WarningFlag::ParamOverflow);
        }
        if self.domain > 0 {
            flags.push(WarningFlag::DomainError);
        }
        flags
    }

    fn record(&mut self, err: &RheoError) {
        match err {
            RheoError::Fit(FitFailure::Overflow(_) | FitFailure::NoConvergence(_)) => {
                self.overflow += 1
            }
            RheoError::Fit(FitFailure::DomainError(_)) => self.domain += 1,
            _ => self.other += 1,
        }
    }
}

/// Everything a search produced, before a winner is picked.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Successful candidates, best first.
    pub ranked: Vec<FitCandidate>,
    pub failures: FailureTally,
    pub attempted: usize,
}

impl SearchOutcome {
    /// Rank 0 packaged as a [`FitResult`], or `exhausted` when nothing survived.
    pub(crate) fn into_result(
        self,
        method: Method,
        sorting: Sorting,
        exhausted: RheoError,
    ) -> Result<FitResult> {
        let flags = self.failures.flags();
        match self.ranked.into_iter().next() {
            Some(best) => {
                let provenance = Provenance::new(best.window, method, sorting).with_flags(flags);
                Ok(FitResult::new(best, provenance))
            }
            None => Err(exhausted),
        }
    }
}

/// Fit every item, in parallel if asked, keeping input order.
pub(crate) fn map_candidates<T, R, F>(items: &[T], parallel: bool, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

/// Split fit attempts into candidates and a failure tally, then rank.
pub(crate) fn collect_ranked<K>(
    attempts: Vec<(Window, Result<FitCandidate>)>,
    model: ModelKind,
    key: K,
) -> SearchOutcome
where
    K: Fn(&FitCandidate) -> f64,
{
    let attempted = attempts.len();
    let mut failures = FailureTally::default();
    let mut candidates = Vec::with_capacity(attempted);

    for (window, attempt) in attempts {
        match attempt {
            Ok(candidate) => candidates.push(candidate),
            Err(err) => {
                failures.record(&err);
                log_incident(model, window, &err);
            }
        }
    }

    rank(&mut candidates, key);
    SearchOutcome {
        ranked: candidates,
        failures,
        attempted,
    }
}

/// Stable ascending sort by `key`; equal keys keep their order.
pub fn rank<K>(candidates: &mut [FitCandidate], key: K)
where
    K: Fn(&FitCandidate) -> f64,
{
    candidates.sort_by(|a, b| key(a).total_cmp(&key(b)));
}

pub(crate) fn log_incident(model: ModelKind, window: Window, err: &RheoError) {
    let tag = match err {
        RheoError::Fit(failure) => failure.tag(),
        _ => "FitError",
    };
    tracing::warn!(
        target: "incident",
        model = model.name(),
        first = window.first,
        last = window.last,
        "{}: {}",
        tag,
        err
    );
}
