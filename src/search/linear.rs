//! Linear window search.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RheoError};
use crate::fitting::CurveFitter;
use crate::models::{FitLimits, ModelKind};
use crate::result::{FitResult, Method, Sorting};
use crate::series::{MeasurementSeries, Window};

use super::{collect_ranked, map_candidates, FitCandidate, LinearSorting, SearchOutcome};

/// Smallest `last - first` a window may have.
pub const MIN_WINDOW_SPAN: usize = 2;

/// Integer arithmetic that enumerates the candidate windows.
///
/// For a series of `len` points the windows are
/// `first in [0, len / first_divisor)` and
/// `last in [first + min_span, len / last_divisor)`.
/// A `min_span` below [`MIN_WINDOW_SPAN`] is raised to it, so every window
/// covers at least three points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub first_divisor: usize,
    pub last_divisor: usize,
    pub min_span: usize,
}

impl Default for WindowBounds {
    fn default() -> Self {
        Self {
            first_divisor: 3,
            last_divisor: 2,
            min_span: 3,
        }
    }
}

impl WindowBounds {
    /// Candidate windows in iteration order (`first` outer, `last` inner).
    ///
    /// ```
    /// use rheofit::search::WindowBounds;
    ///
    /// let windows = WindowBounds::default().windows(12);
    /// assert_eq!(windows.len(), 6);
    /// assert_eq!((windows[0].first, windows[0].last), (0, 3));
    /// assert!(WindowBounds::default().windows(5).is_empty());
    /// ```
    pub fn windows(&self, len: usize) -> Vec<Window> {
        let first_end = len.checked_div(self.first_divisor).unwrap_or(0);
        let last_end = len.checked_div(self.last_divisor).unwrap_or(0).min(len);
        let min_span = self.min_span.max(MIN_WINDOW_SPAN);

        let mut windows = Vec::new();
        for first in 0..first_end {
            for last in (first + min_span)..last_end {
                windows.push(Window::new(first, last));
            }
        }
        windows
    }
}

/// Exhaustive search for the Newtonian plateau.
#[derive(Debug, Clone)]
pub struct LinearRangeSearch {
    sorting: LinearSorting,
    window_bounds: WindowBounds,
    limits: FitLimits,
    fitter: CurveFitter,
    parallel: bool,
}

impl LinearRangeSearch {
    pub fn new(sorting: LinearSorting) -> Self {
        Self {
            sorting,
            window_bounds: WindowBounds::default(),
            limits: FitLimits::default(),
            fitter: CurveFitter::new(),
            parallel: false,
        }
    }

    pub fn with_window_bounds(mut self, window_bounds: WindowBounds) -> Self {
        self.window_bounds = window_bounds;
        self
    }

    pub fn with_limits(mut self, limits: FitLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_fitter(mut self, fitter: CurveFitter) -> Self {
        self.fitter = fitter;
        self
    }

    /// Fit candidates on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn sorting(&self) -> LinearSorting {
        self.sorting
    }

    /// Fit every candidate window and rank the survivors.
    pub fn candidates(&self, series: &MeasurementSeries) -> SearchOutcome {
        let windows = self.window_bounds.windows(series.len());
        tracing::debug!(
            windows = windows.len(),
            sorting = self.sorting.name(),
            "linear range search"
        );

        let attempts = map_candidates(&windows, self.parallel, |&window| {
            (window, self.fit_candidate(series, window))
        });
        let sorting = self.sorting;
        collect_ranked(attempts, ModelKind::Linear, |c| sorting.key(c))
    }

    /// Best window as a [`FitResult`].
    ///
    /// # Errors
    ///
    /// [`RheoError::NoFit`] when no window could be fitted, including the
    /// case where the series is too short to have any window.
    pub fn run(&self, series: &MeasurementSeries) -> Result<FitResult> {
        let outcome = self.candidates(series);
        if outcome.ranked.is_empty() {
            tracing::warn!(
                target: "incident",
                attempted = outcome.attempted,
                "Unable to fit linear model"
            );
        }
        outcome.into_result(Method::LinearAuto, Sorting::Linear(self.sorting), RheoError::NoFit)
    }

    /// Fit one fixed window without searching.
    ///
    /// A failed fit is logged and reported as [`RheoError::NoFit`].
    pub fn fit_window(&self, series: &MeasurementSeries, window: Window) -> Result<FitResult> {
        series.window(window)?;
        let outcome = collect_ranked(
            vec![(window, self.fit_candidate(series, window))],
            ModelKind::Linear,
            |_| 0.0,
        );
        outcome.into_result(Method::LinearManual, Sorting::Manual, RheoError::NoFit)
    }

    fn fit_candidate(&self, series: &MeasurementSeries, window: Window) -> Result<FitCandidate> {
        let (x, y) = series.window(window)?;
        let bounds = ModelKind::Linear.default_bounds(&self.limits);
        let fit = self.fitter.fit(ModelKind::Linear, x, y, None, &bounds)?;

        Ok(FitCandidate {
            window,
            parameters: fit.params,
            parameter_errors: fit.errors,
            model: ModelKind::Linear,
        })
    }
}
