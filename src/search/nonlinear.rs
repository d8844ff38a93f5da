//! Nonlinear start-index search.

use crate::error::{Result, RheoError};
use crate::fitting::CurveFitter;
use crate::models::{FitLimits, ModelKind};
use crate::result::{FitResult, Method, Sorting};
use crate::series::{MeasurementSeries, Window};

use super::{collect_ranked, map_candidates, FitCandidate, NonlinearSorting, SearchOutcome};

/// Default last start index tried.
pub const FIRST_POINT_MAX: usize = 0;

/// Fits a shear-thinning model from each candidate start index to the end
/// of the series.
#[derive(Debug, Clone)]
pub struct NonlinearRangeSearch {
    model: ModelKind,
    sorting: NonlinearSorting,
    first_point_max: usize,
    limits: FitLimits,
    fitter: CurveFitter,
    parallel: bool,
}

impl NonlinearRangeSearch {
    pub fn new(model: ModelKind, sorting: NonlinearSorting) -> Self {
        Self {
            model,
            sorting,
            first_point_max: FIRST_POINT_MAX,
            limits: FitLimits::default(),
            fitter: CurveFitter::new(),
            parallel: false,
        }
    }

    /// Try start indices `0..=first_point_max`.
    pub fn with_first_point_max(mut self, first_point_max: usize) -> Self {
        self.first_point_max = first_point_max;
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

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn sorting(&self) -> NonlinearSorting {
        self.sorting
    }

    /// Windows `[start, len - 1]` that leave more points than parameters.
    pub fn windows(&self, len: usize) -> Vec<Window> {
        let min_points = self.model.parameter_count() + 1;
        (0..=self.first_point_max)
            .take_while(|&start| start + min_points <= len)
            .map(|start| Window::new(start, len - 1))
            .collect()
    }

    pub fn candidates(&self, series: &MeasurementSeries) -> SearchOutcome {
        let windows = self.windows(series.len());
        tracing::debug!(
            model = self.model.name(),
            starts = windows.len(),
            sorting = self.sorting.name(),
            "nonlinear range search"
        );

        let attempts = map_candidates(&windows, self.parallel, |&window| {
            (window, self.fit_candidate(series, window))
        });
        let sorting = self.sorting;
        collect_ranked(attempts, self.model, |c| sorting.key(c))
    }

    /// Best start index as a [`FitResult`].
    ///
    /// # Errors
    ///
    /// [`RheoError::NoViscosityFound`] when every attempt failed or the
    /// series is too short for the model.
    pub fn run(&self, series: &MeasurementSeries) -> Result<FitResult> {
        let outcome = self.candidates(series);
        if outcome.ranked.is_empty() {
            tracing::warn!(
                target: "incident",
                model = self.model.name(),
                attempted = outcome.attempted,
                "Unable to find viscosity"
            );
        }
        outcome.into_result(
            Method::NonlinearAuto(self.model),
            Sorting::Nonlinear(self.sorting),
            RheoError::NoViscosityFound(self.model.name().to_string()),
        )
    }

    /// Fit one fixed window without searching.
    pub fn fit_window(&self, series: &MeasurementSeries, window: Window) -> Result<FitResult> {
        series.window(window)?;
        let outcome = collect_ranked(
            vec![(window, self.fit_candidate(series, window))],
            self.model,
            |_| 0.0,
        );
        outcome.into_result(
            Method::NonlinearManual(self.model),
            Sorting::Manual,
            RheoError::NoViscosityFound(self.model.name().to_string()),
        )
    }

    fn fit_candidate(&self, series: &MeasurementSeries, window: Window) -> Result<FitCandidate> {
        let (x, y) = series.window(window)?;
        let bounds = self.model.default_bounds(&self.limits);
        let fit = self.fitter.fit(self.model, x, y, None, &bounds)?;

        Ok(FitCandidate {
            window,
            parameters: fit.params,
            parameter_errors: fit.errors,
            model: self.model,
        })
    }
}
