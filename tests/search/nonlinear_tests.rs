//! Tests for the nonlinear start-index search

use approx::assert_relative_eq;
use rheofit::{
    CurveFitter, MeasurementSeries, ModelKind, NonlinearRangeSearch, NonlinearSorting, RheoError,
    WarningFlag,
};

use crate::test_helpers::{log_rates, model_series, noisy_series};

const TRUTH: [f64; 4] = [1000.0, 1.0, 10.0, 0.6];

#[test]
fn test_recovers_exact_carreau() {
    let series = model_series(ModelKind::Carreau, &TRUTH, 40);

    for sorting in [NonlinearSorting::ByEta0, NonlinearSorting::ByAggregateError] {
        let result = NonlinearRangeSearch::new(ModelKind::Carreau, sorting)
            .with_first_point_max(3)
            .run(&series)
            .unwrap();

        for (fitted, expected) in result.parameters().iter().zip(TRUTH.iter()) {
            assert_relative_eq!(*fitted, *expected, max_relative = 1e-2);
        }
        assert_eq!(result.window().last, 39);
        assert!(result.window().first <= 3);
    }
}

#[test]
fn test_recovers_noisy_carreau() {
    let series = noisy_series(ModelKind::Carreau, &TRUTH, 40, 0.005, 42);
    let result = NonlinearRangeSearch::new(ModelKind::Carreau, NonlinearSorting::ByAggregateError)
        .run(&series)
        .unwrap();

    let p = result.parameters();
    assert_relative_eq!(p[0], TRUTH[0], max_relative = 0.02);
    assert_relative_eq!(p[2], TRUTH[2], max_relative = 0.15);
    assert_relative_eq!(p[3], TRUTH[3], max_relative = 0.1);
    assert!(result.parameter_errors().iter().all(|e| e.is_finite()));
}

#[test]
fn test_ranking_keys() {
    let series = noisy_series(ModelKind::Cross, &TRUTH, 40, 0.01, 3);
    let outcome = NonlinearRangeSearch::new(ModelKind::Cross, NonlinearSorting::ByEta0)
        .with_first_point_max(4)
        .candidates(&series);

    assert_eq!(outcome.attempted, 5);
    let keys: Vec<f64> = outcome.ranked.iter().map(|c| c.parameter_errors[0]).collect();
    assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    for candidate in &outcome.ranked {
        assert_eq!(candidate.window.last, 39);
        assert!(candidate.parameters.iter().all(|&p| p >= 0.0));
    }
}

#[test]
fn test_every_start_failing_is_no_viscosity() {
    let series = noisy_series(ModelKind::Carreau, &TRUTH, 40, 0.01, 5);
    let search = NonlinearRangeSearch::new(ModelKind::Carreau, NonlinearSorting::ByAggregateError)
        .with_first_point_max(2)
        .with_fitter(CurveFitter::new().with_max_iterations(1));

    let outcome = search.candidates(&series);
    assert!(outcome.ranked.is_empty());
    assert_eq!(outcome.failures.overflow, 3);
    assert_eq!(outcome.failures.flags(), vec![WarningFlag::ParamOverflow]);

    let err = search.run(&series).unwrap_err();
    assert!(matches!(err, RheoError::NoViscosityFound(ref model) if model == "Carreau"));
}

#[test]
fn test_domain_error_start_is_flagged() {
    // A negative leading shear rate makes Cross undefined for a fractional exponent.
    let mut pairs = vec![(-1.0, 1000.0)];
    pairs.extend(
        log_rates(39, -2.0, 3.0)
            .into_iter()
            .map(|x| (x, ModelKind::Cross.eval(x, &TRUTH).unwrap())),
    );
    let series = MeasurementSeries::from_pairs(&pairs).unwrap();
    let search = NonlinearRangeSearch::new(ModelKind::Cross, NonlinearSorting::ByAggregateError)
        .with_first_point_max(1);

    let outcome = search.candidates(&series);
    assert_eq!(outcome.attempted, 2);
    assert_eq!(outcome.failures.domain, 1);
    assert_eq!(outcome.failures.overflow, 0);
    assert_eq!(outcome.ranked.len(), 1);
    assert_eq!(outcome.failures.flags(), vec![WarningFlag::DomainError]);

    let result = search.run(&series).unwrap();
    assert_eq!(result.window().first, 1);
    assert_eq!(result.window().last, 39);
    assert_relative_eq!(result.parameters()[0], TRUTH[0], max_relative = 1e-2);
    assert_eq!(result.provenance().flags, vec![WarningFlag::DomainError]);
    assert_eq!(
        result.provenance().to_string(),
        "1;39;nonlinear_auto_Cross;overall;domain_error_during_fitting"
    );
}

#[test]
fn test_manual_fit_uses_given_window() {
    let series = model_series(ModelKind::Carreau, &TRUTH, 30);
    let result = NonlinearRangeSearch::new(ModelKind::Carreau, NonlinearSorting::ByEta0)
        .fit_window(&series, series.full_window())
        .unwrap();
    assert_eq!(result.provenance().to_string(), "0;29;nonlinear_manual_Carreau;-");
}

#[test]
fn test_parallel_matches_sequential() {
    let series = noisy_series(ModelKind::CarreauYasuda, &[1000.0, 1.0, 0.1, 2.0, 0.4], 40, 0.01, 9);
    let search = NonlinearRangeSearch::new(ModelKind::CarreauYasuda, NonlinearSorting::ByAggregateError)
        .with_first_point_max(5);

    let sequential = search.candidates(&series);
    let parallel = search.clone().with_parallel(true).candidates(&series);
    assert_eq!(sequential.ranked, parallel.ranked);
    assert_eq!(sequential.failures, parallel.failures);
}
