//! Tests for the linear window search

use approx::assert_relative_eq;
use rheofit::search::{rank, WindowBounds};
use rheofit::{
    FitCandidate, LinearRangeSearch, LinearSorting, MeasurementSeries, ModelKind, RheoError, Window,
};

use crate::test_helpers::noisy_series;

fn five_points() -> MeasurementSeries {
    MeasurementSeries::from_pairs(&[(1.0, 100.0), (2.0, 100.0), (3.0, 99.0), (4.0, 101.0), (5.0, 100.0)])
        .unwrap()
}

#[test]
fn test_constant_series_under_both_policies() {
    let pairs: Vec<(f64, f64)> = (0..30).map(|i| (0.01 * 1.3f64.powi(i), 250.0)).collect();
    let series = MeasurementSeries::from_pairs(&pairs).unwrap();

    for sorting in [LinearSorting::ByError, LinearSorting::ByErrorOverLength] {
        let result = LinearRangeSearch::new(sorting).run(&series).unwrap();
        let (eta_0, error) = result.viscosity();
        assert_relative_eq!(eta_0, 250.0, max_relative = 1e-6);
        assert!(error < 1e-3, "{} gave error {}", sorting, error);
        assert!(result.window().point_count() >= 4);
    }
}

#[test]
fn test_five_point_series_has_no_window() {
    // 5 / 3 = 1 and 5 / 2 = 2: last would range over [3, 2), which is empty.
    assert!(WindowBounds::default().windows(5).is_empty());

    for sorting in [LinearSorting::ByError, LinearSorting::ByErrorOverLength] {
        let err = LinearRangeSearch::new(sorting).run(&five_points()).unwrap_err();
        assert!(matches!(err, RheoError::NoFit));
        assert!(err.is_search_exhaustion());
    }
}

#[test]
fn test_five_point_series_with_whole_range() {
    let bounds = WindowBounds {
        last_divisor: 1,
        ..WindowBounds::default()
    };

    for sorting in [LinearSorting::ByError, LinearSorting::ByErrorOverLength] {
        let result = LinearRangeSearch::new(sorting)
            .with_window_bounds(bounds)
            .run(&five_points())
            .unwrap();
        assert!(result.window() == Window::new(0, 3) || result.window() == Window::new(0, 4));
        assert_relative_eq!(result.viscosity().0, 100.0, max_relative = 1e-2);
        assert!(result.parameters()[1] <= 1e-4);
    }
}

#[test]
fn test_longer_window_wins_equal_error() {
    let candidate = |last: usize| FitCandidate {
        window: Window::new(0, last),
        parameters: vec![100.0, 0.0],
        parameter_errors: vec![4.0, 0.0],
        model: ModelKind::Linear,
    };
    let mut candidates = vec![candidate(3), candidate(5), candidate(4)];
    rank(&mut candidates, |c| LinearSorting::ByErrorOverLength.key(c));

    let order: Vec<usize> = candidates.iter().map(|c| c.window.last).collect();
    assert_eq!(order, vec![5, 4, 3]);

    // ByError sees a tie and keeps iteration order.
    let mut candidates = vec![candidate(3), candidate(5), candidate(4)];
    rank(&mut candidates, |c| LinearSorting::ByError.key(c));
    let order: Vec<usize> = candidates.iter().map(|c| c.window.last).collect();
    assert_eq!(order, vec![3, 5, 4]);
}

#[test]
fn test_parallel_matches_sequential() {
    let series = noisy_series(ModelKind::Linear, &[80.0, 0.0], 36, 0.02, 7);

    for sorting in [LinearSorting::ByError, LinearSorting::ByErrorOverLength] {
        let sequential = LinearRangeSearch::new(sorting).candidates(&series);
        let parallel = LinearRangeSearch::new(sorting)
            .with_parallel(true)
            .candidates(&series);

        assert_eq!(sequential.attempted, parallel.attempted);
        assert_eq!(sequential.ranked, parallel.ranked);
        assert_eq!(sequential.failures, parallel.failures);
    }
}

#[test]
fn test_candidates_respect_bounds() {
    let series = noisy_series(ModelKind::Linear, &[80.0, 0.0], 24, 0.05, 11);
    let outcome = LinearRangeSearch::new(LinearSorting::ByError).candidates(&series);

    assert_eq!(outcome.attempted, WindowBounds::default().windows(24).len());
    for candidate in &outcome.ranked {
        assert!(candidate.parameters[0] >= 0.0 && candidate.parameters[0] <= 1e7);
        assert!(candidate.parameters[1] >= 0.0 && candidate.parameters[1] <= 1e-4);
        assert!(candidate.window.span() >= 3);
        assert_eq!(candidate.parameter_errors.len(), 2);
    }
}
