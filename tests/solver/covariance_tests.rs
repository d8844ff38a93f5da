//! Tests for covariance-derived standard errors

use approx::assert_relative_eq;
use ndarray::{arr2, array};
use rheofit::parameters::Bounds;
use rheofit::uncertainty::{calculate_correlation, calculate_covariance, UncertaintyCalculator};
use rheofit::{CurveFitter, ModelKind};

#[test]
fn test_linear_errors_match_closed_form() {
    let x = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let y = array![2.1, 3.9, 6.2, 7.8, 10.1, 12.0];
    let n = x.len() as f64;

    let fit = CurveFitter::new()
        .fit(ModelKind::Linear, x.view(), y.view(), None, &[Bounds::unbounded(); 2])
        .unwrap();

    let mean_x = x.mean().unwrap();
    let sxx: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    let s2 = fit.cost / (n - 2.0);

    assert_relative_eq!(fit.errors[1], (s2 / sxx).sqrt(), max_relative = 1e-6);
    assert_relative_eq!(
        fit.errors[0],
        (s2 * (1.0 / n + mean_x * mean_x / sxx)).sqrt(),
        max_relative = 1e-6
    );
}

#[test]
fn test_degrees_of_freedom() {
    let calc = UncertaintyCalculator::new(10, 4, 12.0);
    assert_eq!(calc.nfree, 6);
    assert_relative_eq!(calc.redchi, 2.0);

    let calc = UncertaintyCalculator::new(3, 4, 0.0);
    assert_eq!(calc.nfree, 0);
    assert!(calc.redchi.is_infinite());
}

#[test]
fn test_rank_deficient_jacobian() {
    let jacobian = arr2(&[[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]]);
    let covar = calculate_covariance(&jacobian, 1.0);
    assert!(covar.iter().all(|v| v.is_infinite()));

    let errors = UncertaintyCalculator::new(3, 2, 1.0).standard_errors(&jacobian);
    assert!(errors.iter().all(|e| e.is_infinite()));
}

#[test]
fn test_correlation_of_well_posed_fit() {
    let jacobian = arr2(&[[1.0, 1.0], [1.0, 2.0], [1.0, 3.0], [1.0, 4.0]]);
    let covar = calculate_covariance(&jacobian, 0.5);
    let corr = calculate_correlation(&covar);

    assert_relative_eq!(corr[[0, 0]], 1.0, epsilon = 1e-12);
    assert_relative_eq!(corr[[1, 1]], 1.0, epsilon = 1e-12);
    assert!(corr[[0, 1]] < 0.0);
    assert_relative_eq!(corr[[0, 1]], corr[[1, 0]], epsilon = 1e-12);
}
