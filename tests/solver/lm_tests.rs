//! Tests for the bounded Levenberg-Marquardt solver

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use rheofit::lm::{DecompositionMethod, LevenbergMarquardt};
use rheofit::parameters::Bounds;
use rheofit::{CurveFitter, FitFailure, ModelKind, Problem, RheoError};

use crate::test_helpers::model_series;

/// `y = a * exp(-b * x)` with the default finite-difference Jacobian.
struct Decay {
    x: Array1<f64>,
    y: Array1<f64>,
}

impl Problem for Decay {
    fn eval(&self, params: &Array1<f64>) -> rheofit::Result<Array1<f64>> {
        Ok(self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(&x, &y)| params[0] * (-params[1] * x).exp() - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }
}

fn decay() -> Decay {
    let x = Array1::linspace(0.0, 5.0, 15);
    let y = x.mapv(|x: f64| 3.0 * (-0.7 * x).exp());
    Decay { x, y }
}

#[test]
fn test_generic_problem() {
    for method in [DecompositionMethod::Auto, DecompositionMethod::Svd] {
        let result = LevenbergMarquardt::new()
            .with_decomposition_method(method)
            .minimize(&decay(), &array![1.0, 0.1], &[Bounds::unbounded(); 2])
            .unwrap();
        assert!(result.status.is_converged());
        assert_relative_eq!(result.params[0], 3.0, max_relative = 1e-6);
        assert_relative_eq!(result.params[1], 0.7, max_relative = 1e-6);
    }
}

#[test]
fn test_two_sided_bound_holds() {
    let result = LevenbergMarquardt::new()
        .minimize(
            &decay(),
            &array![1.0, 0.1],
            &[Bounds::new(0.0, 2.0).unwrap(), Bounds::unbounded()],
        )
        .unwrap();
    assert!(result.params[0] <= 2.0);
    assert_relative_eq!(result.params[0], 2.0, max_relative = 1e-3);
}

#[test]
fn test_carreau_from_explicit_guess() {
    let truth = [500.0, 2.0, 5.0, 0.7];
    let series = model_series(ModelKind::Carreau, &truth, 30);
    let fit = CurveFitter::new()
        .fit(
            ModelKind::Carreau,
            series.shear_rate().view(),
            series.viscosity().view(),
            Some(&[400.0, 1.0, 3.0, 0.5]),
            &ModelKind::Carreau.default_bounds(&Default::default()),
        )
        .unwrap();

    for (fitted, expected) in fit.params.iter().zip(truth.iter()) {
        assert_relative_eq!(*fitted, *expected, max_relative = 1e-3);
    }
    assert_eq!(fit.errors.len(), 4);
    assert!(fit.cost < 1e-6);
}

#[test]
fn test_fit_failures_are_tagged() {
    let series = model_series(ModelKind::Carreau, &[500.0, 2.0, 5.0, 0.7], 30);
    let err = CurveFitter::new()
        .with_max_iterations(1)
        .fit(
            ModelKind::Carreau,
            series.shear_rate().view(),
            series.viscosity().view(),
            None,
            &ModelKind::Carreau.default_bounds(&Default::default()),
        )
        .unwrap_err();
    assert!(err.is_fit_failure());
    assert!(matches!(err, RheoError::Fit(FitFailure::NoConvergence(_))));

    let err = CurveFitter::new()
        .fit(
            ModelKind::Carreau,
            series.shear_rate().view(),
            series.viscosity().view(),
            Some(&[1.0, 2.0]),
            &ModelKind::Carreau.default_bounds(&Default::default()),
        )
        .unwrap_err();
    assert!(matches!(err, RheoError::ParameterCount { expected: 4, actual: 2, .. }));
}

#[test]
fn test_exact_fit_without_freedom_has_infinite_errors() {
    let x = array![1.0, 2.0];
    let y = array![10.0, 12.0];
    let fit = CurveFitter::new()
        .fit(
            ModelKind::Linear,
            x.view(),
            y.view(),
            None,
            &[Bounds::unbounded(), Bounds::unbounded()],
        )
        .unwrap();

    assert_relative_eq!(fit.params[0], 8.0, epsilon = 1e-6);
    assert_relative_eq!(fit.params[1], 2.0, epsilon = 1e-6);
    assert!(fit.errors.iter().all(|e| e.is_infinite()));
}
