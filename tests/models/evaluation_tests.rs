//! Tests for model evaluation and model names

use approx::assert_relative_eq;
use ndarray::array;
use rheofit::models::{carreau, cross};
use rheofit::{ModelKind, RheoError};

fn sample_params(model: ModelKind) -> Vec<f64> {
    match model {
        ModelKind::Linear => vec![100.0, 1e-3],
        ModelKind::PowerLaw => vec![10.0, 0.5],
        ModelKind::Carreau | ModelKind::Cross => vec![1000.0, 1.0, 10.0, 0.6],
        ModelKind::CarreauYasuda => vec![1000.0, 1.0, 0.1, 2.0, 0.4],
    }
}

#[test]
fn test_plateau_and_thinning() {
    let p = [1000.0, 1.0, 10.0, 0.6];

    // Far below the break point both models sit on the plateau.
    assert_relative_eq!(carreau(1e-4, &p), 1000.0, max_relative = 1e-6);
    assert_relative_eq!(cross(1e-4, &p), 1000.0, max_relative = 2e-3);

    // At the break point Cross is exactly halfway.
    assert_relative_eq!(cross(10.0, &p), 1.0 + 999.0 / 2.0, epsilon = 1e-9);

    for model in [ModelKind::Carreau, ModelKind::Cross, ModelKind::CarreauYasuda] {
        let params = sample_params(model);
        let low = model.eval(0.01, &params).unwrap();
        let high = model.eval(1000.0, &params).unwrap();
        assert!(high < low, "{} should thin", model);
    }
}

#[test]
fn test_array_matches_scalar() {
    let x = array![0.01, 0.1, 1.0, 10.0, 100.0];
    for model in ModelKind::ALL {
        let params = sample_params(model);
        let values = model.eval_array(&x, &params).unwrap();
        for (xi, vi) in x.iter().zip(values.iter()) {
            assert_eq!(*vi, model.eval(*xi, &params).unwrap());
        }
    }
}

#[test]
fn test_arity_is_checked() {
    for model in ModelKind::ALL {
        let too_short = vec![1.0; model.parameter_count() - 1];
        let err = model.eval(1.0, &too_short).unwrap_err();
        assert!(matches!(
            err,
            RheoError::ParameterCount { expected, actual, .. }
                if expected == model.parameter_count() && actual == expected - 1
        ));

        let params = sample_params(model);
        assert!(model.eval_with_uncertainty(1.0, &params, &[0.0]).is_err());
    }
}

#[test]
fn test_negative_shear_rate_is_not_validated() {
    let value = ModelKind::PowerLaw.eval(-1.0, &[10.0, 0.5]).unwrap();
    assert!(value.is_nan());
}

#[test]
fn test_model_names() {
    for model in ModelKind::ALL {
        assert_eq!(model.name().parse::<ModelKind>().unwrap(), model);
        assert_eq!(model.parameter_names().len(), model.parameter_count());
    }
    assert_eq!(ModelKind::CarreauYasuda.name(), "Carreau-Yasuda");
    assert_eq!(ModelKind::Carreau.parameter_names(), &["eta_0", "eta_inf", "GP_b", "n"]);
    assert!(matches!(
        "Herschel-Bulkley".parse::<ModelKind>(),
        Err(RheoError::UnknownModel(_))
    ));
}
