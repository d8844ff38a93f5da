//! Tests for first-order uncertainty propagation

use approx::assert_relative_eq;
use ndarray::array;
use rheofit::ModelKind;

fn sample_params(model: ModelKind) -> Vec<f64> {
    match model {
        ModelKind::Linear => vec![100.0, 1e-3],
        ModelKind::PowerLaw => vec![10.0, 0.5],
        ModelKind::Carreau | ModelKind::Cross => vec![1000.0, 1.0, 10.0, 0.6],
        ModelKind::CarreauYasuda => vec![1000.0, 1.0, 0.1, 2.0, 0.4],
    }
}

#[test]
fn test_zero_errors_give_nominal_values() {
    for model in ModelKind::ALL {
        let params = sample_params(model);
        let zeros = vec![0.0; params.len()];
        for x in [0.01, 0.5, 3.0, 42.0, 1000.0] {
            let nominal = model.eval(x, &params).unwrap();
            let (value, error) = model.eval_with_uncertainty(x, &params, &zeros).unwrap();
            assert_eq!(value, nominal, "{} at {}", model, x);
            assert_eq!(error, 0.0, "{} at {}", model, x);
        }
    }
}

#[test]
fn test_linear_propagation_is_exact() {
    let (value, error) = ModelKind::Linear
        .eval_with_uncertainty(10.0, &[100.0, 2.0], &[3.0, 0.4])
        .unwrap();
    assert_relative_eq!(value, 120.0, epsilon = 1e-12);
    assert_relative_eq!(error, (9.0f64 + 16.0).sqrt(), epsilon = 1e-12);
}

#[test]
fn test_propagation_matches_finite_differences() {
    let x = 7.0;
    for model in [ModelKind::PowerLaw, ModelKind::Carreau, ModelKind::Cross, ModelKind::CarreauYasuda] {
        let params = sample_params(model);
        let errors: Vec<f64> = params.iter().map(|p| p.abs() * 0.01).collect();

        let mut expected = 0.0;
        for i in 0..params.len() {
            let h = params[i].abs() * 1e-6;
            let mut up = params.clone();
            let mut down = params.clone();
            up[i] += h;
            down[i] -= h;
            let derivative =
                (model.eval(x, &up).unwrap() - model.eval(x, &down).unwrap()) / (2.0 * h);
            expected += (derivative * errors[i]).powi(2);
        }

        let (_, error) = model.eval_with_uncertainty(x, &params, &errors).unwrap();
        assert_relative_eq!(error, expected.sqrt(), max_relative = 1e-5);
    }
}

#[test]
fn test_vectorised_propagation() {
    let x = array![0.1, 1.0, 10.0];
    let params = sample_params(ModelKind::Carreau);
    let errors = [10.0, 0.1, 0.5, 0.01];

    let (values, std_devs) = ModelKind::Carreau
        .eval_array_with_uncertainty(&x, &params, &errors)
        .unwrap();
    for i in 0..x.len() {
        let (value, error) = ModelKind::Carreau
            .eval_with_uncertainty(x[i], &params, &errors)
            .unwrap();
        assert_eq!(values[i], value);
        assert_eq!(std_devs[i], error);
    }
}
