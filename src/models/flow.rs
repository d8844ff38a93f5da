//! Flow-curve formulas and starting-point heuristics.
//!
//! Parameter order always matches [`ModelKind::parameter_names`](super::ModelKind::parameter_names).

use ndarray::{ArrayBase, Data, Ix1};

use super::scalar::Real;

/// Linear: `eta = a + b * x`.
pub fn linear<T: Real>(x: f64, p: &[T]) -> T {
    p[0] + p[1] * T::constant(x)
}

/// Power law: `eta = k * x^(n - 1)`.
pub fn power_law<T: Real>(x: f64, p: &[T]) -> T {
    p[0] * T::constant(x).powf(p[1] - T::constant(1.0))
}

/// Cross: `eta = eta_inf + (eta_0 - eta_inf) / (1 + (x / GP_b)^n)`.
pub fn cross<T: Real>(x: f64, p: &[T]) -> T {
    let one = T::constant(1.0);
    p[1] + (p[0] - p[1]) / (one + (T::constant(x) / p[2]).powf(p[3]))
}

/// Carreau: `eta = eta_inf + (eta_0 - eta_inf) / (1 + (x / GP_b)^2)^(n / 2)`.
pub fn carreau<T: Real>(x: f64, p: &[T]) -> T {
    let one = T::constant(1.0);
    let ratio = T::constant(x) / p[2];
    p[1] + (p[0] - p[1]) / (one + ratio * ratio).powf(p[3] / T::constant(2.0))
}

/// Carreau-Yasuda: `eta = eta_inf + (eta_0 - eta_inf) * (1 + (lambda * x)^a)^((n - 1) / a)`.
pub fn carreau_yasuda<T: Real>(x: f64, p: &[T]) -> T {
    let one = T::constant(1.0);
    p[1] + (p[0] - p[1]) * (one + (p[2] * T::constant(x)).powf(p[3])).powf((p[4] - one) / p[3])
}

/// Least-squares slope of `ln y` against `ln x`, skipping non-positive points.
pub(crate) fn log_log_slope<S: Data<Elem = f64>>(
    x: &ArrayBase<S, Ix1>,
    y: &ArrayBase<S, Ix1>,
) -> Option<(f64, f64)> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|&(&xi, &yi)| xi > 0.0 && yi > 0.0)
        .map(|(&xi, &yi)| (xi.ln(), yi.ln()))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = pairs.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    if sxx <= 0.0 {
        return None;
    }
    let sxy: f64 = pairs.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();

    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// Plateau, high-shear level, break point and tail slope of a flow curve.
pub(crate) struct CurveShape {
    pub plateau: f64,
    pub floor: f64,
    pub break_rate: f64,
    pub tail_slope: f64,
}

pub(crate) fn curve_shape<S: Data<Elem = f64>>(
    x: &ArrayBase<S, Ix1>,
    y: &ArrayBase<S, Ix1>,
) -> CurveShape {
    let n = y.len();
    let head = n.min(3);
    let plateau = y.iter().take(head).cloned().fold(f64::MIN, f64::max);
    let min_y = y.iter().cloned().fold(f64::INFINITY, f64::min);
    let floor = if min_y > 0.0 { min_y * 0.1 } else { 1e-6 };

    let break_rate = x
        .iter()
        .zip(y.iter())
        .find(|&(_, &yi)| yi <= plateau / 2.0)
        .map(|(&xi, _)| xi)
        .unwrap_or_else(|| {
            let lo = x.iter().cloned().fold(f64::INFINITY, f64::min).max(1e-12);
            let hi = x.iter().cloned().fold(f64::MIN, f64::max).max(lo);
            (lo * hi).sqrt()
        });

    let tail_start = n - (n / 3).max(2).min(n);
    let tail_x = x.slice(ndarray::s![tail_start..]);
    let tail_y = y.slice(ndarray::s![tail_start..]);
    let tail_slope = log_log_slope(&tail_x, &tail_y)
        .map(|(slope, _)| slope)
        .unwrap_or(-0.5);

    CurveShape {
        plateau,
        floor,
        break_rate,
        tail_slope,
    }
}
