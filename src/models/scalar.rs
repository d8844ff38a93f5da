//! Scalar types the flow models are evaluated over.
//!
//! Every model formula is written once against [`Real`]. Evaluated with `f64`
//! it is the plain model; evaluated with [`Uncertain`] it carries first-order
//! derivatives with respect to each parameter, which gives both the
//! propagated standard error and the model Jacobian.

use std::ops::{Add, Div, Mul, Sub};

/// Largest parameter count of any supported model (Carreau-Yasuda).
pub const MAX_PARAMS: usize = 5;

/// Arithmetic needed by the model formulas.
pub trait Real:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> + Div<Output = Self>
{
    /// A value with no uncertainty.
    fn constant(value: f64) -> Self;

    /// `self` raised to `exponent`.
    fn powf(self, exponent: Self) -> Self;

    /// Nominal value.
    fn value(self) -> f64;
}

impl Real for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }

    fn value(self) -> f64 {
        self
    }
}

/// A value together with its linear sensitivity to each fitted parameter.
///
/// A parameter `p_i ± σ_i` is represented as `p_i + σ_i z_i` for independent
/// unit variables `z_i`; `derivatives[i]` holds the derivative with respect
/// to `z_i`. The propagated standard deviation is the Euclidean norm of the
/// derivative vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uncertain {
    value: f64,
    derivatives: [f64; MAX_PARAMS],
}

impl Uncertain {
    /// Parameter `index` with nominal `value` and standard error `std_dev`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= MAX_PARAMS`.
    pub fn variable(index: usize, value: f64, std_dev: f64) -> Self {
        let mut derivatives = [0.0; MAX_PARAMS];
        derivatives[index] = std_dev;
        Self { value, derivatives }
    }

    /// Propagated standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.derivatives.iter().map(|d| d * d).sum::<f64>().sqrt()
    }

    /// Derivative with respect to parameter `index`.
    pub fn derivative(&self, index: usize) -> f64 {
        self.derivatives[index]
    }

    fn is_exact(&self) -> bool {
        self.derivatives.iter().all(|&d| d == 0.0)
    }

    fn combine(value: f64, a: &Self, da: f64, b: &Self, db: f64) -> Self {
        let mut derivatives = [0.0; MAX_PARAMS];
        for (i, d) in derivatives.iter_mut().enumerate() {
            *d = da * a.derivatives[i] + db * b.derivatives[i];
        }
        Self { value, derivatives }
    }
}

impl Add for Uncertain {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::combine(self.value + rhs.value, &self, 1.0, &rhs, 1.0)
    }
}

impl Sub for Uncertain {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::combine(self.value - rhs.value, &self, 1.0, &rhs, -1.0)
    }
}

impl Mul for Uncertain {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::combine(self.value * rhs.value, &self, rhs.value, &rhs, self.value)
    }
}

impl Div for Uncertain {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let value = self.value / rhs.value;
        Self::combine(value, &self, 1.0 / rhs.value, &rhs, -value / rhs.value)
    }
}

impl Real for Uncertain {
    fn constant(value: f64) -> Self {
        Self {
            value,
            derivatives: [0.0; MAX_PARAMS],
        }
    }

    fn powf(self, exponent: Self) -> Self {
        let value = self.value.powf(exponent.value);

        // Partial derivatives are only formed for operands that actually vary,
        // so an exact base of 0 or an exact exponent never injects NaN.
        let d_base = if self.is_exact() {
            0.0
        } else {
            exponent.value * self.value.powf(exponent.value - 1.0)
        };
        let d_exponent = if exponent.is_exact() {
            0.0
        } else {
            value * self.value.ln()
        };

        Self::combine(value, &self, d_base, &exponent, d_exponent)
    }

    fn value(self) -> f64 {
        self.value
    }
}
