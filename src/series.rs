//! Measurement series: the `(shear rate, viscosity)` pairs of one flow curve.

use ndarray::{s, Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RheoError};

/// An inclusive index window `[first, last]` into a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub first: usize,
    pub last: usize,
}

impl Window {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// Number of points covered; 0 for an inverted window.
    pub fn point_count(&self) -> usize {
        if self.last < self.first {
            0
        } else {
            self.span() + 1
        }
    }

    /// `last - first`, the divisor used by the over-length ranking.
    pub fn span(&self) -> usize {
        self.last.saturating_sub(self.first)
    }
}

/// Ordered shear rate / viscosity pairs.
///
/// The series is immutable once built; fits borrow windows of it.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSeries {
    shear_rate: Array1<f64>,
    viscosity: Array1<f64>,
}

impl MeasurementSeries {
    /// Build a series from two columns of equal length.
    pub fn new(shear_rate: Vec<f64>, viscosity: Vec<f64>) -> Result<Self> {
        if shear_rate.len() != viscosity.len() {
            return Err(RheoError::LengthMismatch {
                shear_rate: shear_rate.len(),
                viscosity: viscosity.len(),
            });
        }
        if shear_rate.is_empty() {
            return Err(RheoError::EmptySeries);
        }

        Ok(Self {
            shear_rate: Array1::from_vec(shear_rate),
            viscosity: Array1::from_vec(viscosity),
        })
    }

    /// Build a series from `(shear_rate, viscosity)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        let (x, y): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
        Self::new(x, y)
    }

    pub fn len(&self) -> usize {
        self.shear_rate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shear_rate.is_empty()
    }

    pub fn shear_rate(&self) -> &Array1<f64> {
        &self.shear_rate
    }

    pub fn viscosity(&self) -> &Array1<f64> {
        &self.viscosity
    }

    /// Window covering every point.
    pub fn full_window(&self) -> Window {
        Window::new(0, self.len() - 1)
    }

    /// Borrow the points of an inclusive window.
    pub fn window(&self, window: Window) -> Result<(ArrayView1<'_, f64>, ArrayView1<'_, f64>)> {
        if window.first > window.last || window.last >= self.len() {
            return Err(RheoError::InvalidWindow {
                first: window.first,
                last: window.last,
                len: self.len(),
            });
        }

        let range = s![window.first..=window.last];
        Ok((self.shear_rate.slice(range), self.viscosity.slice(range)))
    }
}
