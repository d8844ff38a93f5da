//! Box constraints on fitted parameters.
//!
//! The solver works on unbounded internal values. [`BoundsTransform`] maps
//! them onto the bounded external values with the Minuit transformations:
//!
//! * two-sided: `min + (sin(u) + 1) * (max - min) / 2`
//! * lower only: `min - 1 + sqrt(u^2 + 1)`
//! * upper only: `max + 1 - sqrt(u^2 + 1)`

use crate::error::{Result, RheoError};

/// Fraction of the feasible range a start value is kept away from a bound.
const INTERIOR_FRACTION: f64 = 1e-3;

/// Closed interval a parameter must stay in. Infinite ends are unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Bounds {
    /// Create bounds, rejecting `min > max` and NaN ends.
    ///
    /// ```
    /// use rheofit::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 1e7).unwrap();
    /// assert!(bounds.contains(100.0));
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(RheoError::InvalidBounds(format!(
                "min ({}) must not exceed max ({})",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn min_only(min: f64) -> Self {
        Self {
            min,
            max: f64::INFINITY,
        }
    }

    pub fn max_only(max: f64) -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Move a start value strictly inside the bounds.
    ///
    /// The transformations have a zero derivative exactly on a bound, which
    /// would pin the parameter there for the whole fit. Values already in the
    /// interior are returned unchanged.
    pub fn interior_start(&self, value: f64) -> f64 {
        let value = self.clamp(value);
        match (self.has_lower_bound(), self.has_upper_bound()) {
            (true, true) => {
                let margin = (self.max - self.min) * INTERIOR_FRACTION;
                if margin == 0.0 {
                    value
                } else {
                    value.clamp(self.min + margin, self.max - margin)
                }
            }
            (true, false) => {
                let margin = self.min.abs().max(1.0) * INTERIOR_FRACTION;
                value.max(self.min + margin)
            }
            (false, true) => {
                let margin = self.max.abs().max(1.0) * INTERIOR_FRACTION;
                value.min(self.max - margin)
            }
            (false, false) => value,
        }
    }
}

/// Maps between internal (unbounded) and external (bounded) parameter values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// External value for an internal one. Always inside the bounds.
    pub fn to_external(&self, internal: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (true, true) => b.min + (internal.sin() + 1.0) * (b.max - b.min) / 2.0,
            (true, false) => b.min - 1.0 + (internal * internal + 1.0).sqrt(),
            (false, true) => b.max + 1.0 - (internal * internal + 1.0).sqrt(),
            (false, false) => internal,
        }
    }

    /// Internal value for an external one.
    ///
    /// Fails for non-finite values and values outside the bounds.
    pub fn to_internal(&self, external: f64) -> Result<f64> {
        let b = &self.bounds;
        if !external.is_finite() {
            return Err(RheoError::InvalidBounds(format!(
                "start value {} is not finite",
                external
            )));
        }
        if !b.contains(external) {
            return Err(RheoError::InvalidBounds(format!(
                "start value {} is outside [{}, {}]",
                external, b.min, b.max
            )));
        }

        let internal = match (b.has_lower_bound(), b.has_upper_bound()) {
            (true, true) => {
                let scaled = 2.0 * (external - b.min) / (b.max - b.min) - 1.0;
                scaled.clamp(-1.0, 1.0).asin()
            }
            (true, false) => ((external - b.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((b.max - external + 1.0).powi(2) - 1.0).sqrt(),
            (false, false) => external,
        };
        Ok(internal)
    }

    /// `d external / d internal` at an internal value.
    pub fn external_derivative(&self, internal: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (true, true) => (b.max - b.min) * internal.cos() / 2.0,
            (true, false) => internal / (internal * internal + 1.0).sqrt(),
            (false, true) => -internal / (internal * internal + 1.0).sqrt(),
            (false, false) => 1.0,
        }
    }
}
