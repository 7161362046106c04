//! Half-open numeric ranges.
//!
//! Categories describe their sample values with a half-open `[min, max)`
//! range, and operation derivation policies transform those ranges with
//! the interval arithmetic below. Derived ranges are approximate bounds;
//! endpoint openness follows plain min/max arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open range `[min, max)` over f64.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: f64,
    pub max: f64,
}

impl NumberRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range holding no values (also true for NaN endpoints).
    pub fn is_empty(&self) -> bool {
        !(self.min < self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }

    pub fn intersects(&self, other: &NumberRange) -> bool {
        self.min < other.max && other.min < self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Shift both endpoints by a constant.
    pub fn shift(&self, delta: f64) -> NumberRange {
        Self::new(self.min + delta, self.max + delta)
    }

    /// Scale both endpoints, flipping them when the factor is negative.
    pub fn scale(&self, factor: f64) -> NumberRange {
        let a = self.min * factor;
        let b = self.max * factor;
        Self::new(a.min(b), a.max(b))
    }

    /// Sum of two intervals.
    pub fn add(&self, other: &NumberRange) -> NumberRange {
        Self::new(self.min + other.min, self.max + other.max)
    }

    /// Difference of two intervals.
    pub fn subtract(&self, other: &NumberRange) -> NumberRange {
        Self::new(self.min - other.max, self.max - other.min)
    }

    /// Interval product over all endpoint combinations.
    pub fn multiply(&self, other: &NumberRange) -> NumberRange {
        let products = [
            self.min * other.min,
            self.min * other.max,
            self.max * other.min,
            self.max * other.max,
        ];
        let mut min = products[0];
        let mut max = products[0];
        for &p in &products[1..] {
            min = min.min(p);
            max = max.max(p);
        }
        Self::new(min, max)
    }

    pub fn negate(&self) -> NumberRange {
        Self::new(-self.max, -self.min)
    }

    /// Range of `|x|` over this interval.
    pub fn abs(&self) -> NumberRange {
        if self.min >= 0.0 {
            *self
        } else if self.max <= 0.0 {
            self.negate()
        } else {
            Self::new(0.0, self.max.max(-self.min))
        }
    }

    /// Range of `1/x`. Intervals containing zero have unbounded
    /// reciprocals.
    pub fn reciprocal(&self) -> NumberRange {
        if self.contains(0.0) {
            return Self::new(f64::NEG_INFINITY, f64::INFINITY);
        }
        if self.max == 0.0 {
            // Values approach zero from below.
            return Self::new(f64::NEG_INFINITY, 1.0 / self.min);
        }
        let a = 1.0 / self.min;
        let b = 1.0 / self.max;
        Self::new(a.min(b), a.max(b))
    }

    /// Range of `ln(x)`. Nonpositive parts of the interval map to
    /// negative infinity.
    pub fn ln(&self) -> NumberRange {
        let lo = if self.min > 0.0 {
            self.min.ln()
        } else {
            f64::NEG_INFINITY
        };
        let hi = if self.max > 0.0 {
            self.max.ln()
        } else {
            f64::NEG_INFINITY
        };
        Self::new(lo, hi)
    }

    /// Range of `e^x`.
    pub fn exp(&self) -> NumberRange {
        Self::new(self.min.exp(), self.max.exp())
    }

    /// Smallest range containing both.
    pub fn union(&self, other: &NumberRange) -> NumberRange {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Range of `min(x, y)` with x and y drawn from the two intervals.
    pub fn elementwise_min(&self, other: &NumberRange) -> NumberRange {
        Self::new(self.min.min(other.min), self.max.min(other.max))
    }

    /// Range of `max(x, y)` with x and y drawn from the two intervals.
    pub fn elementwise_max(&self, other: &NumberRange) -> NumberRange {
        Self::new(self.min.max(other.min), self.max.max(other.max))
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.min, self.max)
    }
}
