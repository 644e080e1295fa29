//! Numeric matching under absolute or relative tolerance.

use crate::matcher::{Matcher, nearest_within};

/// How far a candidate may be from the value being matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// A fixed distance in the value's own unit.
    Absolute(f64),
    /// A fraction of the matched value's magnitude: `|value| * (1 - accuracy)`.
    Relative(f64),
}

impl Tolerance {
    pub fn new(accuracy: f64, absolute: bool) -> Self {
        if absolute {
            Self::Absolute(accuracy)
        } else {
            Self::Relative(accuracy)
        }
    }

    /// The maximum accepted distance for `value`.
    pub fn for_value(&self, value: f64) -> f64 {
        match *self {
            Self::Absolute(distance) => distance,
            Self::Relative(accuracy) => value.abs() * (1.0 - accuracy),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NumericMatcher {
    tolerance: Tolerance,
}

impl NumericMatcher {
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

impl Matcher for NumericMatcher {
    type Value = f64;

    fn best_match(&self, value: &f64, candidates: &[f64]) -> Option<f64> {
        let tolerance = self.tolerance.for_value(*value);
        nearest_within(value, candidates, tolerance, |a, b| (a - b).abs()).copied()
    }
}
