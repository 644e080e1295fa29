//! Join configuration: column pairs, tolerances, and join kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyJoinError, Result};
use crate::semantic::JoinType;

/// A scalar that broadcasts to every column pair, or one value per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// Expand to exactly `count` values.
    ///
    /// Returns `None` when a list form has the wrong length.
    pub fn expand(&self, count: usize) -> Option<Vec<T>> {
        match self {
            Self::One(value) => Some(vec![value.clone(); count]),
            Self::Many(values) if values.len() == count => Some(values.clone()),
            Self::Many(_) => None,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Self::One(_) => None,
            Self::Many(values) => Some(values.len()),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

/// One left/right column pairing and its tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPair {
    pub left_column: String,
    pub right_column: String,
    /// Fraction in (0, 1] for relative tolerance, or the type's native unit
    /// when `absolute` is set (meters for geo, seconds for datetime).
    pub accuracy: f64,
    #[serde(default)]
    pub absolute: bool,
    /// Bypass classification and force a matcher family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_type: Option<JoinType>,
}

impl ColumnPair {
    pub fn new(left_column: impl Into<String>, right_column: impl Into<String>, accuracy: f64) -> Self {
        Self {
            left_column: left_column.into(),
            right_column: right_column.into(),
            accuracy,
            absolute: false,
            join_type: None,
        }
    }

    #[must_use]
    pub fn absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }

    #[must_use]
    pub fn with_join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = Some(join_type);
        self
    }

    /// Exact matching: relative accuracy of 1.0.
    pub fn is_exact(&self) -> bool {
        !self.absolute && self.accuracy >= 1.0
    }

    fn validate(&self) -> Result<()> {
        if self.left_column.trim().is_empty() || self.right_column.trim().is_empty() {
            return Err(FuzzyJoinError::invalid("join column names must not be empty"));
        }
        if !self.accuracy.is_finite() {
            return Err(FuzzyJoinError::invalid(format!(
                "accuracy for '{}' / '{}' must be finite",
                self.left_column, self.right_column
            )));
        }
        if self.absolute {
            if self.accuracy < 0.0 {
                return Err(FuzzyJoinError::invalid(format!(
                    "absolute accuracy of {} for '{}' / '{}' must not be negative",
                    self.accuracy, self.left_column, self.right_column
                )));
            }
        } else if self.accuracy <= 0.0 || self.accuracy > 1.0 {
            return Err(FuzzyJoinError::invalid(format!(
                "accuracy of {} for '{}' / '{}' is out of range",
                self.accuracy, self.left_column, self.right_column
            )));
        }
        if self.join_type == Some(JoinType::Geo) && !self.absolute {
            return Err(FuzzyJoinError::invalid(format!(
                "geo join on '{}' / '{}' requires an absolute accuracy in meters",
                self.left_column, self.right_column
            )));
        }
        Ok(())
    }
}

/// Immutable, validated list of column pairs for one join call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinSpec {
    pairs: Vec<ColumnPair>,
}

impl JoinSpec {
    /// Build a spec from explicit pairs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when no pairs are given or any pair carries an
    /// out-of-range accuracy.
    pub fn new(pairs: Vec<ColumnPair>) -> Result<Self> {
        if pairs.is_empty() {
            return Err(FuzzyJoinError::invalid("at least one join column pair is required"));
        }
        for pair in &pairs {
            pair.validate()?;
        }
        Ok(Self { pairs })
    }

    /// Build a spec from parallel column/accuracy/absolute lists.
    ///
    /// Scalars broadcast to every pair; list forms must all have the same
    /// length as the column lists.
    pub fn from_lists(
        left_columns: &OneOrMany<String>,
        right_columns: &OneOrMany<String>,
        accuracy: &OneOrMany<f64>,
        absolute: &OneOrMany<bool>,
    ) -> Result<Self> {
        if left_columns.is_list() != right_columns.is_list() {
            return Err(FuzzyJoinError::invalid(
                "left and right join columns must both be a single column or both be lists",
            ));
        }
        let count = left_columns.len().unwrap_or(1);
        if right_columns.len().unwrap_or(1) != count {
            return Err(FuzzyJoinError::invalid(format!(
                "{} left join columns but {} right join columns",
                count,
                right_columns.len().unwrap_or(1)
            )));
        }
        let left = left_columns.expand(count).unwrap_or_default();
        let right = right_columns.expand(count).unwrap_or_default();
        let accuracies = accuracy.expand(count).ok_or_else(|| {
            FuzzyJoinError::invalid(format!(
                "the count of accuracy values ({}) does not match the {count} join column pairs",
                accuracy.len().unwrap_or(1)
            ))
        })?;
        let absolutes = absolute.expand(count).ok_or_else(|| {
            FuzzyJoinError::invalid(format!(
                "the count of absolute accuracy flags ({}) does not match the {count} join column pairs",
                absolute.len().unwrap_or(1)
            ))
        })?;

        let pairs = left
            .into_iter()
            .zip(right)
            .zip(accuracies.into_iter().zip(absolutes))
            .map(|((left_column, right_column), (accuracy, absolute))| ColumnPair {
                left_column,
                right_column,
                accuracy,
                absolute,
                join_type: None,
            })
            .collect();
        Self::new(pairs)
    }

    /// Convenience for a single pair.
    pub fn single(left_column: &str, right_column: &str, accuracy: f64, absolute: bool) -> Result<Self> {
        Self::new(vec![ColumnPair::new(left_column, right_column, accuracy).absolute(absolute)])
    }

    pub fn pairs(&self) -> &[ColumnPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Relational join kind applied to the synthetic keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Left,
    Right,
    Outer,
    Inner,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Outer => "outer",
            Self::Inner => "inner",
            Self::Cross => "cross",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinKind {
    type Err = FuzzyJoinError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "outer" | "full" => Ok(Self::Outer),
            "inner" => Ok(Self::Inner),
            "cross" => Ok(Self::Cross),
            other => Err(FuzzyJoinError::invalid(format!("unknown join kind '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one<T>(value: T) -> OneOrMany<T> {
        OneOrMany::One(value)
    }

    #[test]
    fn accuracy_out_of_range_is_rejected() {
        assert!(JoinSpec::single("a", "b", 0.0, false).is_err());
        assert!(JoinSpec::single("a", "b", 1.5, false).is_err());
        assert!(JoinSpec::single("a", "b", 1.0, false).is_ok());
        // absolute tolerances are in native units
        assert!(JoinSpec::single("a", "b", 1500.0, true).is_ok());
        assert!(JoinSpec::single("a", "b", -1.0, true).is_err());
    }

    #[test]
    fn scalars_broadcast() {
        let spec = JoinSpec::from_lists(
            &OneOrMany::Many(vec!["a".into(), "b".into()]),
            &OneOrMany::Many(vec!["x".into(), "y".into()]),
            &one(0.9),
            &one(false),
        )
        .unwrap();
        assert_eq!(spec.len(), 2);
        assert!(spec.pairs().iter().all(|p| p.accuracy == 0.9 && !p.absolute));
        assert_eq!(spec.pairs()[1].left_column, "b");
        assert_eq!(spec.pairs()[1].right_column, "y");
    }

    #[test]
    fn list_lengths_must_agree() {
        let err = JoinSpec::from_lists(
            &OneOrMany::Many(vec!["a".into(), "b".into()]),
            &OneOrMany::Many(vec!["x".into(), "y".into()]),
            &OneOrMany::Many(vec![0.9]),
            &one(false),
        )
        .unwrap_err();
        assert!(matches!(err, FuzzyJoinError::InvalidArgument(_)));

        let err = JoinSpec::from_lists(
            &OneOrMany::Many(vec!["a".into(), "b".into()]),
            &OneOrMany::Many(vec!["x".into()]),
            &one(0.9),
            &one(false),
        )
        .unwrap_err();
        assert!(matches!(err, FuzzyJoinError::InvalidArgument(_)));

        let err = JoinSpec::from_lists(
            &one("a".to_string()),
            &OneOrMany::Many(vec!["x".into()]),
            &one(0.9),
            &one(false),
        )
        .unwrap_err();
        assert!(matches!(err, FuzzyJoinError::InvalidArgument(_)));
    }

    #[test]
    fn per_pair_absolute_flags_validate_independently() {
        let spec = JoinSpec::from_lists(
            &OneOrMany::Many(vec!["pos".into(), "score".into()]),
            &OneOrMany::Many(vec!["pos".into(), "score".into()]),
            &OneOrMany::Many(vec![1000.0, 0.9]),
            &OneOrMany::Many(vec![true, false]),
        );
        assert!(spec.is_ok());

        let spec = JoinSpec::from_lists(
            &OneOrMany::Many(vec!["pos".into(), "score".into()]),
            &OneOrMany::Many(vec!["pos".into(), "score".into()]),
            &OneOrMany::Many(vec![1000.0, 0.9]),
            &OneOrMany::Many(vec![false, false]),
        );
        assert!(spec.is_err());
    }

    #[test]
    fn geo_override_requires_absolute() {
        let pair = ColumnPair::new("loc", "loc", 0.9).with_join_type(JoinType::Geo);
        assert!(JoinSpec::new(vec![pair]).is_err());
        let pair = ColumnPair::new("loc", "loc", 500.0)
            .absolute(true)
            .with_join_type(JoinType::Geo);
        assert!(JoinSpec::new(vec![pair]).is_ok());
    }

    #[test]
    fn empty_spec_is_rejected() {
        assert!(JoinSpec::new(Vec::new()).is_err());
    }

    #[test]
    fn join_kind_parses() {
        assert_eq!("INNER".parse::<JoinKind>().unwrap(), JoinKind::Inner);
        assert_eq!("full".parse::<JoinKind>().unwrap(), JoinKind::Outer);
        assert!("semi".parse::<JoinKind>().is_err());
        assert_eq!(JoinKind::default(), JoinKind::Left);
    }

    #[test]
    fn join_kind_names_round_trip() {
        for kind in ["left", "right", "outer", "inner", "cross"] {
            assert_eq!(kind.parse::<JoinKind>().unwrap().as_str(), kind);
        }
    }
}
