//! Composite key building.
//!
//! Every column pair contributes one or more synthetic key columns to each
//! side. Left keys hold the matched right-hand value, right keys hold the
//! right values in the same representation, so the equi-join on all of them
//! pairs rows whose every configured column matched.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, NaiveDateTime};
use fjoin_common::{any_to_f64, any_to_key_string, any_to_vector, column_values};
use fjoin_match::{
    DatetimeMatcher, GeoMatcher, GeoPoint, NumericMatcher, StringMatcher, Tolerance,
    candidate_set, common_width, match_points, match_values, match_vectors, parse_timestamp,
    point_count, resolve_join_type,
};
use fjoin_model::{ColumnPair, JoinSpec, JoinType, Result, Side, Table};
use polars::prelude::{AnyValue, Column, DataType, NamedFrom, Series, TimeUnit};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::options::JoinOptions;

const LEFT_KEY_PREFIX: &str = "lefty_";
const RIGHT_KEY_PREFIX: &str = "righty_";

/// A column pair with its resolved join type.
#[derive(Debug, Clone, PartialEq)]
pub struct PairPlan {
    pub index: usize,
    pub pair: ColumnPair,
    pub join_type: JoinType,
    /// Values per cell for vector and geo pairs, 0 when no cell on either
    /// side is readable. Always 0 for scalar pairs.
    pub width: usize,
}

impl PairPlan {
    fn key_name(&self, side: Side, suffix: &str) -> String {
        let prefix = match side {
            Side::Left => LEFT_KEY_PREFIX,
            Side::Right => RIGHT_KEY_PREFIX,
        };
        format!("{prefix}{}{}{suffix}", self.join_type.as_str(), self.index)
    }
}

/// Check every pair and resolve its join type before any matching starts.
///
/// Vector and geo pairs also settle their width here, so a width mismatch
/// or an odd coordinate count fails the join before any pair is matched.
pub fn plan(left: &Table, right: &Table, spec: &JoinSpec) -> Result<Vec<PairPlan>> {
    spec.pairs()
        .iter()
        .enumerate()
        .map(|(index, pair)| {
            left.require_column(Side::Left, &pair.left_column)?;
            right.require_column(Side::Right, &pair.right_column)?;
            let join_type = resolve_join_type(
                pair,
                &left.semantic_types(&pair.left_column),
                &right.semantic_types(&pair.right_column),
            )?;
            let width = match join_type {
                JoinType::Vector => pair_width(left, right, pair)?,
                JoinType::Geo => {
                    GeoMatcher::new(pair.accuracy, pair.absolute)?;
                    let width = pair_width(left, right, pair)?;
                    point_count(width)?;
                    width
                }
                _ => 0,
            };
            Ok(PairPlan {
                index,
                pair: pair.clone(),
                join_type,
                width,
            })
        })
        .collect()
}

/// Length of the first readable vector in a column.
fn first_vector_width(column: &Column) -> Option<usize> {
    (0..column.len()).find_map(|row| {
        column
            .get(row)
            .ok()
            .and_then(any_to_vector)
            .map(|v| v.len())
    })
}

fn pair_width(left: &Table, right: &Table, pair: &ColumnPair) -> Result<usize> {
    common_width(
        &pair.left_column,
        first_vector_width(left.data.column(&pair.left_column)?),
        &pair.right_column,
        first_vector_width(right.data.column(&pair.right_column)?),
    )
}

/// Matching statistics for one column pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub left_column: String,
    pub right_column: String,
    pub join_type: JoinType,
    /// Synthetic key columns contributed to each side.
    pub key_columns: usize,
    /// Distinct non-null left values; non-null rows for vector and geo pairs.
    pub left_values: usize,
    /// How many of `left_values` found a match.
    pub matched: usize,
    /// Non-null cells on either side that could not be read as the pair's type.
    pub coercion_failures: usize,
}

impl PairReport {
    fn unmatched(plan: &PairPlan) -> Self {
        Self {
            left_column: plan.pair.left_column.clone(),
            right_column: plan.pair.right_column.clone(),
            join_type: plan.join_type,
            key_columns: 0,
            left_values: 0,
            matched: 0,
            coercion_failures: 0,
        }
    }
}

/// Synthetic key columns for one pair.
#[derive(Debug, Clone)]
pub struct PairKeys {
    pub left: Vec<Series>,
    pub right: Vec<Series>,
    pub report: PairReport,
}

/// The composite key: synthetic columns of every pair, in pair order.
#[derive(Debug, Clone, Default)]
pub struct SyntheticKeys {
    pub pairs: Vec<PairKeys>,
}

impl SyntheticKeys {
    /// Reports without key columns, for joins that skip matching.
    pub fn unmatched(plans: &[PairPlan]) -> Self {
        Self {
            pairs: plans
                .iter()
                .map(|plan| PairKeys {
                    left: Vec::new(),
                    right: Vec::new(),
                    report: PairReport::unmatched(plan),
                })
                .collect(),
        }
    }

    pub fn left_columns(&self) -> impl Iterator<Item = &Series> {
        self.pairs.iter().flat_map(|p| p.left.iter())
    }

    pub fn right_columns(&self) -> impl Iterator<Item = &Series> {
        self.pairs.iter().flat_map(|p| p.right.iter())
    }

    pub fn left_names(&self) -> Vec<String> {
        self.left_columns().map(|s| s.name().to_string()).collect()
    }

    pub fn right_names(&self) -> Vec<String> {
        self.right_columns().map(|s| s.name().to_string()).collect()
    }

    pub fn reports(&self) -> Vec<PairReport> {
        self.pairs.iter().map(|p| p.report.clone()).collect()
    }
}

/// Run the matcher of every planned pair and build the composite key.
pub fn build_keys(
    left: &Table,
    right: &Table,
    plans: &[PairPlan],
    options: &JoinOptions,
) -> Result<SyntheticKeys> {
    let start = Instant::now();
    let pairs = if options.parallel {
        plans
            .par_iter()
            .map(|plan| build_pair(left, right, plan, options))
            .collect::<Result<Vec<_>>>()?
    } else {
        plans
            .iter()
            .map(|plan| build_pair(left, right, plan, options))
            .collect::<Result<Vec<_>>>()?
    };
    info!(
        pairs = pairs.len(),
        duration_ms = start.elapsed().as_millis(),
        "composite key built"
    );
    Ok(SyntheticKeys { pairs })
}

fn build_pair(
    left: &Table,
    right: &Table,
    plan: &PairPlan,
    options: &JoinOptions,
) -> Result<PairKeys> {
    let l = left.data.column(&plan.pair.left_column)?;
    let r = right.data.column(&plan.pair.right_column)?;
    let keys = match plan.join_type {
        JoinType::String => string_keys(l, r, plan, options),
        JoinType::Numeric => numeric_keys(l, r, plan, options.parallel),
        JoinType::Vector => vector_keys(l, r, plan, options.parallel),
        JoinType::Geo => geo_keys(l, r, plan, options.parallel)?,
        JoinType::Datetime => datetime_keys(l, r, plan, options.parallel)?,
    };
    let report = &keys.report;
    if report.coercion_failures > 0 {
        warn!(
            left_column = %report.left_column,
            right_column = %report.right_column,
            join_type = %report.join_type,
            failures = report.coercion_failures,
            "values could not be coerced and will not match"
        );
    }
    debug!(
        left_column = %report.left_column,
        right_column = %report.right_column,
        join_type = %report.join_type,
        key_columns = report.key_columns,
        left_values = report.left_values,
        matched = report.matched,
        "pair matched"
    );
    Ok(keys)
}

/// Cells read through a coercion, with the count of non-null cells that
/// failed to convert.
struct Coerced<T> {
    values: Vec<Option<T>>,
    failures: usize,
}

fn coerce<T, F>(column: &Column, convert: F) -> Coerced<T>
where
    F: Fn(AnyValue<'_>) -> Option<T>,
{
    let values = column_values(column, convert);
    let missing = values.iter().filter(|v| v.is_none()).count();
    Coerced {
        failures: missing.saturating_sub(column.null_count()),
        values,
    }
}

// -0.0 and 0.0 must produce the same key
fn canonical(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

fn float_series(name: String, values: &[Option<f64>]) -> Series {
    let values: Vec<Option<f64>> = values.iter().map(|v| v.map(canonical)).collect();
    Series::new(name.into(), values)
}

/// Key columns for one side. A pair without components keys on a single
/// all-null column, which never matches.
fn keys_or_null(mut series: Vec<Series>, plan: &PairPlan, side: Side, rows: usize) -> Vec<Series> {
    if series.is_empty() {
        series.push(float_series(plan.key_name(side, "_0"), &vec![None::<f64>; rows]));
    }
    series
}

fn string_keys(l: &Column, r: &Column, plan: &PairPlan, options: &JoinOptions) -> PairKeys {
    let left = coerce(l, any_to_key_string);
    let right = coerce(r, any_to_key_string);
    let candidates = candidate_set(&right.values);
    let pair = &plan.pair;

    let (keys, left_values, matched) = if pair.is_exact() {
        let present: HashSet<&str> = candidates.iter().map(String::as_str).collect();
        let distinct = candidate_set(&left.values);
        let matched = distinct.iter().filter(|v| present.contains(v.as_str())).count();
        (left.values.clone(), distinct.len(), matched)
    } else {
        let matcher = if pair.absolute {
            StringMatcher::with_min_score(pair.accuracy, options.string_scorer)
        } else {
            StringMatcher::new(pair.accuracy, options.string_scorer)
        };
        let prepared = matcher.prepare(&candidates);
        let result = match_values(&prepared, &left.values, &candidates, options.parallel);
        (result.rows(), result.distinct_count(), result.matched_count())
    };

    PairKeys {
        left: vec![Series::new(plan.key_name(Side::Left, "").into(), keys)],
        right: vec![Series::new(plan.key_name(Side::Right, "").into(), right.values)],
        report: PairReport {
            key_columns: 1,
            left_values,
            matched,
            coercion_failures: left.failures + right.failures,
            ..PairReport::unmatched(plan)
        },
    }
}

fn tolerance(pair: &ColumnPair) -> Tolerance {
    Tolerance::new(pair.accuracy, pair.absolute)
}

fn numeric_keys(l: &Column, r: &Column, plan: &PairPlan, parallel: bool) -> PairKeys {
    let left = coerce(l, any_to_f64);
    let right = coerce(r, any_to_f64);
    let matcher = NumericMatcher::new(tolerance(&plan.pair));
    let result = match_values(&matcher, &left.values, &candidate_set(&right.values), parallel);

    PairKeys {
        left: vec![float_series(plan.key_name(Side::Left, ""), &result.rows())],
        right: vec![float_series(plan.key_name(Side::Right, ""), &right.values)],
        report: PairReport {
            key_columns: 1,
            left_values: result.distinct_count(),
            matched: result.matched_count(),
            coercion_failures: left.failures + right.failures,
            ..PairReport::unmatched(plan)
        },
    }
}

fn vector_keys(l: &Column, r: &Column, plan: &PairPlan, parallel: bool) -> PairKeys {
    let left = coerce(l, any_to_vector);
    let right = coerce(r, any_to_vector);
    let matcher = NumericMatcher::new(tolerance(&plan.pair));
    let matched = match_vectors(&matcher, &left.values, &right.values, plan.width, parallel);

    let series = |side: Side, components: &[Vec<Option<f64>>], rows: usize| -> Vec<Series> {
        let keys = components
            .iter()
            .enumerate()
            .map(|(j, values)| float_series(plan.key_name(side, &format!("_{j}")), values))
            .collect();
        keys_or_null(keys, plan, side, rows)
    };
    let left_keys = series(Side::Left, &matched.left, l.len());
    let right_keys = series(Side::Right, &matched.right, r.len());

    PairKeys {
        report: PairReport {
            key_columns: left_keys.len(),
            left_values: left.values.iter().flatten().count(),
            matched: matched.matched_rows,
            coercion_failures: left.failures + right.failures,
            ..PairReport::unmatched(plan)
        },
        left: left_keys,
        right: right_keys,
    }
}

fn geo_keys(l: &Column, r: &Column, plan: &PairPlan, parallel: bool) -> Result<PairKeys> {
    let left = coerce(l, any_to_vector);
    let right = coerce(r, any_to_vector);
    let pair = &plan.pair;
    let matcher = GeoMatcher::new(pair.accuracy, pair.absolute)?;
    let matched = match_points(&matcher, &left.values, &right.values, plan.width, parallel)?;

    let series = |side: Side, positions: &[Vec<Option<GeoPoint>>], rows: usize| -> Vec<Series> {
        let keys = positions
            .iter()
            .enumerate()
            .flat_map(|(j, points)| {
                let lat: Vec<Option<f64>> = points.iter().map(|p| p.map(|p| p.lat)).collect();
                let lon: Vec<Option<f64>> = points.iter().map(|p| p.map(|p| p.lon)).collect();
                [
                    float_series(plan.key_name(side, &format!("_{j}_lat")), &lat),
                    float_series(plan.key_name(side, &format!("_{j}_lon")), &lon),
                ]
            })
            .collect();
        keys_or_null(keys, plan, side, rows)
    };
    let left_keys = series(Side::Left, &matched.left, l.len());
    let right_keys = series(Side::Right, &matched.right, r.len());

    Ok(PairKeys {
        report: PairReport {
            key_columns: left_keys.len(),
            left_values: left.values.iter().flatten().count(),
            matched: matched.matched_rows,
            coercion_failures: left.failures + right.failures,
            ..PairReport::unmatched(plan)
        },
        left: left_keys,
        right: right_keys,
    })
}

/// Physical encoding of a temporal column.
#[derive(Debug, Clone, Copy)]
enum Epoch {
    Days,
    Millis,
    Micros,
    Nanos,
}

impl Epoch {
    fn of(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Date => Some(Self::Days),
            DataType::Datetime(TimeUnit::Milliseconds, _) => Some(Self::Millis),
            DataType::Datetime(TimeUnit::Microseconds, _) => Some(Self::Micros),
            DataType::Datetime(TimeUnit::Nanoseconds, _) => Some(Self::Nanos),
            _ => None,
        }
    }

    fn to_datetime(self, value: i64) -> Option<NaiveDateTime> {
        let dt = match self {
            Self::Days => DateTime::from_timestamp(value.checked_mul(86_400)?, 0)?,
            Self::Millis => DateTime::from_timestamp_millis(value)?,
            Self::Micros => DateTime::from_timestamp_micros(value)?,
            Self::Nanos => DateTime::from_timestamp_nanos(value),
        };
        Some(dt.naive_utc())
    }
}

fn timestamps(column: &Column) -> Result<Coerced<NaiveDateTime>> {
    match Epoch::of(column.dtype()) {
        Some(epoch) => {
            let physical = column.cast(&DataType::Int64)?;
            Ok(coerce(&physical, |value| match value {
                AnyValue::Int64(v) => epoch.to_datetime(v),
                _ => None,
            }))
        }
        None => Ok(coerce(column, |value| {
            any_to_key_string(value).and_then(|s| parse_timestamp(&s))
        })),
    }
}

fn micros(values: &[Option<NaiveDateTime>]) -> Vec<Option<i64>> {
    values
        .iter()
        .map(|v| v.map(|ts| ts.and_utc().timestamp_micros()))
        .collect()
}

fn datetime_keys(l: &Column, r: &Column, plan: &PairPlan, parallel: bool) -> Result<PairKeys> {
    let left = timestamps(l)?;
    let right = timestamps(r)?;
    let pair = &plan.pair;

    let left_instants: Vec<NaiveDateTime> = left.values.iter().flatten().copied().collect();
    let right_instants: Vec<NaiveDateTime> = right.values.iter().flatten().copied().collect();
    let matcher = DatetimeMatcher::new(pair.accuracy, pair.absolute, &left_instants, &right_instants);
    debug!(
        left_column = %pair.left_column,
        tolerance_seconds = matcher.tolerance_seconds(),
        "datetime tolerance"
    );
    let result = match_values(&matcher, &left.values, &candidate_set(&right.values), parallel);

    Ok(PairKeys {
        left: vec![Series::new(plan.key_name(Side::Left, "").into(), micros(&result.rows()))],
        right: vec![Series::new(plan.key_name(Side::Right, "").into(), micros(&right.values))],
        report: PairReport {
            key_columns: 1,
            left_values: result.distinct_count(),
            matched: result.matched_count(),
            coercion_failures: left.failures + right.failures,
            ..PairReport::unmatched(plan)
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fjoin_model::FuzzyJoinError;
    use polars::prelude::{DataFrame, IntoColumn};

    fn table(columns: Vec<Column>) -> Table {
        Table::new(DataFrame::new(columns).unwrap())
    }

    fn floats(series: &Series) -> Vec<Option<f64>> {
        series.f64().unwrap().into_iter().collect()
    }

    #[test]
    fn plan_resolves_types_and_checks_columns() {
        let left = table(vec![Series::new("x".into(), vec![1.0f64]).into_column()]);
        let right = table(vec![Series::new("y".into(), vec![2i64]).into_column()]);

        let spec = JoinSpec::single("x", "y", 0.9, false).unwrap();
        let plans = plan(&left, &right, &spec).unwrap();
        assert_eq!(plans[0].join_type, JoinType::Numeric);

        let spec = JoinSpec::single("x", "z", 0.9, false).unwrap();
        let err = plan(&left, &right, &spec).unwrap_err();
        assert!(matches!(err, FuzzyJoinError::ColumnNotFound { side: Side::Right, .. }));
    }

    #[test]
    fn plan_rejects_relative_geo() {
        let coords = || Series::new("p".into(), vec!["1,2"]).into_column();
        let left = table(vec![coords()]).with_semantic_types("p", ["bounding_polygon"]);
        let right = table(vec![coords()]).with_semantic_types("p", ["bounding_polygon"]);
        let spec = JoinSpec::single("p", "p", 0.9, false).unwrap();
        let err = plan(&left, &right, &spec).unwrap_err();
        assert!(matches!(err, FuzzyJoinError::InvalidArgument(_)));
    }

    #[test]
    fn numeric_keys_count_coercion_failures() {
        let left = table(vec![
            Series::new("x".into(), vec![Some("10.0"), Some("abc"), None]).into_column(),
        ])
        .with_semantic_types("x", ["float"]);
        let right = table(vec![Series::new("x".into(), vec![10.4f64, 20.0]).into_column()]);
        let spec = JoinSpec::single("x", "x", 0.95, false).unwrap();
        let plans = plan(&left, &right, &spec).unwrap();
        let keys = build_keys(&left, &right, &plans, &JoinOptions::default()).unwrap();

        assert_eq!(keys.left_names(), vec!["lefty_numeric0"]);
        assert_eq!(keys.right_names(), vec!["righty_numeric0"]);
        assert_eq!(floats(&keys.pairs[0].left[0]), vec![Some(10.4), None, None]);
        let report = &keys.pairs[0].report;
        assert_eq!(report.coercion_failures, 1);
        assert_eq!((report.left_values, report.matched), (1, 1));
    }

    #[test]
    fn vector_keys_one_column_per_component() {
        let left = table(vec![Series::new("v".into(), vec!["1,2,3"]).into_column()])
            .with_semantic_types("v", ["float_vector"]);
        let right = table(vec![Series::new("v".into(), vec!["1,2,3.1"]).into_column()])
            .with_semantic_types("v", ["float_vector"]);
        let spec = JoinSpec::single("v", "v", 0.5, true).unwrap();
        let plans = plan(&left, &right, &spec).unwrap();
        let keys = build_keys(&left, &right, &plans, &JoinOptions::default().sequential()).unwrap();
        assert_eq!(
            keys.left_names(),
            vec!["lefty_vector0_0", "lefty_vector0_1", "lefty_vector0_2"]
        );
        assert_eq!(floats(&keys.pairs[0].left[2]), vec![Some(3.1)]);
    }

    #[test]
    fn vector_width_mismatch_is_invalid() {
        let left = table(vec![Series::new("v".into(), vec!["1,2"]).into_column()])
            .with_semantic_types("v", ["float_vector"]);
        let right = table(vec![Series::new("v".into(), vec!["1,2,3"]).into_column()])
            .with_semantic_types("v", ["float_vector"]);
        let spec = JoinSpec::single("v", "v", 0.5, false).unwrap();
        let err = plan(&left, &right, &spec).unwrap_err();
        assert!(matches!(err, FuzzyJoinError::InvalidArgument(_)));
    }

    #[test]
    fn plan_rejects_odd_coordinate_count() {
        let left = table(vec![Series::new("p".into(), vec![None, Some("1,2,3")]).into_column()])
            .with_semantic_types("p", ["bounding_polygon"]);
        let right = table(vec![Series::new("p".into(), vec!["1,2,3"]).into_column()])
            .with_semantic_types("p", ["bounding_polygon"]);
        let spec = JoinSpec::single("p", "p", 100.0, true).unwrap();
        let err = plan(&left, &right, &spec).unwrap_err();
        assert!(matches!(err, FuzzyJoinError::InvalidArgument(_)));
    }

    #[test]
    fn plan_records_vector_width() {
        let left = table(vec![Series::new("v".into(), vec![Some("x"), Some("1,2,3")]).into_column()])
            .with_semantic_types("v", ["float_vector"]);
        let right = table(vec![Series::new("v".into(), vec![None::<&str>]).into_column()])
            .with_semantic_types("v", ["float_vector"]);
        let spec = JoinSpec::single("v", "v", 0.5, true).unwrap();
        let plans = plan(&left, &right, &spec).unwrap();
        assert_eq!(plans[0].width, 3);
    }

    #[test]
    fn unreadable_vectors_key_on_nulls() {
        let left = table(vec![Series::new("v".into(), vec!["x", "y"]).into_column()])
            .with_semantic_types("v", ["float_vector"]);
        let right = table(vec![Series::new("v".into(), vec!["x"]).into_column()])
            .with_semantic_types("v", ["float_vector"]);
        let spec = JoinSpec::single("v", "v", 0.5, true).unwrap();
        let plans = plan(&left, &right, &spec).unwrap();
        assert_eq!(plans[0].width, 0);

        let keys = build_keys(&left, &right, &plans, &JoinOptions::default()).unwrap();
        assert_eq!(keys.left_names(), vec!["lefty_vector0_0"]);
        assert_eq!(keys.right_names(), vec!["righty_vector0_0"]);
        assert_eq!(floats(&keys.pairs[0].left[0]), vec![None, None]);
        assert_eq!(floats(&keys.pairs[0].right[0]), vec![None]);
        let report = &keys.pairs[0].report;
        assert_eq!((report.key_columns, report.matched), (1, 0));
        assert_eq!(report.coercion_failures, 3);
    }

    #[test]
    fn epoch_conversion() {
        let ts = Epoch::Days.to_datetime(1).unwrap();
        assert_eq!(ts.to_string(), "1970-01-02 00:00:00");
        let ts = Epoch::Millis.to_datetime(1_500).unwrap();
        assert_eq!(ts.and_utc().timestamp_millis(), 1_500);
    }
}
