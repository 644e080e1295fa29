//! Polars AnyValue utility functions.
//!
//! This module provides helper functions for coercing Polars `AnyValue` cells
//! into the plain values the matchers compare: key strings, floats and
//! numeric vectors.

use polars::prelude::{AnyValue, Column, DataType, Series};

/// Converts a Polars `AnyValue` into a string usable as an equi-join key.
///
/// Returns `None` for `Null`. Floats are formatted without trailing zeros so
/// that `3.0` and `3` produce the same key.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use fjoin_common::any_to_key_string;
///
/// assert_eq!(any_to_key_string(AnyValue::Null), None);
/// assert_eq!(any_to_key_string(AnyValue::Int32(42)), Some("42".to_string()));
/// assert_eq!(any_to_key_string(AnyValue::Boolean(true)), Some("true".to_string()));
/// ```
pub fn any_to_key_string(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(v.to_string()),
        AnyValue::Int16(v) => Some(v.to_string()),
        AnyValue::Int32(v) => Some(v.to_string()),
        AnyValue::Int64(v) => Some(v.to_string()),
        AnyValue::UInt8(v) => Some(v.to_string()),
        AnyValue::UInt16(v) => Some(v.to_string()),
        AnyValue::UInt32(v) => Some(v.to_string()),
        AnyValue::UInt64(v) => Some(v.to_string()),
        AnyValue::Float32(v) => Some(format_numeric(f64::from(v))),
        AnyValue::Float64(v) => Some(format_numeric(v)),
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        AnyValue::Boolean(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Formats a floating-point number as a string without trailing zeros.
///
/// # Examples
///
/// ```
/// use fjoin_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(10.0), "10");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(0.0), "0");
/// ```
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Converts an `AnyValue` to `f64`, returning `None` for non-numeric or null values.
///
/// Handles integer types, floating-point types, and string parsing.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    let number = match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        _ => None,
    };
    number.filter(|v| !v.is_nan())
}

/// Parses a string as `f64`, returning `None` for invalid, empty or NaN strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Converts a list/array cell, or a delimited string, into a numeric vector.
///
/// Returns `None` for nulls, empty vectors, and vectors with any null or
/// non-numeric component.
pub fn any_to_vector(value: AnyValue<'_>) -> Option<Vec<f64>> {
    match value {
        AnyValue::List(series) => series_to_vector(&series),
        AnyValue::Array(series, _) => series_to_vector(&series),
        AnyValue::String(s) => parse_vector(s),
        AnyValue::StringOwned(s) => parse_vector(&s),
        _ => None,
    }
}

fn series_to_vector(series: &Series) -> Option<Vec<f64>> {
    let cast = series.cast(&DataType::Float64).ok()?;
    let values: Option<Vec<f64>> = cast.f64().ok()?.into_iter().collect();
    values.filter(|v| !v.is_empty() && v.iter().all(|x| !x.is_nan()))
}

/// Parses a delimited vector encoding such as `"1.5,2,3"` or `"[1.5 2 3]"`.
///
/// Components are separated by commas, or by whitespace when the string has
/// no commas. Surrounding brackets are ignored.
///
/// # Examples
///
/// ```
/// use fjoin_common::parse_vector;
///
/// assert_eq!(parse_vector("1,2.5,3"), Some(vec![1.0, 2.5, 3.0]));
/// assert_eq!(parse_vector("[1 2]"), Some(vec![1.0, 2.0]));
/// assert_eq!(parse_vector("1,x"), None);
/// ```
pub fn parse_vector(value: &str) -> Option<Vec<f64>> {
    let inner = value
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')'])
        .trim();
    if inner.is_empty() {
        return None;
    }
    if inner.contains(',') {
        inner.split(',').map(parse_f64).collect()
    } else {
        inner.split_whitespace().map(parse_f64).collect()
    }
}

/// Formats a vector as comma-separated numbers, the inverse of [`parse_vector`].
pub fn format_vector(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_numeric(*v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Extracts every cell of a column through a coercion function.
pub fn column_values<T, F>(column: &Column, coerce: F) -> Vec<Option<T>>
where
    F: Fn(AnyValue<'_>) -> Option<T>,
{
    (0..column.len())
        .map(|idx| column.get(idx).ok().and_then(&coerce))
        .collect()
}
