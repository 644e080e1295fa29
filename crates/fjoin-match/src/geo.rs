//! Great-circle matching of geographic points.
//!
//! Geographic columns hold flat coordinate vectors read two at a time as
//! `(latitude, longitude)` pairs. Each point position is matched on its own,
//! the same way vector components are.

use fjoin_model::{FuzzyJoinError, Result};

use crate::matcher::{Candidate, Matcher, candidate_set, match_values, nearest_within};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl Candidate for GeoPoint {
    type Key = (u64, u64);

    fn key(&self) -> (u64, u64) {
        (self.lat.key(), self.lon.key())
    }
}

/// Haversine distance between two points, in meters.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Read a flat coordinate vector as `(lat, lon)` pairs.
///
/// Returns `None` when the vector has an odd number of values.
pub fn points_from_coordinates(values: &[f64]) -> Option<Vec<GeoPoint>> {
    if values.len() % 2 != 0 {
        return None;
    }
    Some(
        values
            .chunks_exact(2)
            .map(|pair| GeoPoint::new(pair[0], pair[1]))
            .collect(),
    )
}

/// Number of `(lat, lon)` points in a coordinate vector of `width` values.
pub fn point_count(width: usize) -> Result<usize> {
    if width % 2 != 0 {
        return Err(FuzzyJoinError::invalid(format!(
            "coordinate vectors must hold (lat, lon) pairs, found {width} values"
        )));
    }
    Ok(width / 2)
}

/// Matches points within a fixed distance in meters.
#[derive(Debug, Clone, Copy)]
pub struct GeoMatcher {
    tolerance_meters: f64,
}

impl GeoMatcher {
    /// Geographic tolerance has no relative form, so `absolute` must be set.
    pub fn new(accuracy: f64, absolute: bool) -> Result<Self> {
        if !absolute {
            return Err(FuzzyJoinError::invalid(
                "geo matching requires an absolute accuracy that specifies the tolerance in meters",
            ));
        }
        Ok(Self {
            tolerance_meters: accuracy,
        })
    }

    pub fn tolerance_meters(&self) -> f64 {
        self.tolerance_meters
    }
}

impl Matcher for GeoMatcher {
    type Value = GeoPoint;

    fn best_match(&self, value: &GeoPoint, candidates: &[GeoPoint]) -> Option<GeoPoint> {
        nearest_within(value, candidates, self.tolerance_meters, |a, b| {
            haversine_meters(*a, *b)
        })
        .copied()
    }
}

/// Split coordinate vectors into one point column per position.
///
/// Vectors of a different width, or with an odd width, are null at every
/// position.
pub fn split_points(values: &[Option<Vec<f64>>], width: usize) -> Vec<Vec<Option<GeoPoint>>> {
    let rows: Vec<Option<Vec<GeoPoint>>> = values
        .iter()
        .map(|value| {
            value
                .as_deref()
                .filter(|v| v.len() == width)
                .and_then(points_from_coordinates)
        })
        .collect();
    (0..width / 2)
        .map(|position| {
            rows.iter()
                .map(|points| points.as_ref().map(|p| p[position]))
                .collect()
        })
        .collect()
}

/// Outcome of matching a coordinate column point by point.
#[derive(Debug, Clone)]
pub struct GeoMatch {
    pub left: Vec<Vec<Option<GeoPoint>>>,
    pub right: Vec<Vec<Option<GeoPoint>>>,
    pub matched_rows: usize,
}

/// Match every point position of `left` against the same position of
/// `right`. A row keeps its keys only when all of its points matched.
pub fn match_points(
    matcher: &GeoMatcher,
    left: &[Option<Vec<f64>>],
    right: &[Option<Vec<f64>>],
    width: usize,
    parallel: bool,
) -> Result<GeoMatch> {
    point_count(width)?;
    let left_points = split_points(left, width);
    let right_points = split_points(right, width);

    let mut matched: Vec<Vec<Option<GeoPoint>>> = left_points
        .iter()
        .zip(&right_points)
        .map(|(l, r)| match_values(matcher, l, &candidate_set(r), parallel).rows())
        .collect();

    let mut matched_rows = 0;
    for row in 0..left.len() {
        if width > 0 && matched.iter().all(|position| position[row].is_some()) {
            matched_rows += 1;
        } else {
            for position in &mut matched {
                position[row] = None;
            }
        }
    }

    Ok(GeoMatch {
        left: matched,
        right: right_points,
        matched_rows,
    })
}
