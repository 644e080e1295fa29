//! Type classification and per-type approximate matchers.
//!
//! The classifier turns two columns' semantic tags into a [`JoinType`]
//! (`fjoin_model::JoinType`). Each join type has a matcher implementing
//! [`Matcher`], which maps one left value to the best candidate from the
//! deduplicated right-hand values, or to nothing.

pub mod classify;
pub mod datetime;
pub mod geo;
pub mod matcher;
pub mod numeric;
pub mod string;
pub mod vector;

pub use classify::{classify, resolve_join_type};
pub use datetime::{DatetimeMatcher, parse_timestamp, time_span};
pub use geo::{
    EARTH_RADIUS_METERS, GeoMatch, GeoMatcher, GeoPoint, haversine_meters, match_points,
    point_count, points_from_coordinates, split_points,
};
pub use matcher::{
    Candidate, MatchResult, Matcher, candidate_set, distinct, match_values, nearest_within,
};
pub use numeric::{NumericMatcher, Tolerance};
pub use string::{
    PreparedStringMatcher, ProcessedString, StringMatcher, StringScorer, process, similarity,
};
pub use vector::{VectorMatch, common_width, match_vectors, split_components};
