// Property-based tests for the per-type matchers.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use fjoin_match::{
    DatetimeMatcher, GeoPoint, Matcher, NumericMatcher, StringMatcher, StringScorer, Tolerance,
    distinct, haversine_meters, match_values,
};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_word() -> impl Strategy<Value = String> {
    r"[a-zA-Z]{1,6}"
}

fn arb_candidates() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1000i32..1000, 0..20)
        .prop_map(|v| v.into_iter().map(|x| f64::from(x) / 4.0).collect())
}

fn arb_point() -> impl Strategy<Value = GeoPoint> {
    (-89.0..89.0f64, -179.0..179.0f64).prop_map(|(lat, lon)| GeoPoint::new(lat, lon))
}

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

fn at(offset: i64) -> NaiveDateTime {
    epoch() + TimeDelta::seconds(offset)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn exact_string_match_is_equality(
        value in arb_word(),
        candidates in prop::collection::vec(arb_word(), 0..10),
    ) {
        let candidates = distinct(candidates);
        let matcher = StringMatcher::new(1.0, StringScorer::Ratio);
        let expected = candidates.contains(&value).then(|| value.clone());
        prop_assert_eq!(matcher.best_match(&value, &candidates), expected);
    }

    #[test]
    fn relative_numeric_match_is_scale_invariant(
        value in -1000i32..1000,
        candidates in arb_candidates(),
        accuracy in 0.5..1.0f64,
        exponent in -8i32..8,
    ) {
        let value = f64::from(value) / 4.0;
        let scale = 2f64.powi(exponent);
        let matcher = NumericMatcher::new(Tolerance::new(accuracy, false));

        let base = matcher.best_match(&value, &candidates);
        let scaled: Vec<f64> = candidates.iter().map(|c| c * scale).collect();
        let result = matcher.best_match(&(value * scale), &scaled);
        prop_assert_eq!(result, base.map(|m| m * scale));
    }

    #[test]
    fn parallel_matching_is_deterministic(
        left in prop::collection::vec(prop::option::of(-100i32..100), 0..40),
        candidates in arb_candidates(),
    ) {
        let left: Vec<Option<f64>> = left.into_iter().map(|v| v.map(f64::from)).collect();
        let candidates = distinct(candidates);
        let matcher = NumericMatcher::new(Tolerance::new(2.0, true));
        let sequential = match_values(&matcher, &left, &candidates, false);
        let parallel = match_values(&matcher, &left, &candidates, true);
        prop_assert_eq!(sequential.rows(), parallel.rows());
    }

    #[test]
    fn haversine_is_symmetric(a in arb_point(), b in arb_point()) {
        let ab = haversine_meters(a, b);
        let ba = haversine_meters(b, a);
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() < 1e-6, "{} != {}", ab, ba);
    }

    #[test]
    fn datetime_tolerance_scales_with_span(
        left in prop::collection::vec(0i64..100_000, 1..15),
        right in prop::collection::vec(0i64..100_000, 1..15),
        accuracy in 0.5..1.0f64,
    ) {
        let stamps = |offsets: &[i64], factor: i64| -> Vec<NaiveDateTime> {
            offsets.iter().map(|o| at(o * factor)).collect()
        };
        let (l1, r1) = (stamps(&left, 1), distinct(stamps(&right, 1)));
        let (l2, r2) = (stamps(&left, 2), distinct(stamps(&right, 2)));

        let narrow = DatetimeMatcher::relative(accuracy, &l1, &r1);
        let wide = DatetimeMatcher::relative(accuracy, &l2, &r2);
        prop_assert_eq!(wide.tolerance_seconds(), 2.0 * narrow.tolerance_seconds());

        for (a, b) in l1.iter().zip(&l2) {
            let expected = narrow
                .best_match(a, &r1)
                .map(|m| at((m - epoch()).num_seconds() * 2));
            prop_assert_eq!(wide.best_match(b, &r2), expected);
        }
    }
}
