//! The common matcher interface and memoized column matching.
//!
//! Every matcher maps one left value to at most one candidate from a
//! deduplicated right-hand candidate set. Candidates are kept in
//! first-occurrence order and ties always go to the earliest candidate, so
//! results do not depend on hashing or thread scheduling.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use chrono::NaiveDateTime;
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

/// A value that can be deduplicated and offered as a match candidate.
pub trait Candidate: Clone + Send + Sync {
    type Key: Eq + Hash;

    /// Identity used for deduplication.
    fn key(&self) -> Self::Key;
}

impl Candidate for String {
    type Key = String;

    fn key(&self) -> String {
        self.clone()
    }
}

impl Candidate for f64 {
    type Key = u64;

    fn key(&self) -> u64 {
        // -0.0 and 0.0 are the same candidate
        if *self == 0.0 { 0u64 } else { self.to_bits() }
    }
}

impl Candidate for NaiveDateTime {
    type Key = NaiveDateTime;

    fn key(&self) -> NaiveDateTime {
        *self
    }
}

/// Maps one value to the best candidate, or `None` when nothing is within
/// tolerance.
pub trait Matcher: Sync {
    type Value: Candidate;

    fn best_match(&self, value: &Self::Value, candidates: &[Self::Value]) -> Option<Self::Value>;
}

/// Deduplicate values, keeping the first occurrence of each.
pub fn distinct<V, I>(values: I) -> Vec<V>
where
    V: Candidate,
    I: IntoIterator<Item = V>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if seen.insert(value.key()) {
            out.push(value);
        }
    }
    out
}

/// Deduplicated candidates from an optional column, nulls dropped.
pub fn candidate_set<V: Candidate>(values: &[Option<V>]) -> Vec<V> {
    distinct(values.iter().flatten().cloned())
}

/// Select the candidate closest to `value` within `tolerance`.
///
/// Candidates farther than `tolerance` are ignored. On equal distance the
/// first candidate wins. Distances that do not compare (NaN) never match.
pub fn nearest_within<'a, V, D, F>(
    value: &V,
    candidates: &'a [V],
    tolerance: D,
    distance: F,
) -> Option<&'a V>
where
    D: PartialOrd + Copy,
    F: Fn(&V, &V) -> D,
{
    let mut best: Option<(&'a V, D)> = None;
    for candidate in candidates {
        let d = distance(value, candidate);
        if d <= tolerance && best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((candidate, d));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Best matches for one column pair, computed once per distinct left value.
#[derive(Debug, Clone)]
pub struct MatchResult<V> {
    distinct: Vec<V>,
    matches: Vec<Option<V>>,
    slots: Vec<Option<usize>>,
}

impl<V: Candidate> MatchResult<V> {
    /// Number of distinct non-null left values.
    pub fn distinct_count(&self) -> usize {
        self.distinct.len()
    }

    /// Number of distinct left values that found a match.
    pub fn matched_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_some()).count()
    }

    /// Number of left rows.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The match for a left row.
    pub fn row(&self, row: usize) -> Option<&V> {
        let slot = (*self.slots.get(row)?)?;
        self.matches[slot].as_ref()
    }

    /// Matches for every left row, in row order.
    pub fn rows(&self) -> Vec<Option<V>> {
        (0..self.slots.len()).map(|row| self.row(row).cloned()).collect()
    }
}

/// Match every left row against the candidate set.
///
/// Each distinct left value is matched once; with `parallel` set the
/// distinct values are fanned out across the rayon pool. Null left values
/// never match.
pub fn match_values<M: Matcher>(
    matcher: &M,
    left: &[Option<M::Value>],
    candidates: &[M::Value],
    parallel: bool,
) -> MatchResult<M::Value> {
    let mut index: HashMap<<M::Value as Candidate>::Key, usize> = HashMap::new();
    let mut distinct_values = Vec::new();
    let slots = left
        .iter()
        .map(|value| {
            value.as_ref().map(|v| {
                *index.entry(v.key()).or_insert_with(|| {
                    distinct_values.push(v.clone());
                    distinct_values.len() - 1
                })
            })
        })
        .collect();

    let matches: Vec<Option<M::Value>> = if parallel {
        distinct_values
            .par_iter()
            .map(|value| matcher.best_match(value, candidates))
            .collect()
    } else {
        distinct_values
            .iter()
            .map(|value| matcher.best_match(value, candidates))
            .collect()
    };

    MatchResult {
        distinct: distinct_values,
        matches,
        slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Closest;

    impl Matcher for Closest {
        type Value = f64;

        fn best_match(&self, value: &f64, candidates: &[f64]) -> Option<f64> {
            nearest_within(value, candidates, 1.0, |a, b| (a - b).abs()).copied()
        }
    }

    #[test]
    fn distinct_keeps_first_occurrence_order() {
        let values = vec!["b".to_string(), "a".into(), "b".into(), "c".into(), "a".into()];
        assert_eq!(distinct(values), vec!["b", "a", "c"]);
        assert_eq!(distinct(vec![0.0, -0.0, 1.0]), vec![0.0, 1.0]);
    }

    #[test]
    fn nearest_within_prefers_first_on_tie() {
        let candidates = [9.0, 11.0, 10.5];
        let best = nearest_within(&10.0, &candidates, 1.0, |a: &f64, b: &f64| (a - b).abs());
        assert_eq!(best, Some(&9.0));
        let best = nearest_within(&10.0, &candidates, 0.4, |a: &f64, b: &f64| (a - b).abs());
        assert_eq!(best, None);
    }

    #[test]
    fn match_values_memoizes_distinct_left_values() {
        let left = vec![Some(1.0), Some(5.0), None, Some(1.0)];
        let candidates = vec![1.2, 4.5];
        for parallel in [false, true] {
            let result = match_values(&Closest, &left, &candidates, parallel);
            assert_eq!(result.len(), 4);
            assert_eq!(result.distinct_count(), 2);
            assert_eq!(result.matched_count(), 2);
            assert_eq!(result.rows(), vec![Some(1.2), Some(4.5), None, Some(1.2)]);
        }
    }

    #[test]
    fn candidate_set_drops_nulls() {
        let values = vec![Some(2.0), None, Some(2.0), Some(3.0)];
        assert_eq!(candidate_set(&values), vec![2.0, 3.0]);
    }
}
