//! Fuzzy string matching.

use std::collections::BTreeSet;

use rapidfuzz::distance::jaro_winkler;
use rapidfuzz::fuzz;
use serde::{Deserialize, Serialize};

use crate::matcher::Matcher;

/// Similarity metric used for fuzzy string keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringScorer {
    /// Best of the plain, partial, token-sort and token-set ratios, weighted
    /// by how different the two lengths are. Scores are whole numbers.
    #[default]
    WeightedRatio,
    /// Normalized Indel similarity (edit distance with insertions and
    /// deletions only).
    Ratio,
    /// Jaro-Winkler similarity, which favours shared prefixes.
    JaroWinkler,
}

impl StringScorer {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WeightedRatio => "weighted_ratio",
            Self::Ratio => "ratio",
            Self::JaroWinkler => "jaro_winkler",
        }
    }
}

impl std::str::FromStr for StringScorer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "weighted_ratio" | "wratio" | "weighted" => Ok(Self::WeightedRatio),
            "ratio" | "indel" => Ok(Self::Ratio),
            "jaro_winkler" | "jaro" => Ok(Self::JaroWinkler),
            other => Err(format!("unknown string scorer '{other}'")),
        }
    }
}

/// Normalize a string before scoring: lowercase, non-alphanumerics become
/// spaces, outer whitespace trimmed.
pub fn process(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// A string after [`process`], with the token forms the weighted scorer
/// compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedString {
    chars: Vec<char>,
    sorted: Vec<char>,
    tokens: BTreeSet<String>,
}

impl ProcessedString {
    pub fn new(value: &str) -> Self {
        let text = process(value);
        let mut words: Vec<&str> = text.split_whitespace().collect();
        words.sort_unstable();
        Self {
            chars: text.chars().collect(),
            sorted: words.join(" ").chars().collect(),
            tokens: words.iter().map(|w| (*w).to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Similarity of two strings on a 0-100 scale, after [`process`].
///
/// Strings that are empty after processing score 0.
pub fn similarity(a: &str, b: &str, scorer: StringScorer) -> f64 {
    processed_similarity(&ProcessedString::new(a), &ProcessedString::new(b), scorer)
}

fn processed_similarity(a: &ProcessedString, b: &ProcessedString, scorer: StringScorer) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    match scorer {
        StringScorer::WeightedRatio => weighted_ratio(a, b),
        StringScorer::Ratio => ratio(&a.chars, &b.chars),
        StringScorer::JaroWinkler => {
            jaro_winkler::similarity(a.chars.iter().copied(), b.chars.iter().copied()) * 100.0
        }
    }
}

const UNBASE_SCALE: f64 = 0.95;

fn ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    fuzz::ratio(a.iter().copied(), b.iter().copied()) * 100.0
}

/// Best ratio of the shorter string against each equally long window of the
/// longer one.
fn partial_ratio(a: &[char], b: &[char]) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }
    let scorer = fuzz::RatioBatchComparator::new(short.iter().copied());
    let mut best = 0.0f64;
    for window in long.windows(short.len()) {
        best = best.max(scorer.similarity(window.iter().copied()) * 100.0);
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn joined<'a>(tokens: impl IntoIterator<Item = &'a String>) -> Vec<char> {
    let mut out = Vec::new();
    for token in tokens {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(token.chars());
    }
    out
}

/// Compares the shared tokens against each side's shared-plus-own tokens.
fn token_set_ratio(
    a: &ProcessedString,
    b: &ProcessedString,
    score: fn(&[char], &[char]) -> f64,
) -> f64 {
    let shared = || a.tokens.intersection(&b.tokens);
    let common = joined(shared());
    let with_a = joined(shared().chain(a.tokens.difference(&b.tokens)));
    let with_b = joined(shared().chain(b.tokens.difference(&a.tokens)));
    score(&common, &with_a)
        .max(score(&common, &with_b))
        .max(score(&with_a, &with_b))
}

fn weighted_ratio(a: &ProcessedString, b: &ProcessedString) -> f64 {
    let base = ratio(&a.chars, &b.chars);
    let shorter = a.chars.len().min(b.chars.len());
    let longer = a.chars.len().max(b.chars.len());
    let len_ratio = longer as f64 / shorter as f64;

    let best = if len_ratio < 1.5 {
        let sorted = ratio(&a.sorted, &b.sorted) * UNBASE_SCALE;
        let set = token_set_ratio(a, b, ratio) * UNBASE_SCALE;
        base.max(sorted).max(set)
    } else {
        let partial_scale = if len_ratio > 8.0 { 0.6 } else { 0.9 };
        let partial = partial_ratio(&a.chars, &b.chars) * partial_scale;
        let sorted = partial_ratio(&a.sorted, &b.sorted) * UNBASE_SCALE * partial_scale;
        let set = token_set_ratio(a, b, partial_ratio) * UNBASE_SCALE * partial_scale;
        base.max(partial).max(sorted).max(set)
    };
    best.round_ties_even()
}

/// Matches strings by similarity score.
///
/// With an accuracy of 1.0 only a verbatim, case-sensitive candidate
/// matches.
#[derive(Debug, Clone, Copy)]
pub struct StringMatcher {
    min_score: f64,
    scorer: StringScorer,
    exact: bool,
}

impl StringMatcher {
    pub fn new(accuracy: f64, scorer: StringScorer) -> Self {
        Self {
            min_score: accuracy * 100.0,
            scorer,
            exact: accuracy >= 1.0,
        }
    }

    /// Fuzzy matching with a minimum score on the 0-100 scale.
    pub fn with_min_score(min_score: f64, scorer: StringScorer) -> Self {
        Self {
            min_score,
            scorer,
            exact: false,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Process a candidate set once for repeated matching against it.
    pub fn prepare(&self, candidates: &[String]) -> PreparedStringMatcher {
        let processed = if self.exact {
            Vec::new()
        } else {
            candidates.iter().map(|c| ProcessedString::new(c)).collect()
        };
        PreparedStringMatcher {
            matcher: *self,
            candidates: processed,
        }
    }

    fn best_of<'a>(
        &self,
        value: &ProcessedString,
        candidates: impl Iterator<Item = (&'a String, &'a ProcessedString)>,
    ) -> Option<String> {
        let mut best: Option<(&String, f64)> = None;
        for (candidate, processed) in candidates {
            let score = processed_similarity(value, processed, self.scorer);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }
        best.filter(|(_, score)| *score >= self.min_score)
            .map(|(candidate, _)| candidate.clone())
    }
}

impl Matcher for StringMatcher {
    type Value = String;

    fn best_match(&self, value: &String, candidates: &[String]) -> Option<String> {
        self.prepare(candidates).best_match(value, candidates)
    }
}

/// A [`StringMatcher`] holding one candidate set in processed form.
///
/// `best_match` expects the candidates it was prepared from; any other set
/// is processed on the fly.
#[derive(Debug, Clone)]
pub struct PreparedStringMatcher {
    matcher: StringMatcher,
    candidates: Vec<ProcessedString>,
}

impl Matcher for PreparedStringMatcher {
    type Value = String;

    fn best_match(&self, value: &String, candidates: &[String]) -> Option<String> {
        if self.matcher.exact {
            return candidates.iter().find(|c| *c == value).cloned();
        }
        let value = ProcessedString::new(value);
        if self.candidates.len() == candidates.len() {
            self.matcher.best_of(&value, candidates.iter().zip(&self.candidates))
        } else {
            let processed: Vec<ProcessedString> =
                candidates.iter().map(|c| ProcessedString::new(c)).collect();
            self.matcher.best_of(&value, candidates.iter().zip(&processed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_process() {
        assert_eq!(process("  Hello, World! "), "hello  world");
        assert_eq!(process("--"), "");
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("cat", "CAT", StringScorer::Ratio), 100.0);
        let score = similarity("caat", "cat", StringScorer::Ratio);
        assert!(score > 80.0 && score < 90.0, "{score}");
        assert_eq!(similarity("", "cat", StringScorer::Ratio), 0.0);
        assert!(similarity("martha", "marhta", StringScorer::JaroWinkler) > 90.0);
    }

    #[test]
    fn fuzzy_match_respects_threshold() {
        let candidates = strings(&["dog", "cat", "cart"]);
        let matcher = StringMatcher::new(0.8, StringScorer::Ratio);
        assert_eq!(matcher.best_match(&"caat".into(), &candidates), Some("cat".into()));
        assert_eq!(matcher.best_match(&"bird".into(), &candidates), None);
    }

    #[test]
    fn first_candidate_wins_ties() {
        let candidates = strings(&["abd", "abe"]);
        let matcher = StringMatcher::new(0.5, StringScorer::Ratio);
        assert_eq!(matcher.best_match(&"abc".into(), &candidates), Some("abd".into()));
    }

    #[test]
    fn exact_match_is_case_sensitive() {
        let candidates = strings(&["Cat", "cat"]);
        let matcher = StringMatcher::new(1.0, StringScorer::Ratio);
        assert!(matcher.is_exact());
        assert_eq!(matcher.best_match(&"cat".into(), &candidates), Some("cat".into()));
        assert_eq!(matcher.best_match(&"CAT".into(), &candidates), None);
    }

    #[test]
    fn weighted_ratio_scores_substrings() {
        assert_eq!(similarity("New York", "New York City", StringScorer::WeightedRatio), 90.0);
        assert_eq!(similarity("New York", "new-york", StringScorer::WeightedRatio), 100.0);
        assert_eq!(similarity("caat", "cat", StringScorer::WeightedRatio), 86.0);
        assert_eq!(similarity("", "cat", StringScorer::WeightedRatio), 0.0);
    }

    #[test]
    fn weighted_ratio_ignores_token_order() {
        assert_eq!(similarity("york new", "New York", StringScorer::WeightedRatio), 95.0);
        assert!(similarity("york new", "New York", StringScorer::Ratio) < 60.0);
    }

    #[test]
    fn default_scorer_matches_substring_keys() {
        let candidates = strings(&["Newark", "New York City"]);
        let matcher = StringMatcher::new(0.85, StringScorer::default());
        assert_eq!(
            matcher.best_match(&"New York".into(), &candidates),
            Some("New York City".into())
        );
        let plain = StringMatcher::new(0.85, StringScorer::Ratio);
        assert_eq!(plain.best_match(&"New York".into(), &candidates), None);
    }

    #[test]
    fn prepared_matcher_agrees_with_one_off_matching() {
        let candidates = strings(&["dog", "cat", "cart", "New York City"]);
        let matcher = StringMatcher::new(0.8, StringScorer::default());
        let prepared = matcher.prepare(&candidates);
        for value in ["caat", "bird", "new york", "CART", ""] {
            let value = value.to_string();
            assert_eq!(
                prepared.best_match(&value, &candidates),
                matcher.best_match(&value, &candidates),
                "{value}"
            );
        }
        // a different candidate set is still scored correctly
        let others = strings(&["bird"]);
        assert_eq!(prepared.best_match(&"birds".into(), &others), Some("bird".into()));
    }

    #[test]
    fn scorer_from_str() {
        assert_eq!("jaro-winkler".parse::<StringScorer>(), Ok(StringScorer::JaroWinkler));
        assert_eq!("Ratio".parse::<StringScorer>(), Ok(StringScorer::Ratio));
        assert_eq!("WRatio".parse::<StringScorer>(), Ok(StringScorer::WeightedRatio));
        assert_eq!(StringScorer::default().as_str(), "weighted_ratio");
        assert!("soundex".parse::<StringScorer>().is_err());
    }
}
