//! # Fuzzy Stop Matching
//!
//! Approximate search of a complaint text against the gazetteer's
//! normalized name/alias variants.
//!
//! ## Strategy (first success wins)
//!
//! 1. Normalize the query. Empty query or empty scope → `(None, 0)`.
//! 2. **Exact substring**: the first variant (gazetteer order) contained in
//!    the query wins with score 100.
//! 3. **Approximate**: score every variant with the active [`Scorer`], keep
//!    the single best one (earliest wins ties). Accept it when
//!    `score >= threshold`; otherwise report `(None, score)`.
//!
//! ## Scorers
//!
//! The scorer is picked once, when the matcher is built:
//!
//! - [`WeightedRatio`] (Cargo feature `fast-match`, on by default): weighted
//!   mix of full, partial and token-based Levenshtein ratios, the scorer
//!   that copes best with a short stop name inside a long complaint.
//! - [`OverlapRatio`]: longest-common-subsequence ratio, dependency free.
//!   Used whenever `fast-match` is disabled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gazetteer::Gazetteer;
use crate::normalize::normalize;

/// String similarity on normalized text, `0.0..=100.0`.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(&self, query: &str, choice: &str) -> f64;
}

/// The best scorer compiled into this build.
pub fn default_scorer() -> Box<dyn Scorer> {
    #[cfg(feature = "fast-match")]
    {
        Box::new(WeightedRatio)
    }
    #[cfg(not(feature = "fast-match"))]
    {
        Box::new(OverlapRatio)
    }
}

/// Index and score of the best choice. Ties keep the earliest choice.
pub fn extract_one<'a, I>(scorer: &dyn Scorer, query: &str, choices: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, choice) in choices.into_iter().enumerate() {
        let s = scorer.score(query, choice);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best
}

/// Float score as reported to callers: truncated to an integer in `0..=100`.
pub fn whole_score(raw: f64) -> u32 {
    raw.clamp(0.0, 100.0).floor() as u32
}

/// Result of [`FuzzyMatcher::best_match`]. `score` is reported even when
/// the best candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopMatch {
    pub canonical: Option<String>,
    pub score: u32,
}

impl StopMatch {
    fn miss(score: u32) -> Self {
        Self {
            canonical: None,
            score,
        }
    }
}

pub struct FuzzyMatcher {
    gazetteer: Arc<Gazetteer>,
    scorer: Box<dyn Scorer>,
}

impl FuzzyMatcher {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self::with_scorer(gazetteer, default_scorer())
    }

    pub fn with_scorer(gazetteer: Arc<Gazetteer>, scorer: Box<dyn Scorer>) -> Self {
        debug!(scorer = scorer.name(), "fuzzy matcher ready");
        Self { gazetteer, scorer }
    }

    pub fn scorer(&self) -> &dyn Scorer {
        self.scorer.as_ref()
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    /// Best canonical stop name for `text` within the `city_hint` scope.
    pub fn best_match(&self, text: &str, city_hint: Option<&str>, threshold: u32) -> StopMatch {
        let query = normalize(text);
        if query.is_empty() {
            return StopMatch::miss(0);
        }
        let variants = self.gazetteer.variants_for(city_hint);
        if variants.is_empty() {
            return StopMatch::miss(0);
        }

        if let Some(v) = variants.iter().find(|v| query.contains(v.normalized.as_str())) {
            return StopMatch {
                canonical: Some(v.canonical.clone()),
                score: 100,
            };
        }

        let choices = variants.iter().map(|v| v.normalized.as_str());
        let Some((idx, raw)) = extract_one(self.scorer.as_ref(), &query, choices) else {
            return StopMatch::miss(0);
        };
        let score = whole_score(raw);
        if score >= threshold {
            StopMatch {
                canonical: Some(variants[idx].canonical.clone()),
                score,
            }
        } else {
            StopMatch::miss(score)
        }
    }
}

// =====================================================================
// Character-overlap scorer
// =====================================================================

/// `2 * LCS / (len_a + len_b)` over characters, scaled to 0..100.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapRatio;

impl Scorer for OverlapRatio {
    fn name(&self) -> &'static str {
        "overlap_ratio"
    }

    fn score(&self, query: &str, choice: &str) -> f64 {
        overlap_ratio(query, choice)
    }
}

pub fn overlap_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

// =====================================================================
// Weighted-ratio scorer
// =====================================================================

#[cfg(feature = "fast-match")]
pub use weighted::WeightedRatio;

#[cfg(feature = "fast-match")]
mod weighted {
    use std::collections::BTreeSet;

    use super::Scorer;
    use crate::normalize::words;

    /// Penalty applied to token-based ratios.
    const TOKEN_SCALE: f64 = 0.95;

    /// Weighted ratio: the full ratio for similar lengths, partial (window)
    /// ratios when one string is much shorter than the other, token sort/set
    /// ratios to ignore word order.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WeightedRatio;

    impl Scorer for WeightedRatio {
        fn name(&self) -> &'static str {
            "weighted_ratio"
        }

        fn score(&self, query: &str, choice: &str) -> f64 {
            weighted_ratio(query, choice)
        }
    }

    pub(super) fn weighted_ratio(a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let (la, lb) = (a.chars().count() as f64, b.chars().count() as f64);
        let len_ratio = la.max(lb) / la.min(lb);

        let full = ratio(a, b);
        if len_ratio < 1.5 {
            let token = token_sort_ratio(a, b).max(token_set_ratio(a, b));
            return full.max(token * TOKEN_SCALE);
        }

        let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
        full.max(partial_ratio(a, b) * partial_scale)
            .max(partial_token_ratio(a, b) * TOKEN_SCALE * partial_scale)
    }

    /// Base ratio: Levenshtein distance over the longer length. A single
    /// substitution scores like [`overlap_ratio`](super::overlap_ratio);
    /// insertions and deletions score lower.
    pub(super) fn ratio(a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b) * 100.0
    }

    /// Best ratio of the shorter string against every same-length window
    /// of the longer one.
    pub(super) fn partial_ratio(a: &str, b: &str) -> f64 {
        let (short, long) = if a.chars().count() <= b.chars().count() {
            (a, b)
        } else {
            (b, a)
        };
        let long: Vec<char> = long.chars().collect();
        let m = short.chars().count();
        if m == 0 {
            return 0.0;
        }
        if m == long.len() {
            return ratio(short, &long.iter().collect::<String>());
        }

        let mut best: f64 = 0.0;
        for window in long.windows(m) {
            let window: String = window.iter().collect();
            best = best.max(ratio(short, &window));
            if best >= 100.0 {
                break;
            }
        }
        best
    }

    fn token_sort_ratio(a: &str, b: &str) -> f64 {
        ratio(&sorted_join(words(a)), &sorted_join(words(b)))
    }

    fn token_set_ratio(a: &str, b: &str) -> f64 {
        let ta: BTreeSet<&str> = words(a).into_iter().collect();
        let tb: BTreeSet<&str> = words(b).into_iter().collect();
        let sect: Vec<&str> = ta.intersection(&tb).copied().collect();
        let diff_ab: Vec<&str> = ta.difference(&tb).copied().collect();
        let diff_ba: Vec<&str> = tb.difference(&ta).copied().collect();

        if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
            return 100.0;
        }

        let sect_str = sect.join(" ");
        let with_ab = join_nonempty(&sect_str, &diff_ab.join(" "));
        let with_ba = join_nonempty(&sect_str, &diff_ba.join(" "));

        ratio(&sect_str, &with_ab)
            .max(ratio(&sect_str, &with_ba))
            .max(ratio(&with_ab, &with_ba))
    }

    /// Any shared word is a full partial-token match.
    fn partial_token_ratio(a: &str, b: &str) -> f64 {
        let ta: BTreeSet<&str> = words(a).into_iter().collect();
        let tb: BTreeSet<&str> = words(b).into_iter().collect();
        if ta.is_empty() || tb.is_empty() {
            return 0.0;
        }
        if ta.intersection(&tb).next().is_some() {
            return 100.0;
        }
        let sorted_a = ta.iter().copied().collect::<Vec<_>>().join(" ");
        let sorted_b = tb.iter().copied().collect::<Vec<_>>().join(" ");
        partial_ratio(&sorted_a, &sorted_b)
    }

    fn sorted_join(mut tokens: Vec<&str>) -> String {
        tokens.sort_unstable();
        tokens.join(" ")
    }

    fn join_nonempty(a: &str, b: &str) -> String {
        match (a.is_empty(), b.is_empty()) {
            (true, _) => b.to_string(),
            (_, true) => a.to_string(),
            _ => format!("{a} {b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::StopRecord;
    use indexmap::IndexMap;

    fn matcher() -> FuzzyMatcher {
        FuzzyMatcher::new(Arc::new(Gazetteer::builtin()))
    }

    #[test]
    fn test_canonical_names_match_exactly() {
        let mut cities = IndexMap::new();
        cities.insert(
            "Astana".to_string(),
            vec![
                StopRecord::new("Сарыарка").with_aliases(["Сарыарқа"]),
                StopRecord::new("Байтерек"),
                StopRecord::new("Хан Шатыр"),
            ],
        );
        cities.insert(
            "Almaty".to_string(),
            vec![StopRecord::new("Сайран"), StopRecord::new("Ақсай")],
        );
        let gazetteer = Arc::new(Gazetteer::from_cities(cities));
        let m = FuzzyMatcher::new(Arc::clone(&gazetteer));

        for (city, stops) in gazetteer.cities() {
            for stop in stops {
                let hit = m.best_match(&stop.canonical_name, Some(city), 70);
                assert_eq!(hit.canonical.as_deref(), Some(stop.canonical_name.as_str()));
                assert_eq!(hit.score, 100);
            }
        }
    }

    #[test]
    fn test_exact_substring_in_long_text() {
        let hit = matcher().best_match(
            "Вчера на остановке САРЫАРҚА автобус не остановился",
            Some("Astana"),
            70,
        );
        assert_eq!(hit.canonical.as_deref(), Some("Сарыарка"));
        assert_eq!(hit.score, 100);
    }

    #[test]
    fn test_exact_substring_first_variant_wins() {
        let mut cities = IndexMap::new();
        cities.insert(
            "Astana".to_string(),
            vec![StopRecord::new("Абай"), StopRecord::new("Абай Достық")],
        );
        let m = FuzzyMatcher::new(Arc::new(Gazetteer::from_cities(cities)));
        // both variants are substrings; insertion order decides, not length
        let hit = m.best_match("абай достық қиылысы", None, 70);
        assert_eq!(hit.canonical.as_deref(), Some("Абай"));
    }

    #[test]
    fn test_empty_query_and_empty_scope() {
        assert_eq!(matcher().best_match("", None, 70), StopMatch::miss(0));
        assert_eq!(matcher().best_match(" ?! ", None, 70), StopMatch::miss(0));

        let empty = FuzzyMatcher::new(Arc::new(Gazetteer::from_cities(IndexMap::new())));
        assert_eq!(empty.best_match("Сарыарка", None, 70), StopMatch::miss(0));
    }

    #[test]
    fn test_typo_accepted() {
        let hit = matcher().best_match("сарыорка", Some("Astana"), 70);
        assert_eq!(hit.canonical.as_deref(), Some("Сарыарка"));
        assert_eq!(hit.score, 87);
    }

    #[test]
    fn test_threshold_boundary() {
        let m = matcher();
        let probe = m.best_match("сарыорка", Some("Astana"), 0);
        let score = probe.score;
        assert!(score > 0 && score < 100);

        let at = m.best_match("сарыорка", Some("Astana"), score);
        assert_eq!(at.canonical.as_deref(), Some("Сарыарка"));

        let above = m.best_match("сарыорка", Some("Astana"), score + 1);
        assert_eq!(above.canonical, None);
        // rejected matches still report their score
        assert_eq!(above.score, score);
    }

    #[test]
    fn test_unrelated_text_rejected() {
        let hit = matcher().best_match("xyz", Some("Almaty"), 70);
        assert_eq!(hit.canonical, None);
        assert!(hit.score < 70);
    }

    #[test]
    fn test_overlap_scorer_fallback() {
        let m = FuzzyMatcher::with_scorer(Arc::new(Gazetteer::builtin()), Box::new(OverlapRatio));
        assert_eq!(m.scorer().name(), "overlap_ratio");
        let hit = m.best_match("Сарыорка", Some("Astana"), 70);
        assert_eq!(hit.canonical.as_deref(), Some("Сарыарка"));
        assert_eq!(hit.score, 87);
    }

    #[test]
    fn test_overlap_ratio_values() {
        assert_eq!(overlap_ratio("", ""), 100.0);
        assert_eq!(overlap_ratio("abc", ""), 0.0);
        assert_eq!(overlap_ratio("abcd", "abcd"), 100.0);
        assert_eq!(overlap_ratio("abcd", "abxd"), 75.0);
    }

    #[test]
    fn test_extract_one_keeps_first_on_tie() {
        let best = extract_one(&OverlapRatio, "ab", ["ab", "ba", "ab"]);
        assert_eq!(best, Some((0, 100.0)));
        assert_eq!(extract_one(&OverlapRatio, "ab", std::iter::empty()), None);
    }

    #[cfg(feature = "fast-match")]
    #[test]
    fn test_weighted_ratio_partial_and_tokens() {
        use super::weighted::{partial_ratio, ratio, weighted_ratio};

        assert_eq!(ratio("сайран", "сайран"), 100.0);
        assert_eq!(partial_ratio("сайран", "возле сайран вчера"), 100.0);
        // word order does not matter for similar lengths
        assert!(weighted_ratio("хан шатыр", "шатыр хан") >= 95.0 * 0.95);
        // a shared word in a long text scores as a scaled partial-token match
        let s = weighted_ratio("орталық вокзал", "автобус жоқ вокзал маңында бір сағат күттік");
        assert!(s >= 85.0, "score {s}");
        assert_eq!(weighted_ratio("", "abc"), 0.0);
    }

    #[cfg(feature = "fast-match")]
    #[test]
    fn test_base_ratio_is_levenshtein() {
        use super::weighted::ratio;

        // one inserted letter: 1 edit over 7 chars, against LCS 6 over 13
        let lev = ratio("сайран", "сайрран");
        assert!((lev - 600.0 / 7.0).abs() < 1e-9, "ratio {lev}");
        assert!(lev < overlap_ratio("сайран", "сайрран"));
        // single substitution scores the same under both
        assert!((ratio("сарыорка", "сарыарка") - 87.5).abs() < 1e-9);
        assert!((overlap_ratio("сарыорка", "сарыарка") - 87.5).abs() < 1e-9);
    }
}
