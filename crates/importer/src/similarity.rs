//! Name similarity scoring used when deciding whether two spellings refer to
//! the same club.

use serde::{Deserialize, Serialize};

use crate::normalize::comparison_key;

/// A similarity measure in `[0, 1]`, 1 meaning identical.
pub trait SimilarityStrategy {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Ratcliff/Obershelp ratio `2 * M / T`, where `M` counts characters in
/// matching blocks and `T` is the combined length. The longest common block
/// is taken first (earliest on ties), then both sides of it recursively.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceMatcher;

impl SequenceMatcher {
    pub fn ratio(a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * matching_characters(&a, &b) as f64 / total as f64
    }
}

impl SimilarityStrategy for SequenceMatcher {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        Self::ratio(a, b)
    }
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as
/// `(start in a, start in b, length)`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // lengths[x] is the run ending at b[blo + x - 1] in the previous row.
    let mut lengths = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        let mut current = vec![0usize; bhi - blo + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let run = lengths[j - blo] + 1;
                current[j - blo + 1] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            }
        }
        lengths = current;
    }

    best
}

/// Jaro-Winkler similarity. Kept as an alternative for experiments; the club
/// policy defaults to [`SequenceMatcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl SimilarityStrategy for JaroWinkler {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }
}

/// Tunable constants of the club merge policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityThresholds {
    /// Scores at or above this merge two clubs.
    pub merge: f64,
    /// A contained name must be at least this share of the longer one.
    pub prefix_length_ratio: f64,
    /// ...and at least this many characters long.
    pub prefix_min_chars: usize,
    /// Score given to a contained name meeting both limits.
    pub prefix_similarity: f64,
    /// Score given when the longer name continues the shorter one with
    /// another word ("Sports Academy" / "Sports Academy Strizhi").
    pub suffix_word_similarity: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            merge: 0.85,
            prefix_length_ratio: 0.90,
            prefix_min_chars: 10,
            prefix_similarity: 0.95,
            suffix_word_similarity: 0.70,
        }
    }
}

impl SimilarityThresholds {
    pub fn is_merge(&self, score: f64) -> bool {
        score >= self.merge
    }
}

/// Club name policy: names are compared case-insensitively after
/// normalization and Latin look-alike repair, with containment overrides in
/// front of the inner strategy.
#[derive(Debug, Clone, Default)]
pub struct ClubNameSimilarity<S = SequenceMatcher> {
    inner: S,
    thresholds: SimilarityThresholds,
}

impl<S: SimilarityStrategy> ClubNameSimilarity<S> {
    pub fn new(inner: S, thresholds: SimilarityThresholds) -> Self {
        Self { inner, thresholds }
    }

    pub fn thresholds(&self) -> &SimilarityThresholds {
        &self.thresholds
    }

    pub fn is_match(&self, a: &str, b: &str) -> bool {
        self.thresholds.is_merge(self.similarity(a, b))
    }

    fn containment_score(&self, a: &str, b: &str) -> Option<f64> {
        let (shorter, longer) = if a.chars().count() < b.chars().count() {
            (a, b)
        } else {
            (b, a)
        };
        if !longer.contains(shorter) {
            return None;
        }

        if let Some(rest) = longer.strip_prefix(shorter) {
            if rest.split_whitespace().any(|word| word.chars().any(char::is_alphanumeric)) {
                return Some(self.thresholds.suffix_word_similarity);
            }
        }

        let shorter_len = shorter.chars().count();
        let longer_len = longer.chars().count();
        let ratio = shorter_len as f64 / longer_len as f64;
        if longer_len > 0
            && ratio >= self.thresholds.prefix_length_ratio
            && shorter_len >= self.thresholds.prefix_min_chars
        {
            return Some(self.thresholds.prefix_similarity);
        }
        None
    }
}

impl<S: SimilarityStrategy> SimilarityStrategy for ClubNameSimilarity<S> {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a = comparison_key(a);
        let b = comparison_key(b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }
        self.containment_score(&a, &b)
            .unwrap_or_else(|| self.inner.similarity(&a, &b))
    }
}
