//! Word-overlap near-duplicate check.

use std::collections::HashSet;

/// Share of the smaller word set that must overlap for two texts to match.
const OVERLAP_RATIO: f64 = 0.7;

/// Whether `a` and `b` share more than 70% of the smaller one's words.
///
/// Words are lower-cased, whitespace-separated tokens; punctuation stays
/// attached. Two empty strings are not similar.
pub fn is_similar(a: &str, b: &str) -> bool {
    let words_a = word_set(a);
    let words_b = word_set(b);

    let overlap = words_a.intersection(&words_b).count();
    let smaller = words_a.len().min(words_b.len());

    overlap as f64 > smaller as f64 * OVERLAP_RATIO
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
