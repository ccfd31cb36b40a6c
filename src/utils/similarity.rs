//! Lexical similarity used for evidence deduplication.

use std::collections::HashSet;

/// Case-folded whitespace tokens of `text`.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Jaccard similarity of two token sets.
///
/// Two empty sets have similarity 0.0, so blank passages never count as
/// duplicates of each other.
pub fn jaccard(words1: &HashSet<String>, words2: &HashSet<String>) -> f64 {
    let intersection = words1.intersection(words2).count();
    let union = words1.union(words2).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Jaccard similarity of the case-folded whitespace tokens of two texts.
///
/// # Example
/// ```rust
/// use clerk_rag::utils::text_similarity;
///
/// let similarity = text_similarity("Teaching Elder", "teaching elder");
/// assert!((similarity - 1.0).abs() < 1e-10);
/// ```
pub fn text_similarity(text1: &str, text2: &str) -> f64 {
    jaccard(&word_set(text1), &word_set(text2))
}
