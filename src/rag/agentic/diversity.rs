use std::collections::HashSet;

use crate::{
    schemas::GradedPassage,
    utils::{jaccard, word_set},
};

/// Drop near-duplicates from a ranked list.
///
/// Walks `ranked` in order and keeps a candidate only while fewer than
/// `max_docs` are selected and its token similarity to every selected
/// passage is strictly below `threshold`. The first passage is always kept
/// when `max_docs > 0`. Output order is input order.
pub fn diversity_filter(
    ranked: Vec<GradedPassage>,
    threshold: f64,
    max_docs: usize,
) -> Vec<GradedPassage> {
    let mut selected: Vec<(GradedPassage, HashSet<String>)> = Vec::new();

    for candidate in ranked {
        if selected.len() >= max_docs {
            break;
        }
        let words = word_set(&candidate.passage.text);
        if selected
            .iter()
            .all(|(_, kept)| jaccard(&words, kept) < threshold)
        {
            selected.push((candidate, words));
        } else {
            log::debug!(
                "diversity filter dropped near-duplicate {}",
                candidate.passage.source_id
            );
        }
    }

    selected.into_iter().map(|(passage, _)| passage).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schemas::{PassLabel, Passage},
        utils::text_similarity,
    };

    fn graded(id: &str, text: &str, score: f64) -> GradedPassage {
        GradedPassage::new(Passage::new(text, id), PassLabel::Yes, score)
    }

    #[test]
    fn test_drops_near_duplicates() {
        let ranked = vec![
            graded("a", "ordination requires examination by presbytery", 0.9),
            graded("b", "ordination requires examination by the presbytery", 0.85),
            graded("c", "ruling elders are elected by the congregation", 0.6),
        ];
        let kept = diversity_filter(ranked, 0.7, 8);
        let ids: Vec<&str> = kept.iter().map(|g| g.passage.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_respects_cap() {
        let ranked = vec![
            graded("a", "one", 0.9),
            graded("b", "two", 0.8),
            graded("c", "three", 0.7),
        ];
        assert_eq!(diversity_filter(ranked.clone(), 0.7, 2).len(), 2);
        assert!(diversity_filter(ranked, 0.7, 0).is_empty());
    }

    #[test]
    fn test_exact_threshold_is_rejected() {
        // {a b c} vs {a b d}: 2 / 4 = 0.5
        let ranked = vec![graded("x", "a b c", 0.9), graded("y", "a b d", 0.8)];
        assert_eq!(diversity_filter(ranked.clone(), 0.5, 8).len(), 1);
        assert_eq!(diversity_filter(ranked, 0.51, 8).len(), 2);
    }

    #[test]
    fn test_blank_passages_are_not_duplicates() {
        let ranked = vec![graded("x", "", 0.9), graded("y", "  ", 0.8)];
        assert_eq!(diversity_filter(ranked, 0.7, 8).len(), 2);
    }

    /// Deterministic generator for the property checks below.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }
    }

    #[test]
    fn test_properties_hold_for_generated_sets() {
        let vocabulary = ["church", "order", "elder", "session", "presbytery", "vote", "court"];
        let mut rng = Lcg(42);

        for round in 0..200 {
            let count = (rng.next() % 12) as usize;
            let mut ranked: Vec<GradedPassage> = (0..count)
                .map(|i| {
                    let len = (rng.next() % 5) as usize + 1;
                    let text: Vec<&str> = (0..len)
                        .map(|_| vocabulary[(rng.next() % vocabulary.len() as u64) as usize])
                        .collect();
                    let score = (rng.next() % 100) as f64 / 100.0;
                    graded(&format!("{}-{}", round, i), &text.join(" "), score)
                })
                .collect();
            ranked.sort_by(|a, b| b.relevance_score.partial_cmp(&a.relevance_score).unwrap());

            let threshold = 0.3 + (rng.next() % 60) as f64 / 100.0;
            let max_docs = (rng.next() % 6) as usize;
            let kept = diversity_filter(ranked, threshold, max_docs);

            assert!(kept.len() <= max_docs);
            for (i, a) in kept.iter().enumerate() {
                for b in kept.iter().skip(i + 1) {
                    assert!(text_similarity(&a.passage.text, &b.passage.text) < threshold);
                }
            }
            assert!(kept
                .windows(2)
                .all(|w| w[0].relevance_score >= w[1].relevance_score));
        }
    }
}
