use std::sync::Arc;

use async_trait::async_trait;

use crate::schemas::Passage;

use super::VectorStoreError;

/// Similarity search over an external passage index.
///
/// Implementations return passages ordered by the store's own relevance,
/// every one scoring at least `score_threshold`, and never more than `k`.
/// Fewer than `k` is normal.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn search(
        &self,
        query: &str,
        score_threshold: f64,
        k: usize,
    ) -> Result<Vec<Passage>, VectorStoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn search(
        &self,
        query: &str,
        score_threshold: f64,
        k: usize,
    ) -> Result<Vec<Passage>, VectorStoreError> {
        self.as_ref().search(query, score_threshold, k).await
    }
}

/// Keep passages scoring at least `score_threshold`, highest first, at most `k`.
///
/// The sort is stable so equal scores keep the store's order.
pub fn apply_score_threshold(
    mut passages: Vec<Passage>,
    score_threshold: f64,
    k: usize,
) -> Vec<Passage> {
    passages.retain(|p| p.retrieval_score >= score_threshold);
    passages.sort_by(|a, b| {
        b.retrieval_score
            .partial_cmp(&a.retrieval_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    passages.truncate(k);
    passages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, score: f64) -> Passage {
        Passage::new(format!("text {}", id), id).with_score(score)
    }

    #[test]
    fn test_apply_score_threshold_filters_and_caps() {
        let passages = vec![
            scored("a", 0.9),
            scored("b", 0.2),
            scored("c", 0.6),
            scored("d", 0.85),
            scored("e", 0.55),
        ];
        let kept = apply_score_threshold(passages, 0.4, 3);
        let ids: Vec<&str> = kept.iter().map(|p| p.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d", "c"]);
    }

    #[test]
    fn test_apply_score_threshold_is_inclusive_and_stable() {
        let passages = vec![scored("a", 0.4), scored("b", 0.4), scored("c", 0.39)];
        let kept = apply_score_threshold(passages, 0.4, 10);
        let ids: Vec<&str> = kept.iter().map(|p| p.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
