use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    schemas::{Passage, Retriever},
    utils::with_timeout,
    vectorstore::DocumentStore,
};

use super::RetrieverError;

pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.4;
pub const DEFAULT_MAX_CANDIDATES: usize = 15;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Retriever that thresholds and caps document-store similarity search.
#[derive(Clone)]
pub struct VectorStoreRetriever {
    store: Arc<dyn DocumentStore>,
    score_threshold: f64,
    max_candidates: usize,
    timeout: Duration,
}

impl VectorStoreRetriever {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_score_threshold(mut self, score_threshold: f64) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Retriever for VectorStoreRetriever {
    async fn get_relevant_passages(&self, query: &str) -> Result<Vec<Passage>, RetrieverError> {
        let mut passages = with_timeout(self.timeout, async {
            self.store
                .search(query, self.score_threshold, self.max_candidates)
                .await
                .map_err(RetrieverError::from)
        })
        .await?;

        // Stores may ignore threshold and k.
        passages.retain(|p| p.retrieval_score >= self.score_threshold);
        passages.truncate(self.max_candidates);
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorstore::VectorStoreError;

    struct StaticStore {
        passages: Vec<Passage>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl DocumentStore for StaticStore {
        async fn search(
            &self,
            _query: &str,
            _score_threshold: f64,
            _k: usize,
        ) -> Result<Vec<Passage>, VectorStoreError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            // Ignores threshold and k on purpose.
            Ok(self.passages.clone())
        }
    }

    fn passages(scores: &[f64]) -> Vec<Passage> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| Passage::new(format!("passage {}", i), format!("p{}", i)).with_score(*s))
            .collect()
    }

    #[tokio::test]
    async fn test_retriever_enforces_threshold_and_cap() {
        let store = StaticStore {
            passages: passages(&[0.9, 0.85, 0.6, 0.55, 0.2]),
            delay: None,
        };
        let retriever = VectorStoreRetriever::new(Arc::new(store)).with_max_candidates(3);
        let result = retriever.get_relevant_passages("ordination").await.unwrap();
        let scores: Vec<f64> = result.iter().map(|p| p.retrieval_score).collect();
        assert_eq!(scores, vec![0.9, 0.85, 0.6]);
    }

    #[tokio::test]
    async fn test_retriever_times_out() {
        let store = StaticStore {
            passages: passages(&[0.9]),
            delay: Some(Duration::from_millis(200)),
        };
        let retriever =
            VectorStoreRetriever::new(Arc::new(store)).with_timeout(Duration::from_millis(10));
        let err = retriever.get_relevant_passages("q").await.unwrap_err();
        assert!(matches!(err, RetrieverError::TimeoutError(_)));
    }
}
