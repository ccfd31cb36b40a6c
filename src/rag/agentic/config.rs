use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rag::RAGError;

use super::glossary::default_glossary;

/// Tunables for the agentic pipeline.
///
/// Every threshold here is a starting point rather than a measured optimum;
/// all of them can be overridden from the `[pipeline]` section of the
/// settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgenticRAGConfig {
    /// Minimum document-store similarity for a candidate passage
    pub score_threshold: f64,
    /// Maximum candidates fetched per retrieval
    pub max_candidates: usize,
    /// Graded passages at or below this relevance are dropped
    pub relevance_threshold: f64,
    /// Candidates this similar to an already-selected passage are dropped
    pub diversity_threshold: f64,
    /// Maximum passages handed to the generator
    pub max_docs: usize,
    /// Maximum query rewrites per invocation
    pub max_rewrites: usize,
    /// Timeout applied to every external call, in milliseconds
    pub call_timeout_ms: u64,
    /// Passages graded in parallel
    pub grading_concurrency: usize,
    /// Conversation turns included in prompts
    pub history_window: usize,
    /// Abort on document-store failure instead of answering without evidence
    pub strict_retrieval: bool,
    /// Acronym -> expansion, injected into routing and rewriting
    pub glossary: BTreeMap<String, String>,
}

impl Default for AgenticRAGConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.4,
            max_candidates: 15,
            relevance_threshold: 0.3,
            diversity_threshold: 0.7,
            max_docs: 8,
            max_rewrites: 2,
            call_timeout_ms: 60_000,
            grading_concurrency: 4,
            history_window: 6,
            strict_retrieval: false,
            glossary: default_glossary(),
        }
    }
}

impl AgenticRAGConfig {
    /// Timeout for every store and model call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn with_max_rewrites(mut self, max_rewrites: usize) -> Self {
        self.max_rewrites = max_rewrites;
        self
    }

    pub fn with_max_docs(mut self, max_docs: usize) -> Self {
        self.max_docs = max_docs;
        self
    }

    pub fn with_diversity_threshold(mut self, threshold: f64) -> Self {
        self.diversity_threshold = threshold;
        self
    }

    pub fn with_relevance_threshold(mut self, threshold: f64) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Stored at millisecond precision. Anything under one millisecond
    /// becomes zero and fails [`validate`](Self::validate).
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_strict_retrieval(mut self, strict: bool) -> Self {
        self.strict_retrieval = strict;
        self
    }

    /// Node executions needed by the longest legal run: route, then
    /// `max_rewrites + 1` retrieve/grade rounds with a rewrite between each,
    /// then generate and check.
    pub fn recursion_limit(&self) -> usize {
        3 * self.max_rewrites + 5
    }

    /// Reject thresholds outside `[0, 1]` and zero-sized limits.
    pub fn validate(&self) -> Result<(), RAGError> {
        for (name, value) in [
            ("score_threshold", self.score_threshold),
            ("relevance_threshold", self.relevance_threshold),
            ("diversity_threshold", self.diversity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RAGError::InvalidConfiguration(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("max_candidates", self.max_candidates),
            ("max_docs", self.max_docs),
            ("grading_concurrency", self.grading_concurrency),
        ] {
            if value == 0 {
                return Err(RAGError::InvalidConfiguration(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        if self.call_timeout_ms == 0 {
            return Err(RAGError::InvalidConfiguration(
                "call_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AgenticRAGConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_rewrites, 2);
        assert_eq!(config.recursion_limit(), 11);
        assert_eq!(config.glossary.get("BCO").map(String::as_str), Some("Book of Church Order"));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = AgenticRAGConfig::default().with_diversity_threshold(1.5);
        assert!(matches!(
            config.validate(),
            Err(RAGError::InvalidConfiguration(_))
        ));
        let config = AgenticRAGConfig::default().with_max_docs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_call_timeout_keeps_sub_second_precision() {
        let config = AgenticRAGConfig::default().with_call_timeout(Duration::from_millis(1500));
        assert_eq!(config.call_timeout(), Duration::from_millis(1500));
        assert!(config.validate().is_ok());

        let config = AgenticRAGConfig::default().with_call_timeout(Duration::from_micros(200));
        assert_eq!(config.call_timeout_ms, 0);
        assert!(config.validate().is_err());

        assert_eq!(AgenticRAGConfig::default().call_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AgenticRAGConfig = toml::from_str("max_rewrites = 1\nmax_docs = 4").unwrap();
        assert_eq!(config.max_rewrites, 1);
        assert_eq!(config.max_docs, 4);
        assert_eq!(config.score_threshold, 0.4);
    }
}
