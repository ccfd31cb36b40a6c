use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    language_models::{invoke_structured, llm::LLM},
    rag::RAGError,
    schemas::{ConversationTurn, StructuredOutputSchema},
};

use super::{glossary::Glossary, prompts::router_messages};

/// Intent of a question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueryType {
    Greeting,
    GeneralTheology,
    PcaSpecific,
    Meta,
}

/// The router's verdict on a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoutingDecision {
    /// Whether the document library must be searched
    pub needs_retrieval: bool,
    pub query_type: QueryType,
    /// One sentence explaining the decision
    pub rationale: String,
}

impl RoutingDecision {
    /// Whether the pipeline searches the library for this route.
    ///
    /// Greetings never search, even when the model also set `needs_retrieval`.
    pub fn searches_library(&self) -> bool {
        self.needs_retrieval && self.query_type != QueryType::Greeting
    }
}

impl StructuredOutputSchema for RoutingDecision {
    fn schema_description() -> Option<String> {
        Some("Whether a question needs document retrieval, and its intent".to_string())
    }
}

/// Decides whether a question needs retrieval.
#[async_trait]
pub trait QueryRouter: Send + Sync {
    async fn route(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<RoutingDecision, RAGError>;
}

/// Router backed by one schema-constrained model call.
///
/// There is no fallback route: a failed or unparseable call is a
/// [`RAGError::Routing`].
pub struct LLMQueryRouter {
    llm: Arc<dyn LLM>,
    glossary: Glossary,
    history_window: usize,
    timeout: Duration,
}

impl LLMQueryRouter {
    /// Router with the built-in glossary, a six-turn history window and a
    /// 60 second call timeout.
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self {
            llm,
            glossary: Glossary::default(),
            history_window: 6,
            timeout: Duration::from_secs(60),
        }
    }

    /// Replace the glossary rendered into the routing prompt.
    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    /// Number of trailing conversation turns shown to the model.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Deadline for the routing call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl QueryRouter for LLMQueryRouter {
    async fn route(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<RoutingDecision, RAGError> {
        let messages = router_messages(
            question,
            history,
            self.history_window,
            &self.glossary.prompt_block(),
        );
        let decision: RoutingDecision =
            invoke_structured(self.llm.as_ref(), &messages, self.timeout)
                .await
                .map_err(RAGError::Routing)?;

        log::info!(
            "routed question as {} (needs_retrieval={})",
            decision.query_type,
            decision.needs_retrieval
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{language_models::LLMError, llm::FakeLLM, rag::ErrorKind};

    #[test]
    fn test_greeting_never_searches_library() {
        let decision = |needs_retrieval, query_type| RoutingDecision {
            needs_retrieval,
            query_type,
            rationale: String::new(),
        };
        assert!(!decision(true, QueryType::Greeting).searches_library());
        assert!(!decision(false, QueryType::PcaSpecific).searches_library());
        assert!(decision(true, QueryType::PcaSpecific).searches_library());
    }

    #[tokio::test]
    async fn test_router_parses_decision() {
        let llm = FakeLLM::new(vec![
            r#"{"needs_retrieval": false, "query_type": "greeting", "rationale": "small talk"}"#,
        ]);
        let router = LLMQueryRouter::new(Arc::new(llm));
        let decision = router.route("hello", &[]).await.unwrap();
        assert!(!decision.needs_retrieval);
        assert_eq!(decision.query_type, QueryType::Greeting);
    }

    #[tokio::test]
    async fn test_router_is_stable_for_deterministic_model() {
        let llm = FakeLLM::from_fn(|messages| {
            let asks_about_bco = messages
                .last()
                .map(|m| m.content.contains("Book of Church Order"))
                .unwrap_or(false);
            Ok(format!(
                r#"{{"needs_retrieval": {}, "query_type": "{}", "rationale": "r"}}"#,
                asks_about_bco,
                if asks_about_bco { "pca_specific" } else { "general_theology" }
            ))
        });
        let router = LLMQueryRouter::new(Arc::new(llm.clone()));
        let history = vec![ConversationTurn::user("hi"), ConversationTurn::assistant("hello")];
        let question = "What does the Book of Church Order say about ordination?";

        let first = router.route(question, &history).await.unwrap();
        let second = router.route(question, &history).await.unwrap();
        assert_eq!(first, second);
        assert!(first.needs_retrieval);
        let calls = llm.calls();
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn test_router_failure_is_fatal() {
        let llm = FakeLLM::from_fn(|_| Err(LLMError::OtherError("model offline".into())));
        let router = LLMQueryRouter::new(Arc::new(llm));
        let err = router.route("hello", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoutingFailure);
    }

    #[tokio::test]
    async fn test_router_rejects_unknown_query_type() {
        let llm = FakeLLM::new(vec![
            r#"{"needs_retrieval": true, "query_type": "weather", "rationale": "?"}"#,
        ]);
        let router = LLMQueryRouter::new(Arc::new(llm));
        let err = router.route("is it raining", &[]).await.unwrap_err();
        assert!(matches!(err, RAGError::Routing(LLMError::ParsingError(_))));
    }
}
