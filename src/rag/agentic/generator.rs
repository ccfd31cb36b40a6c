use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    language_models::{generate_with_timeout, invoke_structured, llm::LLM, LLMError},
    rag::RAGError,
    schemas::{ConversationTurn, Message, Passage, StructuredOutputSchema},
};

use super::{
    prompts::{evidence_answer_messages, general_answer_messages, greeting_messages},
    router::QueryType,
    state::Citation,
};

/// Prepended to answers whose library search found no usable evidence.
pub const NO_EVIDENCE_NOTICE: &str = "Note: I couldn't find PCA documents that address this \
question, so this answer is not grounded in the document library. Please verify it against \
official PCA sources.";

/// Prepended to answers for routes that never searched the library.
pub const GENERAL_KNOWLEDGE_NOTICE: &str = "Note: this answer draws on general knowledge rather \
than the PCA document library. Please verify it against official PCA sources.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceRef {
    /// Identifier shown in brackets before the source text
    pub document_id: String,
}

/// Structured reply for the evidence-grounded template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerWithSources {
    pub answer: String,
    /// Sources the answer relied on
    pub sources: Vec<SourceRef>,
}

impl StructuredOutputSchema for AnswerWithSources {
    fn schema_description() -> Option<String> {
        Some("An answer and the ids of the sources it relies on".to_string())
    }
}

/// Answer text plus the citations resolved against the supplied evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Writes the final answer.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// `library_searched` tells an evidence-free answer apart: a search that
    /// found nothing versus a route that never searched.
    async fn generate(
        &self,
        question: &str,
        evidence: &[Passage],
        history: &[ConversationTurn],
        query_type: QueryType,
        library_searched: bool,
    ) -> Result<GeneratedAnswer, RAGError>;
}

/// Generator with three templates: a short greeting, an evidence-grounded
/// answer with cited sources, and a disclosed general-knowledge answer.
pub struct LLMAnswerGenerator {
    llm: Arc<dyn LLM>,
    history_window: usize,
    timeout: Duration,
}

impl LLMAnswerGenerator {
    /// Generator with a six-turn history window and a 60 second timeout.
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self {
            llm,
            history_window: 6,
            timeout: Duration::from_secs(60),
        }
    }

    /// Number of trailing conversation turns included in each template.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Deadline for one generation call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn free_text(&self, messages: &[Message]) -> Result<String, RAGError> {
        let result = generate_with_timeout(self.llm.as_ref(), messages, self.timeout)
            .await
            .map_err(RAGError::Generation)?;
        non_empty(result.generation)
    }
}

fn non_empty(answer: String) -> Result<String, RAGError> {
    let answer = answer.trim().to_string();
    if answer.is_empty() {
        return Err(RAGError::Generation(LLMError::ContentNotFound(
            "model returned an empty answer".to_string(),
        )));
    }
    Ok(answer)
}

/// Resolve cited ids against the evidence that was actually supplied.
///
/// Ids not in `evidence` are dropped; repeated ids collapse to their first
/// mention. Citations are numbered in the order the model listed them.
pub fn resolve_citations(sources: &[SourceRef], evidence: &[Passage]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    let mut citations = Vec::new();
    for source in sources {
        let id = source.document_id.trim();
        if !seen.insert(id.to_string()) {
            continue;
        }
        match evidence.iter().find(|p| p.source_id == id) {
            Some(passage) => {
                citations.push(Citation::from_passage(citations.len() + 1, passage))
            }
            None => log::warn!("answer cited unknown source id '{}'; dropped", id),
        }
    }
    citations
}

#[async_trait]
impl AnswerGenerator for LLMAnswerGenerator {
    async fn generate(
        &self,
        question: &str,
        evidence: &[Passage],
        history: &[ConversationTurn],
        query_type: QueryType,
        library_searched: bool,
    ) -> Result<GeneratedAnswer, RAGError> {
        if query_type == QueryType::Greeting {
            let messages = greeting_messages(question, history, self.history_window);
            return Ok(GeneratedAnswer {
                answer: self.free_text(&messages).await?,
                citations: Vec::new(),
            });
        }

        if evidence.is_empty() {
            let messages = general_answer_messages(question, history, self.history_window);
            let answer = self.free_text(&messages).await?;
            let notice = if library_searched {
                NO_EVIDENCE_NOTICE
            } else {
                GENERAL_KNOWLEDGE_NOTICE
            };
            return Ok(GeneratedAnswer {
                answer: format!("{}\n\n{}", notice, answer),
                citations: Vec::new(),
            });
        }

        let messages =
            evidence_answer_messages(question, evidence, history, self.history_window);
        let reply: AnswerWithSources =
            invoke_structured(self.llm.as_ref(), &messages, self.timeout)
                .await
                .map_err(RAGError::Generation)?;

        Ok(GeneratedAnswer {
            answer: non_empty(reply.answer)?,
            citations: resolve_citations(&reply.sources, evidence),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{llm::FakeLLM, rag::agentic::prompts::{EVIDENCE_ANSWER_HEADER, GREETING_HEADER}};

    fn evidence() -> Vec<Passage> {
        vec![
            Passage::new("Ordination is by presbytery.", "bco-21")
                .with_title("Book of Church Order")
                .with_page(21),
            Passage::new("Elders are elected by the congregation.", "bco-24"),
        ]
    }

    #[tokio::test]
    async fn test_greeting_template_ignores_evidence() {
        let llm = FakeLLM::new(vec!["Hello! How can I help with the PCA today?"]);
        let generator = LLMAnswerGenerator::new(Arc::new(llm.clone()));
        let answer = generator
            .generate("hello", &evidence(), &[], QueryType::Greeting, false)
            .await
            .unwrap();
        assert_eq!(answer.answer, "Hello! How can I help with the PCA today?");
        assert!(answer.citations.is_empty());
        assert!(llm.calls()[0][0].content.starts_with(GREETING_HEADER));
    }

    #[tokio::test]
    async fn test_no_evidence_answer_is_disclosed() {
        let llm = FakeLLM::new(vec!["Grace is unmerited favor."]);
        let generator = LLMAnswerGenerator::new(Arc::new(llm));
        let answer = generator
            .generate("What is grace?", &[], &[], QueryType::GeneralTheology, true)
            .await
            .unwrap();
        assert!(answer.answer.starts_with(NO_EVIDENCE_NOTICE));
        assert!(answer.answer.ends_with("Grace is unmerited favor."));
    }

    #[tokio::test]
    async fn test_unsearched_answer_does_not_claim_a_failed_search() {
        let llm = FakeLLM::new(vec!["Grace is unmerited favor."]);
        let generator = LLMAnswerGenerator::new(Arc::new(llm));
        let answer = generator
            .generate("What is grace?", &[], &[], QueryType::GeneralTheology, false)
            .await
            .unwrap();
        assert!(answer.answer.starts_with(GENERAL_KNOWLEDGE_NOTICE));
        assert!(!answer.answer.contains(NO_EVIDENCE_NOTICE));
        assert!(answer.answer.ends_with("Grace is unmerited favor."));
    }

    #[tokio::test]
    async fn test_evidence_answer_resolves_citations() {
        let llm = FakeLLM::new(vec![
            r#"{"answer": "Presbytery ordains.", "sources": [{"document_id": "bco-21"}, {"document_id": "made-up"}, {"document_id": "bco-21"}]}"#,
        ]);
        let generator = LLMAnswerGenerator::new(Arc::new(llm.clone()));
        let answer = generator
            .generate("Who ordains?", &evidence(), &[], QueryType::PcaSpecific, true)
            .await
            .unwrap();
        assert_eq!(answer.answer, "Presbytery ordains.");
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].index, 1);
        assert_eq!(answer.citations[0].title, "Book of Church Order");
        assert_eq!(answer.citations[0].page, "21");
        let system = &llm.calls()[0][0].content;
        assert!(system.starts_with(EVIDENCE_ANSWER_HEADER));
        assert!(system.contains("[bco-24]"));
    }

    #[tokio::test]
    async fn test_empty_answer_is_model_failure() {
        let llm = FakeLLM::new(vec![r#"{"answer": "  ", "sources": []}"#]);
        let generator = LLMAnswerGenerator::new(Arc::new(llm));
        let err = generator
            .generate("Who ordains?", &evidence(), &[], QueryType::PcaSpecific, true)
            .await
            .unwrap_err();
        assert!(matches!(err, RAGError::Generation(LLMError::ContentNotFound(_))));
    }
}
