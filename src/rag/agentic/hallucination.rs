use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    language_models::{invoke_structured, llm::LLM},
    rag::RAGError,
    schemas::{Passage, StructuredOutputSchema},
};

use super::prompts::grounding_messages;

/// Whether an answer's claims are traceable to its evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroundingAssessment {
    pub is_grounded: bool,
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    /// Unsupported claims, empty if none
    pub issues: String,
}

impl GroundingAssessment {
    /// Assessment for answers written without evidence. They were never
    /// asked to be grounded, so they are not penalised for it.
    pub fn no_evidence() -> Self {
        Self {
            is_grounded: true,
            confidence: 0.7,
            issues: "no evidence available".to_string(),
        }
    }
}

impl StructuredOutputSchema for GroundingAssessment {}

#[async_trait]
pub trait HallucinationChecker: Send + Sync {
    async fn check(
        &self,
        question: &str,
        answer: &str,
        evidence: &[Passage],
    ) -> Result<GroundingAssessment, RAGError>;
}

/// Checker that asks the model whether the answer is supported by the
/// evidence. Answers without evidence are never sent to the model.
pub struct LLMHallucinationChecker {
    llm: Arc<dyn LLM>,
    timeout: Duration,
}

impl LLMHallucinationChecker {
    /// Checker with a 60 second call timeout.
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self {
            llm,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl HallucinationChecker for LLMHallucinationChecker {
    async fn check(
        &self,
        question: &str,
        answer: &str,
        evidence: &[Passage],
    ) -> Result<GroundingAssessment, RAGError> {
        if evidence.is_empty() {
            return Ok(GroundingAssessment::no_evidence());
        }

        let messages = grounding_messages(question, answer, evidence);
        let assessment: GroundingAssessment =
            invoke_structured(self.llm.as_ref(), &messages, self.timeout)
                .await
                .map_err(RAGError::GroundingCheck)?;

        log::info!(
            "grounding check: grounded={} confidence={:.2}",
            assessment.is_grounded,
            assessment.confidence
        );
        Ok(assessment)
    }
}
