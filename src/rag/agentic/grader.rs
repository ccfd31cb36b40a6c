use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    language_models::{invoke_structured, llm::LLM},
    rag::RAGError,
    schemas::{GradedPassage, PassLabel, Passage, StructuredOutputSchema},
};

use super::prompts::grader_messages;

/// Model verdict on a single passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RelevanceGrade {
    /// "yes" if the passage helps answer the question
    pub score: PassLabel,
    #[schemars(range(min = 0.0, max = 1.0))]
    pub relevance_score: f64,
    pub rationale: String,
}

impl StructuredOutputSchema for RelevanceGrade {}

/// Grades one passage against a question.
#[async_trait]
pub trait RelevanceGrader: Send + Sync {
    async fn grade(&self, question: &str, passage: &Passage) -> Result<GradedPassage, RAGError>;
}

/// Grader backed by one schema-constrained model call per passage.
pub struct LLMRelevanceGrader {
    llm: Arc<dyn LLM>,
    timeout: Duration,
}

impl LLMRelevanceGrader {
    /// Grader with a 60 second call timeout.
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self {
            llm,
            timeout: Duration::from_secs(60),
        }
    }

    /// Deadline for one grading call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl RelevanceGrader for LLMRelevanceGrader {
    async fn grade(&self, question: &str, passage: &Passage) -> Result<GradedPassage, RAGError> {
        let messages = grader_messages(question, passage);
        let grade: RelevanceGrade = invoke_structured(self.llm.as_ref(), &messages, self.timeout)
            .await
            .map_err(RAGError::Grading)?;

        Ok(
            GradedPassage::new(passage.clone(), grade.score, grade.relevance_score)
                .with_rationale(grade.rationale),
        )
    }
}

/// Grade every passage, keep the ones labelled yes with relevance above
/// `relevance_threshold`, and rank them by relevance.
///
/// Up to `concurrency` grading calls run at once; results keep input order
/// before ranking, so equal relevance falls back to retrieval order. The
/// first grading failure aborts the whole batch.
pub async fn grade_passages(
    grader: &dyn RelevanceGrader,
    question: &str,
    passages: &[Passage],
    relevance_threshold: f64,
    concurrency: usize,
) -> Result<Vec<GradedPassage>, RAGError> {
    let pending: Vec<_> = passages
        .iter()
        .map(|passage| grader.grade(question, passage))
        .collect();
    let graded: Vec<GradedPassage> = stream::iter(pending)
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut survivors: Vec<GradedPassage> = graded
        .into_iter()
        .filter(|g| g.pass_label == PassLabel::Yes && g.relevance_score > relevance_threshold)
        .collect();

    survivors.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    log::debug!(
        "graded {} passages, {} passed relevance {}",
        passages.len(),
        survivors.len(),
        relevance_threshold
    );
    Ok(survivors)
}
