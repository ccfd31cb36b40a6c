use serde::{Deserialize, Serialize};

use crate::{
    rag::RAGError,
    schemas::{ConversationTurn, GradedPassage, Passage},
};

use super::{hallucination::GroundingAssessment, router::RoutingDecision};

/// A reference card for one passage the answer cites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based position in the answer's source list
    pub index: usize,
    pub source_id: String,
    pub title: String,
    /// Page number, or `N/A`
    pub page: String,
    pub url: Option<String>,
    pub excerpt: String,
}

const EXCERPT_CHARS: usize = 200;

impl Citation {
    /// Citation numbered `index`, with the passage text cut to a short excerpt.
    pub fn from_passage(index: usize, passage: &Passage) -> Self {
        let text = passage.text.trim();
        let excerpt = match text.char_indices().nth(EXCERPT_CHARS) {
            Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
            None => text.to_string(),
        };
        Self {
            index,
            source_id: passage.source_id.clone(),
            title: passage.display_title(),
            page: passage.display_page(),
            url: passage.url.clone(),
            excerpt,
        }
    }
}

/// The record threaded through the pipeline graph.
///
/// One exists per invocation. The graph moves it from node to node, so
/// exactly one step owns it at any time.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// Question used for retrieval; replaced by each rewrite
    pub question: String,
    pub original_question: String,
    /// Every rewrite, oldest first
    pub rewrites: Vec<String>,
    pub history: Vec<ConversationTurn>,
    /// Passages fetched by the latest retrieval
    pub candidates: Vec<Passage>,
    /// Graded, filtered, and deduplicated candidates
    pub graded: Vec<GradedPassage>,
    /// Evidence handed to the generator
    pub documents: Vec<Passage>,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub routing: Option<RoutingDecision>,
    pub grounding: Option<GroundingAssessment>,
    pub rewrite_count: usize,
    pub retrieval_errors: Vec<String>,
}

impl PipelineState {
    /// Fresh state for one invocation; the question is kept as the
    /// original even after rewrites.
    pub fn new<S: Into<String>>(question: S, history: Vec<ConversationTurn>) -> Self {
        let question = question.into();
        Self {
            original_question: question.clone(),
            question,
            history,
            ..Default::default()
        }
    }
}

/// Result of one successful invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgenticAnswer {
    pub answer: String,
    /// Evidence the answer was generated from, best first; empty when the
    /// question was answered without retrieval or nothing relevant was found
    pub evidence: Vec<Passage>,
    pub routing: RoutingDecision,
    pub grounding: GroundingAssessment,
    pub citations: Vec<Citation>,
    /// Rewrites tried before generation, oldest first
    pub rewritten_queries: Vec<String>,
    /// Document-store failures the pipeline degraded past
    pub retrieval_errors: Vec<String>,
}

impl AgenticAnswer {
    /// Whether the answer was generated from corpus evidence.
    pub fn has_evidence(&self) -> bool {
        !self.evidence.is_empty()
    }
}

impl TryFrom<PipelineState> for AgenticAnswer {
    type Error = RAGError;

    fn try_from(state: PipelineState) -> Result<Self, Self::Error> {
        let routing = state
            .routing
            .ok_or_else(|| RAGError::IncompleteState("routing decision missing".into()))?;
        let grounding = state
            .grounding
            .ok_or_else(|| RAGError::IncompleteState("grounding assessment missing".into()))?;
        if state.answer.trim().is_empty() {
            return Err(RAGError::IncompleteState("answer missing".into()));
        }
        Ok(Self {
            answer: state.answer,
            evidence: state.documents,
            routing,
            grounding,
            citations: state.citations,
            rewritten_queries: state.rewrites,
            retrieval_errors: state.retrieval_errors,
        })
    }
}
