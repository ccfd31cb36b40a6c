use thiserror::Error;

use crate::{
    langgraph::LangGraphError, language_models::LLMError, retrievers::RetrieverError,
};

/// Broad failure categories reported to callers of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Document store unreachable, timed out, or returned a malformed response
    RetrievalFailure,
    /// Language model unreachable, timed out, or returned unparseable output
    ModelFailure,
    /// The routing step failed; there is no safe default route
    RoutingFailure,
    /// Query tracking failed; never surfaced by `answer`
    TelemetryFailure,
    InvalidInput,
    InvalidConfiguration,
    Internal,
}

/// RAG-specific error types
#[derive(Error, Debug)]
pub enum RAGError {
    #[error("Routing failed: {0}")]
    Routing(#[source] LLMError),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrieverError),

    #[error("Relevance grading failed: {0}")]
    Grading(#[source] LLMError),

    #[error("Query rewrite failed: {0}")]
    Rewrite(#[source] LLMError),

    #[error("Answer generation failed: {0}")]
    Generation(#[source] LLMError),

    #[error("Grounding check failed: {0}")]
    GroundingCheck(#[source] LLMError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Graph error: {0}")]
    Graph(LangGraphError),

    #[error("Pipeline finished in an incomplete state: {0}")]
    IncompleteState(String),
}

impl RAGError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RAGError::Routing(_) => ErrorKind::RoutingFailure,
            RAGError::Retrieval(_) => ErrorKind::RetrievalFailure,
            RAGError::Grading(_)
            | RAGError::Rewrite(_)
            | RAGError::Generation(_)
            | RAGError::GroundingCheck(_) => ErrorKind::ModelFailure,
            RAGError::InvalidInput(_) => ErrorKind::InvalidInput,
            RAGError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            RAGError::Graph(_) | RAGError::IncompleteState(_) => ErrorKind::Internal,
        }
    }

    /// Short message suitable for showing to the person who asked.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::RoutingFailure => {
                "I couldn't work out how to handle that question. Please try again."
            }
            ErrorKind::RetrievalFailure => {
                "The document library is unavailable right now. Please try again shortly."
            }
            ErrorKind::ModelFailure => {
                "The language model failed to respond. Please try again shortly."
            }
            ErrorKind::InvalidInput => "Please enter a question.",
            ErrorKind::TelemetryFailure
            | ErrorKind::InvalidConfiguration
            | ErrorKind::Internal => "Something went wrong while answering. Please try again.",
        }
    }
}

impl From<LangGraphError> for RAGError {
    /// Node failures carry the step's own error; unwrap it so the kind
    /// survives the trip through the graph.
    fn from(err: LangGraphError) -> Self {
        match err {
            LangGraphError::NodeError { node, source } => match source.downcast::<RAGError>() {
                Ok(rag) => *rag,
                Err(source) => RAGError::Graph(LangGraphError::NodeError { node, source }),
            },
            other => RAGError::Graph(other),
        }
    }
}

pub mod agentic;

pub use agentic::*;
