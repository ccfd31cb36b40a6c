use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::time::error::Elapsed;

use crate::schemas::structured_output::StructuredOutputError;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("OpenAI error: {0}")]
    OpenAIError(#[from] OpenAIError),

    #[error("Operation timed out")]
    Timeout(#[from] Elapsed),

    #[error("Content not found in response: Expected at {0}")]
    ContentNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Error: {0}")]
    OtherError(String),
}

impl From<StructuredOutputError> for LLMError {
    fn from(e: StructuredOutputError) -> Self {
        LLMError::ParsingError(e.to_string())
    }
}
