use async_trait::async_trait;
use serde_json::Value;

use crate::schemas::{Message, ResponseSchema};

use super::{GenerateResult, LLMError};

/// A language model client.
///
/// Implementations must be safe to share between concurrent invocations;
/// any connection pooling happens inside the client.
#[async_trait]
pub trait LLM: Sync + Send {
    /// Free-text completion.
    async fn generate(&self, messages: &[Message]) -> Result<GenerateResult, LLMError>;

    async fn invoke(&self, prompt: &str) -> Result<String, LLMError> {
        self.generate(&[Message::new_human_message(prompt)])
            .await
            .map(|res| res.generation)
    }

    /// Schema-constrained completion.
    ///
    /// The default implementation asks for a free-text completion and parses
    /// it strictly as JSON; providers with native structured output should
    /// override it. Callers still validate the value against `schema`.
    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &ResponseSchema,
    ) -> Result<Value, LLMError> {
        let result = self.generate(messages).await?;
        serde_json::from_str(result.generation.trim()).map_err(|e| {
            LLMError::ParsingError(format!(
                "response for schema '{}' is not valid JSON: {}",
                schema.name, e
            ))
        })
    }
}
