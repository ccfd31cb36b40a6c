use std::time::Duration;

use serde_json::Value;

use crate::schemas::{validate_against_schema, Message, ResponseSchema, StructuredOutputSchema};

use super::{llm::LLM, GenerateResult, LLMError};

/// Free-text completion bounded by `timeout`.
pub async fn generate_with_timeout(
    llm: &dyn LLM,
    messages: &[Message],
    timeout: Duration,
) -> Result<GenerateResult, LLMError> {
    tokio::time::timeout(timeout, llm.generate(messages)).await?
}

/// Schema-constrained completion deserialized into `T`, bounded by `timeout`.
///
/// Output that is not JSON, or JSON that does not satisfy the schema derived
/// from `T`, is a [`LLMError::ParsingError`]; nothing is scraped from free text.
pub async fn invoke_structured<T: StructuredOutputSchema>(
    llm: &dyn LLM,
    messages: &[Message],
    timeout: Duration,
) -> Result<T, LLMError> {
    let schema = T::response_schema();
    let value = tokio::time::timeout(timeout, llm.generate_structured(messages, &schema)).await??;
    parse_structured_response(value, &schema)
}

/// Validate `value` against `schema` and deserialize it.
pub fn parse_structured_response<T: StructuredOutputSchema>(
    value: Value,
    schema: &ResponseSchema,
) -> Result<T, LLMError> {
    validate_against_schema(&value, &schema.schema)?;
    serde_json::from_value(value)
        .map_err(|e| LLMError::ParsingError(format!("{} does not match schema: {}", schema.name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeLLM;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
    struct Verdict {
        ok: bool,
        #[schemars(range(min = 0.0, max = 1.0))]
        confidence: f64,
    }

    impl StructuredOutputSchema for Verdict {}

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_invoke_structured_parses_valid_json() {
        let llm = FakeLLM::new(vec![r#"{"ok": true, "confidence": 0.9}"#]);
        let verdict: Verdict =
            invoke_structured(&llm, &[Message::new_human_message("q")], TIMEOUT)
                .await
                .unwrap();
        assert_eq!(
            verdict,
            Verdict {
                ok: true,
                confidence: 0.9
            }
        );
    }

    #[tokio::test]
    async fn test_invoke_structured_rejects_prose() {
        let llm = FakeLLM::new(vec!["Yes, this looks valid to me."]);
        let err = invoke_structured::<Verdict>(&llm, &[Message::new_human_message("q")], TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::ParsingError(_)));
    }

    #[tokio::test]
    async fn test_invoke_structured_rejects_schema_violation() {
        let llm = FakeLLM::new(vec![r#"{"ok": "sure", "confidence": 2.0}"#]);
        let err = invoke_structured::<Verdict>(&llm, &[Message::new_human_message("q")], TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::ParsingError(_)));
    }

    #[tokio::test]
    async fn test_generate_with_timeout_elapses() {
        let llm = FakeLLM::new(vec!["late"]).with_delay(Duration::from_millis(200));
        let err = generate_with_timeout(
            &llm,
            &[Message::new_human_message("q")],
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LLMError::Timeout(_)));
    }
}
