use jsonschema::JSONSchema;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trait for types that can be used as structured output schemas.
///
/// Types implementing this trait can be automatically converted to JSON schemas
/// and requested from a language model as schema-constrained completions.
pub trait StructuredOutputSchema:
    Serialize + for<'de> Deserialize<'de> + JsonSchema + Send + Sync
{
    /// Get the JSON schema for this type.
    fn schema() -> Value {
        let schema = schema_for!(Self);
        serde_json::to_value(&schema).unwrap_or_else(|_| {
            serde_json::json!({
                "type": "object",
                "description": "Generated schema"
            })
        })
    }

    /// Get the schema name (typically the type name).
    fn schema_name() -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Get a description for the schema (can be overridden).
    fn schema_description() -> Option<String> {
        None
    }

    fn response_schema() -> ResponseSchema {
        ResponseSchema {
            name: <Self as StructuredOutputSchema>::schema_name(),
            description: Self::schema_description(),
            schema: Self::schema(),
        }
    }
}

/// A named JSON schema handed to the model for a schema-constrained completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    pub name: String,
    pub description: Option<String>,
    pub schema: Value,
}

/// Errors related to structured output.
#[derive(Debug, thiserror::Error)]
pub enum StructuredOutputError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema generation error: {0}")]
    SchemaError(String),
}

/// Validate a value against a JSON schema.
pub fn validate_against_schema(value: &Value, schema: &Value) -> Result<(), StructuredOutputError> {
    let compiled = JSONSchema::compile(schema)
        .map_err(|e| StructuredOutputError::SchemaError(e.to_string()))?;

    if let Err(errors) = compiled.validate(value) {
        let details: Vec<String> = errors
            .map(|e| format!("{} at '{}'", e, e.instance_path))
            .collect();
        return Err(StructuredOutputError::ParseError(details.join("; ")));
    }
    Ok(())
}
