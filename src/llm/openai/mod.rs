use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::{
    language_models::{llm::LLM, options::CallOptions, GenerateResult, LLMError, TokenUsage},
    schemas::{Message, MessageType, ResponseSchema},
};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat-completions client.
///
/// Defaults to temperature 0 so routing and grading are repeatable for a
/// fixed prompt. The underlying HTTP client pools connections and is cheap to
/// clone.
#[derive(Clone)]
pub struct OpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    options: CallOptions,
}

impl Default for OpenAI {
    fn default() -> Self {
        Self::new(OpenAIConfig::default())
    }
}

impl OpenAI {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(config),
            model: DEFAULT_MODEL.to_string(),
            options: CallOptions::new().with_temperature(0.0),
        }
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Override call options. Fields left unset in `options` keep their
    /// current value, so temperature stays at 0 unless set explicitly.
    pub fn with_options(mut self, options: CallOptions) -> Self {
        let mut merged = options;
        merged.merge_options(self.options.clone());
        self.options = merged;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_openai_messages(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, LLMError> {
        let mut converted = Vec::with_capacity(messages.len());
        for message in messages {
            let msg: ChatCompletionRequestMessage = match message.message_type {
                MessageType::SystemMessage => ChatCompletionRequestSystemMessageArgs::default()
                    .content(message.content.clone())
                    .build()?
                    .into(),
                MessageType::AIMessage => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()?
                    .into(),
                MessageType::HumanMessage => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.clone())
                    .build()?
                    .into(),
            };
            converted.push(msg);
        }
        Ok(converted)
    }

    fn build_request(
        &self,
        messages: &[Message],
        response_format: Option<ResponseFormat>,
    ) -> Result<CreateChatCompletionRequest, LLMError> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(self.model.clone())
            .messages(Self::to_openai_messages(messages)?);

        if let Some(temperature) = self.options.temperature {
            builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.options.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        if let Some(top_p) = self.options.top_p {
            builder.top_p(top_p);
        }
        if let Some(seed) = self.options.seed {
            builder.seed(seed);
        }
        if let Some(format) = response_format {
            builder.response_format(format);
        }

        Ok(builder.build()?)
    }

    async fn complete(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<GenerateResult, LLMError> {
        let response = self.client.chat().create(request).await?;

        let generation = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LLMError::ContentNotFound("choices[0].message.content".into()))?;

        let tokens = response
            .usage
            .map(|usage| TokenUsage::new(usage.prompt_tokens, usage.completion_tokens));

        Ok(GenerateResult { tokens, generation })
    }
}

#[async_trait]
impl LLM for OpenAI {
    async fn generate(&self, messages: &[Message]) -> Result<GenerateResult, LLMError> {
        let request = self.build_request(messages, None)?;
        log::debug!(
            "openai completion: model={} messages={}",
            self.model,
            messages.len()
        );
        self.complete(request).await
    }

    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &ResponseSchema,
    ) -> Result<Value, LLMError> {
        let format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: schema.description.clone(),
                name: schema.name.clone(),
                schema: Some(schema.schema.clone()),
                strict: None,
            },
        };
        let request = self.build_request(messages, Some(format))?;
        log::debug!(
            "openai structured completion: model={} schema={}",
            self.model,
            schema.name
        );
        let result = self.complete(request).await?;
        serde_json::from_str(result.generation.trim()).map_err(|e| {
            LLMError::ParsingError(format!(
                "structured response for '{}' is not valid JSON: {}",
                schema.name, e
            ))
        })
    }
}
