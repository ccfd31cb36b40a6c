use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    language_models::{llm::LLM, GenerateResult, LLMError},
    schemas::Message,
};

type Responder = Arc<dyn Fn(&[Message]) -> Result<String, LLMError> + Send + Sync>;

/// Scripted language model for tests and offline runs.
///
/// Answers either from a queue of canned responses or from a responder
/// closure that sees the full prompt. Every prompt it receives is recorded.
#[derive(Clone)]
pub struct FakeLLM {
    responses: Arc<Mutex<VecDeque<String>>>,
    responder: Option<Responder>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl FakeLLM {
    /// Answer with `responses` in order, then fail.
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Into::into).collect())),
            responder: None,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer every prompt with `responder`.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&[Message]) -> Result<String, LLMError> + Send + Sync + 'static,
    {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            responder: Some(Arc::new(responder)),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sleep before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn next_response(&self, messages: &[Message]) -> Result<String, LLMError> {
        if let Some(responder) = &self.responder {
            return responder(messages);
        }
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .ok_or_else(|| LLMError::OtherError("FakeLLM has no scripted response left".into()))
    }
}

#[async_trait]
impl LLM for FakeLLM {
    async fn generate(&self, messages: &[Message]) -> Result<GenerateResult, LLMError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(messages.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.next_response(messages).map(GenerateResult::new)
    }
}
