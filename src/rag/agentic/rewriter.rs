use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    language_models::{generate_with_timeout, llm::LLM},
    rag::RAGError,
    schemas::ConversationTurn,
};

use super::{glossary::Glossary, prompts::rewriter_messages};

/// Reformulates a question that retrieved nothing useful.
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    /// Returns a new, non-empty question.
    async fn rewrite(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<String, RAGError>;
}

/// Rewriter that expands acronyms and resolves references to earlier turns.
pub struct LLMQueryRewriter {
    llm: Arc<dyn LLM>,
    glossary: Glossary,
    history_window: usize,
    timeout: Duration,
}

impl LLMQueryRewriter {
    /// Rewriter with the built-in glossary, a six-turn history window and a
    /// 60 second call timeout.
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self {
            llm,
            glossary: Glossary::default(),
            history_window: 6,
            timeout: Duration::from_secs(60),
        }
    }

    /// Replace the glossary rendered into the rewriting prompt.
    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Deadline for the rewriting call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// First non-blank line of a model reply, without wrapping quotes or a
/// leading label.
fn clean_rewrite(raw: &str) -> String {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let line = ["Rewritten query:", "Query:"]
        .iter()
        .find_map(|label| line.strip_prefix(label))
        .unwrap_or(line)
        .trim();
    line.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

#[async_trait]
impl QueryRewriter for LLMQueryRewriter {
    async fn rewrite(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<String, RAGError> {
        let messages = rewriter_messages(
            question,
            history,
            self.history_window,
            &self.glossary.prompt_block(),
        );
        let result = generate_with_timeout(self.llm.as_ref(), &messages, self.timeout)
            .await
            .map_err(RAGError::Rewrite)?;

        let mut rewritten = clean_rewrite(&result.generation);
        if rewritten.is_empty() {
            log::warn!("rewriter returned an empty query; keeping '{}'", question);
            rewritten = question.trim().to_string();
        }

        let rewritten = self.glossary.expand(&rewritten);
        log::info!("rewrote query '{}' -> '{}'", question, rewritten);
        Ok(rewritten)
    }
}
