//! Chat engine: retrieval plus answer generation over a shared conversation.

use super::context::{format_context_for_display, format_context_for_prompt};
use super::{ChatMessage, ContextBuilder, LanguageModel, Role, SourceChunk};
use crate::config::{ChatMode, Prompts};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Answers messages using retrieved context and conversation history.
///
/// History is shared by every caller of the same engine.
pub struct ChatEngine {
    llm: Arc<dyn LanguageModel>,
    context_builder: ContextBuilder,
    prompts: Prompts,
    mode: ChatMode,
    max_history: usize,
    history: Mutex<Vec<ChatMessage>>,
}

impl ChatEngine {
    /// Create a new chat engine.
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        context_builder: ContextBuilder,
        mode: ChatMode,
    ) -> Self {
        Self {
            llm,
            context_builder,
            prompts: Prompts::default(),
            mode,
            max_history: 20,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set how many messages of history are kept.
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Answer a message in the ongoing conversation.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn chat(&self, message: &str) -> Result<RagResponse> {
        info!("Chat message: {}", message);

        // Snapshot so the lock is not held across model calls.
        let history = self.history.lock().await.clone();

        let query = match self.mode {
            ChatMode::Context => message.to_string(),
            ChatMode::CondenseQuestion => self.condense(&history, message).await?,
        };

        let response = self.answer(&history, message, query).await?;

        let mut shared = self.history.lock().await;
        shared.push(ChatMessage::user(message));
        shared.push(ChatMessage::assistant(response.answer.clone()));
        if shared.len() > self.max_history {
            let excess = shared.len() - self.max_history;
            shared.drain(..excess);
        }

        Ok(response)
    }

    /// Answer a single question without reading or updating history.
    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        self.answer(&[], question, question.to_string()).await
    }

    /// Clear conversation history.
    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    /// Number of messages currently kept.
    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    async fn answer(
        &self,
        history: &[ChatMessage],
        message: &str,
        query: String,
    ) -> Result<RagResponse> {
        let sources = self.context_builder.build(&query).await?;

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(&sources));
        let context = self.prompts.render_with_custom(&self.prompts.rag.context, &vars);
        let system = self.prompts.render_with_custom(&self.prompts.rag.system, &HashMap::new());

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(format!("{}\n\n{}", system, context)));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(message));

        let answer = self.llm.complete(&messages).await?;
        debug!("Generated response with {} sources", sources.len());

        Ok(RagResponse {
            answer,
            query,
            sources,
        })
    }

    /// Rewrite a follow-up into a standalone question. The first message is used as is.
    async fn condense(&self, history: &[ChatMessage], message: &str) -> Result<String> {
        if history.is_empty() {
            return Ok(message.to_string());
        }

        let transcript = history
            .iter()
            .map(|m| match m.role {
                Role::User => format!("User: {}", m.content),
                Role::Assistant => format!("Assistant: {}", m.content),
                Role::System => format!("System: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("history".to_string(), transcript);
        vars.insert("question".to_string(), message.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.rag.condense, &vars);

        let condensed = self.llm.complete(&[ChatMessage::user(prompt)]).await?;
        let condensed = condensed.trim();
        debug!("Condensed question: {}", condensed);

        if condensed.is_empty() {
            Ok(message.to_string())
        } else {
            Ok(condensed.to_string())
        }
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Text used for retrieval.
    pub query: String,
    /// Passages used for the answer.
    pub sources: Vec<SourceChunk>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            output.push_str(&format_context_for_display(&self.sources));
        }

        output
    }
}
