//! RAG (Retrieval-Augmented Generation) for answering questions about the corpus.

pub mod context;
mod llm;
mod response;

pub use context::ContextBuilder;
pub use llm::{ChatMessage, LanguageModel, OpenAIChatModel, Role};
pub use response::{ChatEngine, RagResponse};

use crate::vector_store::SearchResult;
use serde::Serialize;

/// A retrieved passage with its citation.
#[derive(Debug, Clone, Serialize)]
pub struct SourceChunk {
    /// Path or URL of the originating document.
    pub source: String,
    /// Citation label, e.g. `hearing.pdf (p. 3)`.
    pub label: String,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for SourceChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            label: result.chunk.label(),
            source: result.chunk.source,
            content: result.chunk.content,
            score: result.score,
        }
    }
}
