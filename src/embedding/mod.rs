//! Embedding generation for semantic search and retrieval.

mod hashed;
mod openai;

pub use hashed::HashedEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::Settings;
use crate::error::{LegisError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder named by `embedding.provider`.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let embedding = &settings.embedding;
    match embedding.provider.to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAIEmbedder::with_config(
            &embedding.model,
            embedding.dimensions,
            settings.rag.api_base.as_deref(),
        )?)),
        "hashed" => Ok(Arc::new(HashedEmbedder::new(embedding.dimensions))),
        other => Err(LegisError::Config(format!(
            "Unknown embedding provider '{}'. Expected 'openai' or 'hashed'",
            other
        ))),
    }
}
