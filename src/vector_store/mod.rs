//! Vector store abstraction for the document index.
//!
//! Provides a trait-based interface for different vector database backends.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::ContentChunk;
use crate::config::Settings;
use crate::document::DocumentKind;
use crate::error::{LegisError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Path or URL of the originating document.
    pub source: String,
    /// Page-qualified source identifier.
    pub source_id: String,
    /// Display title of the originating document.
    pub title: String,
    /// Page number for paged formats.
    pub page: Option<u32>,
    /// Kind of the originating document.
    pub kind: DocumentKind,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Order of this chunk within its document.
    pub chunk_order: i32,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl IndexedChunk {
    /// Pair a chunk with its embedding.
    pub fn new(chunk: ContentChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: chunk.source,
            source_id: chunk.source_id,
            title: chunk.title,
            page: chunk.page,
            kind: chunk.kind,
            content: chunk.content,
            embedding,
            chunk_order: chunk.order,
            indexed_at: Utc::now(),
        }
    }

    /// Human-readable label for citations.
    pub fn label(&self) -> String {
        match self.page {
            Some(page) => format!("{} (p. {})", self.title, page),
            None => self.title.clone(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: IndexedChunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace the whole index with `chunks` in one step. When this fails the
    /// previous contents are still in place.
    async fn replace_all(&self, chunks: &[IndexedChunk]) -> Result<usize>;

    /// Chunks most similar to the query, best first, scoring at least `min_score`.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Get total chunk count.
    async fn chunk_count(&self) -> Result<usize>;
}

/// Create the vector store named by `vector_store.provider`.
pub fn create_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?)),
        other => Err(LegisError::Config(format!(
            "Unknown vector store provider '{}'. Expected 'memory' or 'sqlite'",
            other
        ))),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort by descending score and keep the best `limit`.
fn rank(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}

#[cfg(test)]
pub(crate) fn test_chunk(
    source: &str,
    page: Option<u32>,
    content: &str,
    embedding: Vec<f32>,
) -> IndexedChunk {
    let mut document =
        crate::document::Document::new(content.to_string(), source, DocumentKind::RemotePdf);
    document.page = page;
    let chunk = crate::chunking::TextChunker::new(2048, 0)
        .chunk(&document)
        .remove(0);
    IndexedChunk::new(chunk, embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_chunk_label() {
        let chunk = test_chunk("https://senate.gov/s1.pdf", Some(2), "text", vec![]);
        assert_eq!(chunk.label(), "s1.pdf (p. 2)");
        assert_eq!(chunk.source_id, "https://senate.gov/s1.pdf#page=2");
    }

    #[test]
    fn test_create_vector_store_rejects_unknown_provider() {
        let mut settings = Settings::default();
        settings.vector_store.provider = "chroma".to_string();
        assert!(matches!(create_vector_store(&settings), Err(LegisError::Config(_))));
    }
}
