//! Context retrieval for RAG responses.

use super::SourceChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::debug;

/// Retrieves the passages most similar to a query.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
    min_score: f32,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_chunks: 3,
            min_score: 0.0,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Build context for a query.
    pub async fn build(&self, query: &str) -> Result<Vec<SourceChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self
            .vector_store
            .search(&query_embedding, self.max_chunks, self.min_score)
            .await?;

        debug!("Retrieved {} passages", results.len());
        Ok(results.into_iter().map(SourceChunk::from).collect())
    }
}

/// Format retrieved passages for inclusion in a prompt.
pub fn format_context_for_prompt(chunks: &[SourceChunk]) -> String {
    if chunks.is_empty() {
        return "(No relevant excerpts were found.)".to_string();
    }

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] {}\n{}", i + 1, chunk.label, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format retrieved passages as a citation list for the user.
pub fn format_context_for_display(chunks: &[SourceChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            if chunk.source.starts_with("http") {
                format!("{} (score: {:.2})\n  Link: {}", chunk.label, chunk.score, chunk.source)
            } else {
                format!("{} (score: {:.2})", chunk.label, chunk.score)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashedEmbedder;
    use crate::vector_store::{test_chunk, MemoryVectorStore};

    #[tokio::test]
    async fn test_build_returns_top_matches() {
        let embedder = Arc::new(HashedEmbedder::new(256));
        let store = Arc::new(MemoryVectorStore::new());

        let texts = [
            "Farm bill hearing on crop insurance",
            "Nomination hearing for the ambassador to Japan",
            "Crop insurance reform in the farm bill",
        ];
        let embeddings = embedder
            .embed_batch(&texts.iter().map(|t| t.to_string()).collect::<Vec<_>>())
            .await
            .unwrap();
        let chunks: Vec<_> = texts
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (t, e))| test_chunk(&format!("doc{}.txt", i), None, t, e))
            .collect();
        store.replace_all(&chunks).await.unwrap();

        let builder = ContextBuilder::new(store, embedder).with_max_chunks(2);
        let context = builder.build("farm bill crop insurance").await.unwrap();

        assert_eq!(context.len(), 2);
        assert!(context.iter().all(|c| c.content.contains("rop insurance")));
    }

    #[test]
    fn test_format_context() {
        let chunks = vec![SourceChunk {
            source: "https://senate.gov/s1.pdf".to_string(),
            label: "s1.pdf (p. 2)".to_string(),
            content: "Section 2 amends the Act.".to_string(),
            score: 0.91,
        }];

        assert_eq!(
            format_context_for_prompt(&chunks),
            "[1] s1.pdf (p. 2)\nSection 2 amends the Act."
        );
        assert!(format_context_for_display(&chunks).contains("Link: https://senate.gov/s1.pdf"));
        assert!(format_context_for_prompt(&[]).contains("No relevant excerpts"));
    }
}
