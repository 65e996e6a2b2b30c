//! Index construction: chunk the corpus, embed the chunks, and load the vector store.

use crate::chunking::TextChunker;
use crate::document::Document;
use crate::embedding::Embedder;
use crate::error::{LegisError, Result};
use crate::vector_store::{IndexedChunk, VectorStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Chunks are embedded in groups of this size.
const EMBED_BATCH_SIZE: usize = 64;

/// Counts from one index build.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
}

/// Builds a fresh index from documents.
pub struct IndexBuilder {
    chunker: TextChunker,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl IndexBuilder {
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            vector_store,
        }
    }

    /// Replace the store contents with the given documents.
    ///
    /// Every chunk is embedded before the store is touched, so an embedding
    /// failure leaves the previous index untouched.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn build(&self, documents: &[Document]) -> Result<IndexStats> {
        let chunks = self.chunker.chunk_all(documents);
        info!("Split {} documents into {} chunks", documents.len(), chunks.len());

        let mut records = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(LegisError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            records.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(chunk, embedding)| IndexedChunk::new(chunk, embedding)),
            );
        }

        let indexed = self.vector_store.replace_all(&records).await?;
        info!("Indexed {} chunks", indexed);
        Ok(IndexStats {
            documents: documents.len(),
            chunks: indexed,
        })
    }
}
