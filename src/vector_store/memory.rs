//! In-memory vector store implementation.
//!
//! The default backend. The index lives as long as the process.

use super::{cosine_similarity, rank, IndexedChunk, SearchResult, VectorStore};
use crate::error::{LegisError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store.
pub struct MemoryVectorStore {
    chunks: RwLock<HashMap<String, IndexedChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, IndexedChunk>>> {
        self.chunks
            .read()
            .map_err(|e| LegisError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, IndexedChunk>>> {
        self.chunks
            .write()
            .map_err(|e| LegisError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn replace_all(&self, chunks: &[IndexedChunk]) -> Result<usize> {
        let fresh: HashMap<String, IndexedChunk> = chunks
            .iter()
            .map(|chunk| (chunk.id.to_string(), chunk.clone()))
            .collect();
        let count = fresh.len();
        *self.write()? = fresh;
        Ok(count)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let chunks = self.read()?;

        let results: Vec<SearchResult> = chunks
            .values()
            .map(|chunk| SearchResult {
                score: cosine_similarity(query_embedding, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .filter(|r| r.score >= min_score)
            .collect();

        Ok(rank(results, limit))
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_chunk;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let url = "https://senate.gov/a.pdf";
        let chunk1 = test_chunk(url, Some(1), "Hello world", vec![1.0, 0.0, 0.0]);
        let chunk2 = test_chunk(url, Some(2), "Goodbye world", vec![0.0, 1.0, 0.0]);

        assert_eq!(store.replace_all(&[chunk1, chunk2]).await.unwrap(), 2);
        assert_eq!(store.chunk_count().await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].chunk.content, "Hello world");
    }

    #[tokio::test]
    async fn test_threshold_and_limit() {
        let store = MemoryVectorStore::new();
        store
            .replace_all(&[
                test_chunk("a.txt", None, "a", vec![1.0, 0.0]),
                test_chunk("b.txt", None, "b", vec![0.8, 0.6]),
                test_chunk("c.txt", None, "c", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(results.len(), 2);

        let results = store.search(&[1.0, 0.0], 1, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "a");
    }

    #[tokio::test]
    async fn test_replace_all_drops_previous_chunks() {
        let store = MemoryVectorStore::new();
        store
            .replace_all(&[test_chunk("old.txt", None, "old", vec![1.0])])
            .await
            .unwrap();
        store
            .replace_all(&[test_chunk("new.txt", None, "new", vec![1.0])])
            .await
            .unwrap();

        let results = store.search(&[1.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.source, "new.txt");
    }
}
