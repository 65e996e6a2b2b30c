//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian `f32` blobs and cosine similarity is computed
//! in Rust. Lets an index survive restarts for inspection with the CLI.

use super::{cosine_similarity, rank, IndexedChunk, SearchResult, VectorStore};
use crate::document::DocumentKind;
use crate::error::{LegisError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        source_id TEXT NOT NULL,
        title TEXT NOT NULL,
        page INTEGER,
        kind TEXT NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        chunk_order INTEGER NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open or create a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LegisError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

fn parse_kind(value: &str) -> DocumentKind {
    match value {
        "remote_pdf" => DocumentKind::RemotePdf,
        _ => DocumentKind::Local,
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    /// Delete and insert inside one transaction, so readers on other connections
    /// see either the old index or the new one.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn replace_all(&self, chunks: &[IndexedChunk]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let removed = tx.execute("DELETE FROM chunks", [])?;
        for chunk in chunks {
            tx.execute(
                r#"
                INSERT INTO chunks
                (id, source, source_id, title, page, kind, content, embedding,
                 chunk_order, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.source,
                    chunk.source_id,
                    chunk.title,
                    chunk.page,
                    chunk.kind.to_string(),
                    chunk.content,
                    Self::embedding_to_bytes(&chunk.embedding),
                    chunk.chunk_order,
                    chunk.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Replaced {} chunks with {}", removed, chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, source, source_id, title, page, kind, content,
                   embedding, chunk_order, indexed_at
            FROM chunks
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let kind_str: String = row.get(5)?;
            let embedding_bytes: Vec<u8> = row.get(7)?;
            let indexed_at_str: String = row.get(9)?;

            Ok(IndexedChunk {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                source: row.get(1)?,
                source_id: row.get(2)?,
                title: row.get(3)?,
                page: row.get(4)?,
                kind: parse_kind(&kind_str),
                content: row.get(6)?,
                embedding: Self::bytes_to_embedding(&embedding_bytes),
                chunk_order: row.get(8)?,
                indexed_at: parse_timestamp(&indexed_at_str),
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            let chunk = row?;
            let score = cosine_similarity(query_embedding, &chunk.embedding);
            if score >= min_score {
                results.push(SearchResult { chunk, score });
            }
        }

        let results = rank(results, limit);
        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
