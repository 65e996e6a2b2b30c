//! Error types for Legis.

use thiserror::Error;

/// Library-level error type for Legis operations.
#[derive(Error, Debug)]
pub enum LegisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Chat log error: {0}")]
    ChatLog(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("Chat engine not initialized")]
    NotReady,

    #[error("Index build failed: {0}")]
    Build(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

/// Result type alias for Legis operations.
pub type Result<T> = std::result::Result<T, LegisError>;
