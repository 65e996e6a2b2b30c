//! Legis - chat with Senate hearing records and legislative documents
//!
//! Builds a corpus from a local document directory and from the PDFs linked in a
//! hearings table, indexes it for retrieval, and answers questions about it through
//! an HTTP API or the terminal.
//!
//! # Architecture
//!
//! - `discovery` - Find PDF links in the hearings table
//! - `fetch` - Download and extract one PDF through a scoped temporary file
//! - `extract` - Text extraction from PDFs
//! - `corpus` - Merge local documents and fetched PDFs into one corpus
//! - `chunking` - Split documents for retrieval
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `index` - Build the index from a corpus
//! - `rag` - Chat engine for question answering
//! - `session` - The shared, build-once chat session
//! - `chat_log` - Persistent record of answered questions
//! - `cli` - Command line interface and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use legis::config::Settings;
//! use legis::session::{DefaultSessionFactory, SessionHandle};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let sessions = SessionHandle::new(Arc::new(DefaultSessionFactory::new(settings)));
//!
//!     let session = sessions.ensure_ready().await?;
//!     let response = session.engine.chat("Which hearings covered farm subsidies?").await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chat_log;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod discovery;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod index;
pub mod openai;
pub mod rag;
pub mod session;
pub mod vector_store;

pub use error::{LegisError, Result};
