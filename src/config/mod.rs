//! Configuration module for Legis.
//!
//! Handles loading and managing application settings and prompt templates.

mod env;
mod prompts;
mod settings;

pub use env::load_env_file;
pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChatLogSettings, ChatMode, ChunkingSettings, CorpusSettings, EmbeddingSettings, FetchSettings,
    GeneralSettings, PromptSettings, RagSettings, ScanMode, ServerSettings, Settings,
    VectorStoreSettings, CONDENSE_MIN_TOP_K,
};
