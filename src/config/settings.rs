//! Configuration settings for Legis.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub corpus: CorpusSettings,
    pub fetch: FetchSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub rag: RagSettings,
    pub server: ServerSettings,
    pub chat_log: ChatLogSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for transient downloads.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.legis".to_string(),
            temp_dir: "/tmp/legis".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// How the tabular source is scanned for PDF links.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Check the `.pdf` suffix on every cell.
    #[default]
    EveryCell,
    /// Skip columns where no cell contains "pdf" before checking the suffix.
    PdfColumns,
}

impl std::str::FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "every_cell" | "all" => Ok(ScanMode::EveryCell),
            "pdf_columns" | "columns" => Ok(ScanMode::PdfColumns),
            _ => Err(format!("Unknown scan mode: {}", s)),
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::EveryCell => write!(f, "every_cell"),
            ScanMode::PdfColumns => write!(f, "pdf_columns"),
        }
    }
}

/// Where the corpus comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Directory of local documents, read recursively.
    pub data_dir: String,
    /// Delimited file scanned for PDF links.
    pub hearings_csv: String,
    /// Whether the first row of the tabular source is a header. Off by default, so a
    /// link in the first row is still discovered.
    pub has_header: bool,
    /// Cell scanning policy.
    pub scan_mode: ScanMode,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            hearings_csv: "data/hearings.csv".to_string(),
            has_header: false,
            scan_mode: ScanMode::EveryCell,
        }
    }
}

/// Remote PDF download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Extra attempts for transport errors and 5xx responses. 0 disables retries.
    pub max_retries: usize,
    /// Base delay for exponential backoff, in milliseconds.
    pub retry_base_millis: u64,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Follow HTTP redirects before checking the status.
    pub follow_redirects: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            max_retries: 0,
            retry_base_millis: 500,
            user_agent: concat!("legis/", env!("CARGO_PKG_VERSION")).to_string(),
            follow_redirects: true,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, hashed).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Document chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk size in tokens.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in tokens.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 2048,
            chunk_overlap: 100,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (memory, sqlite).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "memory".to_string(),
            sqlite_path: "~/.legis/index.db".to_string(),
        }
    }
}

/// How the chat engine turns a message into a retrieval query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// Retrieve with the raw message and answer with history.
    #[default]
    Context,
    /// Rewrite the message into a standalone question first.
    CondenseQuestion,
}

impl std::str::FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "context" => Ok(ChatMode::Context),
            "condense_question" | "condense" => Ok(ChatMode::CondenseQuestion),
            _ => Err(format!("Unknown chat mode: {}", s)),
        }
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatMode::Context => write!(f, "context"),
            ChatMode::CondenseQuestion => write!(f, "condense_question"),
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for response generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Chat engine mode.
    pub chat_mode: ChatMode,
    /// Number of chunks retrieved per question.
    pub similarity_top_k: usize,
    /// Minimum cosine similarity for a retrieved chunk.
    pub min_score: f32,
    /// Messages of history kept by the chat engine.
    pub max_history: usize,
    /// Override for the OpenAI-compatible API base URL.
    pub api_base: Option<String>,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            chat_mode: ChatMode::Context,
            similarity_top_k: 3,
            min_score: 0.0,
            max_history: 20,
            api_base: None,
        }
    }
}

impl RagSettings {
    /// Chunks to retrieve per question. Condensed questions are broader, so the
    /// condense mode retrieves at least [`CONDENSE_MIN_TOP_K`].
    pub fn retrieval_top_k(&self) -> usize {
        match self.chat_mode {
            ChatMode::Context => self.similarity_top_k,
            ChatMode::CondenseQuestion => self.similarity_top_k.max(CONDENSE_MIN_TOP_K),
        }
    }
}

/// Lower bound on retrieved chunks in condense-question mode.
pub const CONDENSE_MIN_TOP_K: usize = 15;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Build the index before accepting connections.
    pub warm_on_startup: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            warm_on_startup: true,
        }
    }
}

/// Record of answered questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatLogSettings {
    /// Store every answered question and its answer.
    pub enabled: bool,
    /// Path to the SQLite log.
    pub path: String,
}

impl Default for ChatLogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.legis/chat_log.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::LegisError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("legis")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded local corpus directory.
    pub fn corpus_dir(&self) -> PathBuf {
        Self::expand_path(&self.corpus.data_dir)
    }

    /// Get the expanded tabular source path.
    pub fn hearings_csv(&self) -> PathBuf {
        Self::expand_path(&self.corpus.hearings_csv)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded chat log path.
    pub fn chat_log_path(&self) -> PathBuf {
        Self::expand_path(&self.chat_log.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hearing_deployment() {
        let settings = Settings::default();
        assert_eq!(settings.corpus.hearings_csv, "data/hearings.csv");
        assert_eq!(settings.fetch.max_retries, 0);
        assert_eq!(settings.rag.similarity_top_k, 3);
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.chunking.chunk_size, 2048);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [corpus]
            scan_mode = "pdf_columns"

            [rag]
            chat_mode = "condense_question"
            similarity_top_k = 15
            "#,
        )
        .unwrap();

        assert_eq!(settings.corpus.scan_mode, ScanMode::PdfColumns);
        assert!(!settings.corpus.has_header);
        assert_eq!(settings.rag.chat_mode, ChatMode::CondenseQuestion);
        assert_eq!(settings.rag.similarity_top_k, 15);
        assert_eq!(settings.rag.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_condense_mode_retrieves_more() {
        let mut rag = RagSettings::default();
        assert_eq!(rag.retrieval_top_k(), 3);

        rag.chat_mode = ChatMode::CondenseQuestion;
        assert_eq!(rag.retrieval_top_k(), 15);

        rag.similarity_top_k = 20;
        assert_eq!(rag.retrieval_top_k(), 20);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("every-cell".parse::<ScanMode>().unwrap(), ScanMode::EveryCell);
        assert_eq!("condense".parse::<ChatMode>().unwrap(), ChatMode::CondenseQuestion);
        assert!("bogus".parse::<ChatMode>().is_err());
    }
}
