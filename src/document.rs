//! Shared data model for ingested documents and recovered ingestion failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Read from the local document directory.
    Local,
    /// Downloaded from a URL found in the tabular source.
    RemotePdf,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Local => write!(f, "local"),
            DocumentKind::RemotePdf => write!(f, "remote_pdf"),
        }
    }
}

/// A unit of extracted text plus its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Extracted text.
    pub text: String,
    /// Local path or URL the text was read from.
    pub source: String,
    /// Kind of source.
    pub kind: DocumentKind,
    /// 1-based page number for paged formats.
    pub page: Option<u32>,
    /// Display title (file name or last URL segment).
    pub title: String,
}

impl Document {
    /// Create a document for a whole (unpaged) source.
    pub fn new(text: String, source: impl Into<String>, kind: DocumentKind) -> Self {
        let source = source.into();
        let title = title_from_source(&source);
        Self {
            text,
            source,
            kind,
            page: None,
            title,
        }
    }

    /// Attach a page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Identifier used for de-duplication within one assembly pass.
    pub fn source_id(&self) -> String {
        match self.page {
            Some(page) => format!("{}#page={}", self.source, page),
            None => self.source.clone(),
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

/// Last path segment of a URL or file path, falling back to the whole source.
fn title_from_source(source: &str) -> String {
    let path = match url::Url::parse(source) {
        Ok(url) if url.scheme() != "file" => url.path().to_string(),
        _ => source.replace('\\', "/"),
    };

    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(source)
        .to_string()
}

/// Ingestion step at which a source failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The tabular source could not be loaded.
    Source,
    /// Network error or non-200 response.
    Fetch,
    /// Bytes were downloaded but no text could be extracted.
    Extraction,
    /// A local file or directory could not be read.
    LocalRead,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Source => write!(f, "source"),
            FailureStage::Fetch => write!(f, "fetch"),
            FailureStage::Extraction => write!(f, "extraction"),
            FailureStage::LocalRead => write!(f, "local_read"),
        }
    }
}

/// A failure that was recovered during ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestFailure {
    /// Path or URL that failed.
    pub source: String,
    /// Step that failed.
    pub stage: FailureStage,
    /// Error message.
    pub reason: String,
    /// When the failure was recorded.
    pub at: DateTime<Utc>,
}

impl IngestFailure {
    pub fn new(source: impl Into<String>, stage: FailureStage, reason: impl ToString) -> Self {
        Self {
            source: source.into(),
            stage,
            reason: reason.to_string(),
            at: Utc::now(),
        }
    }
}
