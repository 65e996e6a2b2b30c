//! PDF fetch-and-extract.
//!
//! Downloads one candidate URL, writes the body to a scoped temporary file, extracts its
//! text, and removes the file before returning. Every failure is recovered: the URL
//! contributes no documents and the failure is reported to the caller.

use crate::config::FetchSettings;
use crate::document::{Document, DocumentKind, FailureStage, IngestFailure};
use crate::error::{LegisError, Result};
use crate::extract::TextExtractor;
use reqwest::StatusCode;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, info, instrument, warn};

/// Upper bound on a single backoff delay.
const MAX_RETRY_DELAY_SECS: u64 = 30;

/// Documents produced by one fetch, or the reason there are none.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// One document per page with text.
    pub documents: Vec<Document>,
    /// Set when the URL contributed nothing because of an error.
    pub failure: Option<IngestFailure>,
}

/// A failed download attempt.
#[derive(Debug, Error)]
enum DownloadError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),
}

impl DownloadError {
    /// Transport errors and server errors may succeed on a later attempt.
    fn is_transient(&self) -> bool {
        match self {
            DownloadError::Transport(_) => true,
            DownloadError::Status(status) => status.is_server_error(),
        }
    }
}

/// Downloads PDFs and hands them to a text extractor.
pub struct PdfFetcher {
    client: reqwest::Client,
    extractor: Arc<dyn TextExtractor>,
    scratch_dir: PathBuf,
    max_retries: usize,
    retry_base_millis: u64,
}

impl PdfFetcher {
    /// Create a fetcher from settings. Temporary files are created inside `scratch_dir`.
    pub fn new(
        settings: &FetchSettings,
        scratch_dir: PathBuf,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self> {
        let redirects = if settings.follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(settings.user_agent.clone())
            .redirect(redirects)
            .build()
            .map_err(|e| LegisError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            extractor,
            scratch_dir,
            max_retries: settings.max_retries,
            retry_base_millis: settings.retry_base_millis,
        })
    }

    /// Directory holding in-flight downloads.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Fetch one URL and extract its pages. Never fails; see [`FetchOutcome::failure`].
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let bytes = match self.download(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to fetch PDF from {}: {}", url, e);
                return FetchOutcome {
                    documents: Vec::new(),
                    failure: Some(IngestFailure::new(url, FailureStage::Fetch, e)),
                };
            }
        };

        match self.extract(url, &bytes).await {
            Ok(documents) => {
                info!("Processed PDF from {} ({} pages)", url, documents.len());
                FetchOutcome {
                    documents,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("Failed to process PDF from {}: {}", url, e);
                FetchOutcome {
                    documents: Vec::new(),
                    failure: Some(IngestFailure::new(url, FailureStage::Extraction, e)),
                }
            }
        }
    }

    /// GET the URL, retrying transient failures when retries are enabled.
    async fn download(&self, url: &str) -> std::result::Result<Vec<u8>, DownloadError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor((self.retry_base_millis / 2).max(1))
            .max_delay(Duration::from_secs(MAX_RETRY_DELAY_SECS))
            .map(jitter)
            .take(self.max_retries);

        RetryIf::start(
            strategy,
            || self.download_once(url),
            |e: &DownloadError| {
                let retry = e.is_transient();
                if retry {
                    debug!("Retrying {} after: {}", url, e);
                }
                retry
            },
        )
        .await
    }

    async fn download_once(&self, url: &str) -> std::result::Result<Vec<u8>, DownloadError> {
        let response = self.client.get(url).send().await?;

        // Only an exact 200 counts as success.
        if response.status() != StatusCode::OK {
            return Err(DownloadError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Persist the body to a temporary file, extract it, and remove the file.
    async fn extract(&self, url: &str, bytes: &[u8]) -> Result<Vec<Document>> {
        std::fs::create_dir_all(&self.scratch_dir)?;

        let mut artifact = tempfile::Builder::new()
            .prefix("legis-")
            .suffix(".pdf")
            .tempfile_in(&self.scratch_dir)?;
        artifact.write_all(bytes)?;
        artifact.flush()?;

        let pages = self.extractor.extract_pages(artifact.path()).await;

        // Dropping also deletes, but close() reports removal errors.
        let artifact_path = artifact.path().to_path_buf();
        if let Err(e) = artifact.close() {
            warn!("Failed to remove temporary file {:?}: {}", artifact_path, e);
        }

        let documents = pages?
            .into_iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| {
                Document::new(text, url, DocumentKind::RemotePdf).with_page(i as u32 + 1)
            })
            .collect::<Vec<_>>();

        if documents.is_empty() {
            return Err(LegisError::Extraction("PDF contained no text".to_string()));
        }

        Ok(documents)
    }
}
