//! Corpus assembly.
//!
//! Merges local documents with PDFs discovered in the tabular source. Local documents
//! come first, then PDF-derived documents in discovery order. Each source contributes
//! at most once per pass, and no single failure aborts the pass.

pub mod local;

pub use local::{LocalLoad, LocalReader};

use crate::config::{ScanMode, Settings};
use crate::discovery::discover_from_path;
use crate::document::{Document, DocumentKind, IngestFailure};
use crate::error::Result;
use crate::extract::{PdfTextExtractor, TextExtractor};
use crate::fetch::PdfFetcher;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Ordered documents with unique source identifiers.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    seen: HashSet<String>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document unless its source identifier is already present.
    /// Returns whether it was added.
    pub fn push(&mut self, document: Document) -> bool {
        if !self.seen.insert(document.source_id()) {
            debug!("Skipping duplicate source {}", document.source_id());
            return false;
        }
        self.documents.push(document);
        true
    }

    /// Append many documents, keeping the first of any duplicates.
    pub fn extend(&mut self, documents: impl IntoIterator<Item = Document>) {
        for document in documents {
            self.push(document);
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of documents of the given kind.
    pub fn count(&self, kind: DocumentKind) -> usize {
        self.documents.iter().filter(|d| d.kind == kind).count()
    }
}

/// The result of one assembly pass.
#[derive(Debug, Default)]
pub struct AssembledCorpus {
    pub corpus: Corpus,
    /// Candidate URLs found by discovery, in order.
    pub candidates: Vec<String>,
    /// Recovered failures, in the order they happened.
    pub failures: Vec<IngestFailure>,
}

/// Summary counts for display and status reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorpusSummary {
    pub local_documents: usize,
    pub remote_documents: usize,
    pub candidate_urls: usize,
    pub failures: usize,
}

impl AssembledCorpus {
    pub fn summary(&self) -> CorpusSummary {
        CorpusSummary {
            local_documents: self.corpus.count(DocumentKind::Local),
            remote_documents: self.corpus.count(DocumentKind::RemotePdf),
            candidate_urls: self.candidates.len(),
            failures: self.failures.len(),
        }
    }
}

/// Builds the corpus from the local directory and the tabular source.
pub struct CorpusAssembler {
    local: LocalReader,
    tabular_path: PathBuf,
    has_header: bool,
    scan_mode: ScanMode,
    fetcher: PdfFetcher,
}

impl CorpusAssembler {
    /// Create an assembler from settings, using PDF extraction for both local and remote files.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let extractor: Arc<dyn TextExtractor> = Arc::new(PdfTextExtractor::new());
        Self::with_extractor(settings, extractor)
    }

    /// Create an assembler with a custom text extractor.
    pub fn with_extractor(settings: &Settings, extractor: Arc<dyn TextExtractor>) -> Result<Self> {
        let fetcher = PdfFetcher::new(&settings.fetch, settings.temp_dir(), extractor.clone())?;
        Ok(Self::with_components(
            LocalReader::new(settings.corpus_dir(), extractor),
            settings.hearings_csv(),
            settings.corpus.has_header,
            settings.corpus.scan_mode,
            fetcher,
        ))
    }

    /// Create an assembler from explicit parts.
    pub fn with_components(
        local: LocalReader,
        tabular_path: PathBuf,
        has_header: bool,
        scan_mode: ScanMode,
        fetcher: PdfFetcher,
    ) -> Self {
        Self {
            local,
            tabular_path,
            has_header,
            scan_mode,
            fetcher,
        }
    }

    /// Run one full ingestion pass.
    #[instrument(skip(self))]
    pub async fn assemble(&self) -> AssembledCorpus {
        let mut assembled = AssembledCorpus::default();

        info!("Loading documents from {}", self.local.root().display());
        let local = self.local.load().await;
        info!("Loaded {} local documents", local.documents.len());
        assembled.corpus.extend(local.documents);
        assembled.failures.extend(local.failures);

        let discovery = discover_from_path(&self.tabular_path, self.has_header, self.scan_mode);
        assembled.failures.extend(discovery.failure);

        // Sequential on purpose: one download at a time, in discovery order.
        let total = discovery.urls.len();
        let mut remote = 0;
        for (i, url) in discovery.urls.iter().enumerate() {
            info!("Processing PDF {}/{}: {}", i + 1, total, url);
            let outcome = self.fetcher.fetch(url).await;
            remote += outcome.documents.len();
            assembled.corpus.extend(outcome.documents);
            assembled.failures.extend(outcome.failure);
        }
        info!("Loaded {} PDF documents", remote);

        assembled.candidates = discovery.urls;
        assembled
    }
}
