//! Remote PDF discovery.
//!
//! Scans a tabular source for cells that look like PDF links. A cell qualifies when it
//! is text and ends with the literal, case-sensitive suffix `.pdf`. Numbers and missing
//! values never qualify. Candidates come out in row-major order with duplicates removed.

mod tabular;

pub use tabular::{Cell, TabularSource};

use crate::config::ScanMode;
use crate::document::{FailureStage, IngestFailure};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Suffix a cell must end with to be a candidate URL.
pub const PDF_SUFFIX: &str = ".pdf";

/// Result of running discovery against a file.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// De-duplicated candidate URLs in discovery order.
    pub urls: Vec<String>,
    /// Set when the source could not be loaded.
    pub failure: Option<IngestFailure>,
}

/// Whether a cell is a candidate PDF URL.
pub fn is_candidate(cell: &Cell) -> bool {
    cell.as_text().is_some_and(|s| s.ends_with(PDF_SUFFIX))
}

/// Collect candidate URLs from a loaded table.
///
/// `ScanMode::PdfColumns` skips columns where no cell mentions "pdf". Every candidate
/// contains "pdf" itself, so both modes always return the same URLs.
pub fn discover_pdf_urls(source: &TabularSource, mode: ScanMode) -> Vec<String> {
    let columns = source.column_count();
    let scanned: Vec<bool> = match mode {
        ScanMode::EveryCell => vec![true; columns],
        ScanMode::PdfColumns => (0..columns)
            .map(|col| source.column(col).any(|cell| cell.text_form().contains("pdf")))
            .collect(),
    };

    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for row in &source.rows {
        for (col, cell) in row.iter().enumerate() {
            if !scanned[col] || !is_candidate(cell) {
                continue;
            }
            if let Some(url) = cell.as_text() {
                if seen.insert(url.to_string()) {
                    urls.push(url.to_string());
                }
            }
        }
    }

    urls
}

/// Load a tabular source from disk and discover candidate URLs.
///
/// A missing or unparseable file is not fatal: it is logged, recorded as a failure,
/// and discovery yields no candidates.
#[instrument(skip_all, fields(path = %path.display(), mode = %mode))]
pub fn discover_from_path(path: &Path, has_header: bool, mode: ScanMode) -> Discovery {
    match TabularSource::from_path(path, has_header) {
        Ok(source) => {
            let urls = discover_pdf_urls(&source, mode);
            info!("Discovered {} PDF links in {}", urls.len(), path.display());
            Discovery { urls, failure: None }
        }
        Err(e) => {
            warn!("Error processing {}: {}", path.display(), e);
            Discovery {
                urls: Vec::new(),
                failure: Some(IngestFailure::new(
                    path.display().to_string(),
                    FailureStage::Source,
                    e,
                )),
            }
        }
    }
}
