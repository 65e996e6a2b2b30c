//! Text extraction from downloaded or local documents.

use crate::error::{LegisError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Trait for turning a file on disk into per-page text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text, one entry per page. Pages without text are returned as empty strings.
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// PDF text extraction backed by `pdf-extract`.
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let owned: PathBuf = path.to_path_buf();
        let pages = run_parser(move || {
            pdf_extract::extract_text_by_pages(&owned).map_err(|e| {
                LegisError::Extraction(format!("Failed to extract text from PDF: {}", e))
            })
        })
        .await?;

        let pages: Vec<String> = pages.iter().map(|p| normalize_text(p)).collect();

        if pages.iter().all(|p| p.is_empty()) {
            return Err(LegisError::Extraction(
                "No text could be extracted from the PDF. It may be image-based or encrypted"
                    .to_string(),
            ));
        }

        debug!("Extracted {} pages", pages.len());
        Ok(pages)
    }
}

/// Run a CPU-bound parser on the blocking pool.
///
/// The parser can panic on malformed input. The panic is caught at the task boundary
/// and reported as an extraction error for this one document.
async fn run_parser<T, F>(parse: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(parse)
        .await
        .map_err(|e| LegisError::Extraction(format!("PDF parser aborted: {}", e)))?
}

/// Collapse runs of spaces and drop blank lines.
pub fn normalize_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A one-page PDF showing `text` in Helvetica.
#[cfg(test)]
pub(crate) fn sample_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", text);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    pdf.into_bytes()
}
