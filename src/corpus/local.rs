//! Local document directory reader.
//!
//! Walks a directory recursively and turns supported files into documents.

use crate::document::{Document, DocumentKind, FailureStage, IngestFailure};
use crate::error::Result;
use crate::extract::{normalize_text, TextExtractor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

/// Supported plain-text extensions.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Supported delimited-data extensions.
const TABLE_EXTENSIONS: &[&str] = &["csv", "tsv"];

/// Documents read from disk, plus files that could not be read.
#[derive(Debug, Default)]
pub struct LocalLoad {
    pub documents: Vec<Document>,
    pub failures: Vec<IngestFailure>,
}

/// Reads every supported file under a root directory.
pub struct LocalReader {
    root: PathBuf,
    extractor: Arc<dyn TextExtractor>,
}

impl LocalReader {
    pub fn new(root: PathBuf, extractor: Arc<dyn TextExtractor>) -> Self {
        Self { root, extractor }
    }

    /// Root directory being read.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if a path has a supported extension.
    pub fn is_supported(path: &Path) -> bool {
        match extension(path) {
            Some(ext) => {
                TEXT_EXTENSIONS.contains(&ext.as_str())
                    || TABLE_EXTENSIONS.contains(&ext.as_str())
                    || ext == "json"
                    || ext == "pdf"
            }
            None => false,
        }
    }

    /// Read all supported files, in sorted path order.
    ///
    /// Hidden entries are skipped. Symlinks are followed, and a link that loops back
    /// to an ancestor is recorded as a failure.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn load(&self) -> LocalLoad {
        let mut load = LocalLoad::default();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    warn!("Cannot read document directory {}: {}", self.root.display(), e);
                    load.failures.push(IngestFailure::new(
                        self.root.display().to_string(),
                        FailureStage::LocalRead,
                        e,
                    ));
                    return load;
                }
                Err(e) => {
                    let source = e.path().unwrap_or(self.root.as_path()).display().to_string();
                    warn!("Cannot read {}: {}", source, e);
                    load.failures.push(IngestFailure::new(source, FailureStage::LocalRead, e));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !Self::is_supported(path) {
                debug!("Skipping unsupported file {:?}", path);
                continue;
            }

            match self.read_file(path).await {
                Ok(docs) => load.documents.extend(docs),
                Err(e) => {
                    warn!("Failed to read {:?}: {}", path, e);
                    load.failures.push(IngestFailure::new(
                        path.display().to_string(),
                        FailureStage::LocalRead,
                        e,
                    ));
                }
            }
        }

        info!("Loaded {} documents from {}", load.documents.len(), self.root.display());
        load
    }

    /// Turn one file into zero or more documents.
    async fn read_file(&self, path: &Path) -> Result<Vec<Document>> {
        let source = path.display().to_string();
        let ext = extension(path).unwrap_or_default();

        if ext == "pdf" {
            let pages = self.extractor.extract_pages(path).await?;
            return Ok(pages
                .into_iter()
                .enumerate()
                .filter(|(_, text)| !text.trim().is_empty())
                .map(|(i, text)| {
                    Document::new(text, source.clone(), DocumentKind::Local)
                        .with_page(i as u32 + 1)
                })
                .collect());
        }

        let content = std::fs::read_to_string(path)?;
        let text = match ext.as_str() {
            "csv" => table_to_text(&content, b',')?,
            "tsv" => table_to_text(&content, b'\t')?,
            "json" => json_to_text(&content),
            _ => normalize_text(&content),
        };

        if text.trim().is_empty() {
            debug!("Skipping empty file {:?}", path);
            return Ok(Vec::new());
        }

        Ok(vec![Document::new(text, source, DocumentKind::Local)])
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Render delimited data as `header: value` lines, one per row.
fn table_to_text(content: &str, delimiter: u8) -> Result<String> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut lines = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let row = record
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(i, value)| match headers.get(i) {
                Some(header) if !header.is_empty() => format!("{}: {}", header, value.trim()),
                _ => value.trim().to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        if !row.is_empty() {
            lines.push(row);
        }
    }

    Ok(lines.join("\n"))
}

/// Flatten JSON into `path: value` lines. Invalid JSON is kept as plain text.
fn json_to_text(content: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value) => {
            let mut lines = Vec::new();
            flatten_json(&value, "", &mut lines);
            lines.join("\n")
        }
        Err(_) => normalize_text(content),
    }
}

fn flatten_json(value: &serde_json::Value, prefix: &str, lines: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_json(val, &path, lines);
            }
        }
        serde_json::Value::Array(items) => {
            for (i, val) in items.iter().enumerate() {
                flatten_json(val, &format!("{}[{}]", prefix, i), lines);
            }
        }
        serde_json::Value::Null => {}
        serde_json::Value::String(s) => lines.push(format!("{}: {}", prefix, s)),
        other => lines.push(format!("{}: {}", prefix, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct PagedExtractor;

    #[async_trait]
    impl TextExtractor for PagedExtractor {
        async fn extract_pages(&self, _path: &Path) -> Result<Vec<String>> {
            Ok(vec!["Cover".to_string(), "Body".to_string()])
        }
    }

    fn reader(root: &Path) -> LocalReader {
        LocalReader::new(root.to_path_buf(), Arc::new(PagedExtractor))
    }

    #[test]
    fn test_is_supported() {
        assert!(LocalReader::is_supported(Path::new("bill.txt")));
        assert!(LocalReader::is_supported(Path::new("hearings.CSV")));
        assert!(LocalReader::is_supported(Path::new("report.pdf")));
        assert!(!LocalReader::is_supported(Path::new("photo.png")));
        assert!(!LocalReader::is_supported(Path::new("Makefile")));
    }

    #[test]
    fn test_table_to_text() {
        let text =
            table_to_text("title,link\nHearing A,https://x.gov/a.pdf\nHearing B,\n", b',').unwrap();
        assert_eq!(text, "title: Hearing A, link: https://x.gov/a.pdf\ntitle: Hearing B");
    }

    #[test]
    fn test_json_to_text() {
        let text = json_to_text(
            r#"{"bill": {"number": "S. 12", "sponsors": ["A", "B"]}, "passed": false}"#,
        );
        assert!(text.contains("bill.number: S. 12"));
        assert!(text.contains("bill.sponsors[1]: B"));
        assert!(text.contains("passed: false"));
    }

    #[tokio::test]
    async fn test_load_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bills")).unwrap();
        std::fs::write(dir.path().join("bills/b.txt"), "Bill B text").unwrap();
        std::fs::write(dir.path().join("a.md"), "# Hearing notes").unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("image.png"), b"\x89PNG").unwrap();
        std::fs::write(dir.path().join(".hidden.txt"), "secret").unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/notes.txt"), "internal").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "   \n").unwrap();

        let load = reader(dir.path()).load().await;

        assert!(load.failures.is_empty());
        let titles: Vec<String> = load.documents.iter().map(|d| d.label()).collect();
        assert_eq!(
            titles,
            vec!["a.md", "b.txt", "report.pdf (p. 1)", "report.pdf (p. 2)"]
        );
        assert!(load.documents.iter().all(|d| d.kind == DocumentKind::Local));
    }

    #[tokio::test]
    async fn test_missing_directory_is_recovered() {
        let load = reader(Path::new("/nonexistent/legis-data")).load().await;
        assert!(load.documents.is_empty());
        assert_eq!(load.failures.len(), 1);
        assert_eq!(load.failures[0].stage, FailureStage::LocalRead);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        std::fs::write(dir.path().join("good.txt"), "ok").unwrap();

        let load = reader(dir.path()).load().await;
        assert_eq!(load.documents.len(), 1);
        assert_eq!(load.failures.len(), 1);
        assert!(load.failures[0].source.ends_with("bad.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_followed_and_loops_recorded() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("shared.txt"), "Shared committee memo").unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("local.txt"), "Local notes").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let load = reader(dir.path()).load().await;

        let labels: Vec<String> = load.documents.iter().map(|d| d.label()).collect();
        assert_eq!(labels, vec!["shared.txt", "local.txt"]);
        assert_eq!(load.failures.len(), 1);
        assert!(load.failures[0].source.ends_with("loop"));
    }
}
