//! Document chunking for retrieval.
//!
//! Splits document text into overlapping windows sized in approximate tokens.

use crate::config::ChunkingSettings;
use crate::document::{Document, DocumentKind};
use serde::{Deserialize, Serialize};

/// Rough characters-per-token ratio for English prose.
pub const CHARS_PER_TOKEN: usize = 4;

/// A chunk of text from a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Path or URL of the originating document.
    pub source: String,
    /// Page-qualified source identifier.
    pub source_id: String,
    /// Display title of the originating document.
    pub title: String,
    /// Page number for paged formats.
    pub page: Option<u32>,
    /// Kind of the originating document.
    pub kind: DocumentKind,
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk within its document.
    pub order: i32,
}

impl ContentChunk {
    fn from_document(document: &Document, content: String, order: i32) -> Self {
        Self {
            source: document.source.clone(),
            source_id: document.source_id(),
            title: document.title.clone(),
            page: document.page,
            kind: document.kind,
            content,
            order,
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

/// Fixed-window chunker that prefers to break on whitespace.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chars: usize,
    overlap_chars: usize,
}

impl TextChunker {
    /// Create a chunker from sizes given in tokens.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let max_chars = (chunk_size * CHARS_PER_TOKEN).max(1);
        // Overlap must leave room for forward progress.
        let overlap_chars = (chunk_overlap * CHARS_PER_TOKEN).min(max_chars / 2);
        Self {
            max_chars,
            overlap_chars,
        }
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Split one document into chunks.
    pub fn chunk(&self, document: &Document) -> Vec<ContentChunk> {
        self.split(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, content)| ContentChunk::from_document(document, content, i as i32))
            .collect()
    }

    /// Split many documents, keeping document order.
    pub fn chunk_all<'a>(
        &self,
        documents: impl IntoIterator<Item = &'a Document>,
    ) -> Vec<ContentChunk> {
        documents.into_iter().flat_map(|d| self.chunk(d)).collect()
    }

    /// Split text into trimmed, non-empty windows.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut pieces = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let mut end = (start + self.max_chars).min(chars.len());

            if end < chars.len() {
                // Back off to the last whitespace in the second half of the window.
                let floor = start + self.max_chars / 2;
                if let Some(pos) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                    end = pos;
                }
            }

            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }

            if end >= chars.len() {
                break;
            }

            let mut next = end.saturating_sub(self.overlap_chars).max(start + 1);
            // Start the next window on a word boundary.
            if self.overlap_chars > 0 {
                while next < end && !chars[next - 1].is_whitespace() {
                    next += 1;
                }
            }
            start = next;
        }

        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(2048, 100);
        assert_eq!(chunker.split("  The committee met.  "), vec!["The committee met."]);
        assert!(chunker.split("   ").is_empty());
    }

    #[test]
    fn test_breaks_on_whitespace() {
        // 5 tokens = 20 chars per window, no overlap.
        let chunker = TextChunker::new(5, 0);
        let pieces = chunker.split("alpha beta gamma delta epsilon zeta eta theta");

        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.chars().count() <= 20);
            assert!(!piece.starts_with(' '));
        }
        assert_eq!(pieces.join(" "), "alpha beta gamma delta epsilon zeta eta theta");
    }

    #[test]
    fn test_overlap_repeats_trailing_words() {
        // 5 tokens = 20 chars, 2 tokens = 8 chars overlap.
        let chunker = TextChunker::new(5, 2);
        let pieces = chunker.split("one two three four five six seven eight nine ten");

        assert!(pieces.len() > 1);
        let first_last_word = pieces[0].split_whitespace().last().unwrap();
        assert!(pieces[1].split_whitespace().any(|w| w == first_last_word));
    }

    #[test]
    fn test_unbroken_text_still_progresses() {
        let chunker = TextChunker::new(2, 1);
        let text = "x".repeat(50);
        let pieces = chunker.split(&text);
        assert!(pieces.iter().all(|p| p.len() <= 8));
        assert!(pieces.len() >= 7);
    }

    #[test]
    fn test_chunk_carries_document_origin() {
        let doc = Document::new(
            "Testimony of the witness.".to_string(),
            "https://senate.gov/hearing.pdf",
            DocumentKind::RemotePdf,
        )
        .with_page(4);

        let chunks = TextChunker::new(2048, 100).chunk(&doc);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_id, "https://senate.gov/hearing.pdf#page=4");
        assert_eq!(chunks[0].label(), "hearing.pdf (p. 4)");
        assert_eq!(chunks[0].order, 0);
    }
}
