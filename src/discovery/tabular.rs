//! In-memory tabular source loaded from a delimited file.

use crate::error::Result;
use std::io::Read;
use std::path::Path;
use tracing::{debug, instrument};

/// Markers a dataframe reader treats as missing values.
const NA_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "None", "#N/A"];

/// A single cell, coerced the way a dataframe reader would.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Coerce a raw field into a typed cell.
    pub fn parse(raw: &str) -> Self {
        if NA_MARKERS.contains(&raw) {
            return Cell::Empty;
        }
        match raw.trim().parse::<f64>() {
            Ok(n) if !raw.trim().is_empty() => Cell::Number(n),
            _ => Cell::Text(raw.to_string()),
        }
    }

    /// Text form of the cell (`nan` for missing values).
    pub fn text_form(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => "nan".to_string(),
        }
    }

    /// The string content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Rows of cells with an optional header.
#[derive(Debug, Clone, Default)]
pub struct TabularSource {
    /// Column names, when the source has a header row.
    pub headers: Option<Vec<String>>,
    /// Data rows in file order.
    pub rows: Vec<Vec<Cell>>,
}

impl TabularSource {
    /// Load a delimited file. `.tsv` files are tab separated, everything else uses commas.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path, has_header: bool) -> Result<Self> {
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        };
        let file = std::fs::File::open(path)?;
        let source = Self::from_reader(file, has_header, delimiter)?;
        debug!("Loaded {} rows", source.rows.len());
        Ok(source)
    }

    /// Load delimited data from any reader. Rows may have differing lengths.
    pub fn from_reader<R: Read>(reader: R, has_header: bool, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(has_header)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = if has_header {
            Some(rdr.headers()?.iter().map(|h| h.to_string()).collect())
        } else {
            None
        };

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::parse).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Number of columns (the widest row or header).
    pub fn column_count(&self) -> usize {
        let widest_row = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let header_len = self.headers.as_ref().map(Vec::len).unwrap_or(0);
        widest_row.max(header_len)
    }

    /// Iterate the cells of one column, skipping rows too short to have it.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_coercion() {
        assert_eq!(Cell::parse(""), Cell::Empty);
        assert_eq!(Cell::parse("NaN"), Cell::Empty);
        assert_eq!(Cell::parse("118"), Cell::Number(118.0));
        assert_eq!(Cell::parse("3.5"), Cell::Number(3.5));
        assert_eq!(
            Cell::parse("https://x.gov/a.pdf"),
            Cell::Text("https://x.gov/a.pdf".to_string())
        );
        assert_eq!(Cell::parse("  "), Cell::Text("  ".to_string()));
    }

    #[test]
    fn test_from_reader_with_header() {
        let data = "title,link\nHearing A,https://x.gov/a.pdf\nHearing B,\n";
        let source = TabularSource::from_reader(data.as_bytes(), true, b',').unwrap();

        assert_eq!(
            source.headers,
            Some(vec!["title".to_string(), "link".to_string()])
        );
        assert_eq!(source.rows.len(), 2);
        assert_eq!(source.rows[1][1], Cell::Empty);
        assert_eq!(source.column_count(), 2);
    }

    #[test]
    fn test_ragged_rows() {
        let data = "a\nb,c,d\n";
        let source = TabularSource::from_reader(data.as_bytes(), false, b',').unwrap();
        assert_eq!(source.column_count(), 3);
        assert_eq!(source.column(2).count(), 1);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = TabularSource::from_path(Path::new("/nonexistent/hearings.csv"), true);
        assert!(result.is_err());
    }
}
