//! Discover command: list PDF links in the hearings table.

use crate::cli::Output;
use crate::config::{ScanMode, Settings};
use crate::discovery::discover_from_path;
use anyhow::Result;

/// Run the discover command.
pub fn run_discover(
    csv: Option<String>,
    mode: Option<ScanMode>,
    header: bool,
    settings: &Settings,
) -> Result<()> {
    let path = match csv {
        Some(path) => Settings::expand_path(&path),
        None => settings.hearings_csv(),
    };
    let mode = mode.unwrap_or(settings.corpus.scan_mode);
    let has_header = settings.corpus.has_header || header;

    let discovery = discover_from_path(&path, has_header, mode);

    if let Some(failure) = &discovery.failure {
        Output::error(&format!("Cannot read {}: {}", failure.source, failure.reason));
        return Err(anyhow::anyhow!("tabular source unavailable"));
    }

    Output::header(&format!("PDF links in {}", path.display()));
    for url in &discovery.urls {
        Output::list_item(url);
    }
    println!();
    Output::info(&format!("{} candidate URLs ({} scan)", discovery.urls.len(), mode));

    Ok(())
}
