//! Ingest command: assemble the corpus and report the result.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::corpus::CorpusAssembler;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(json: bool, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Ingest)?;

    let assembler = CorpusAssembler::from_settings(settings)?;

    let spinner = (!json).then(|| Output::spinner("Loading documents and downloading PDFs..."));
    let assembled = assembler.assemble().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let summary = assembled.summary();

    if json {
        let report = serde_json::json!({
            "summary": summary,
            "candidates": assembled.candidates,
            "failures": assembled.failures,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Output::header("Corpus");
    Output::kv("Local documents", &summary.local_documents.to_string());
    Output::kv("PDF documents", &summary.remote_documents.to_string());
    Output::kv("Candidate URLs", &summary.candidate_urls.to_string());

    if assembled.failures.is_empty() {
        println!();
        Output::success("All sources loaded.");
    } else {
        Output::header("Failures");
        for failure in &assembled.failures {
            Output::failure(&failure.stage.to_string(), &failure.source, &failure.reason);
        }
        println!();
        Output::warning(&format!("{} sources were skipped.", summary.failures));
    }

    Ok(())
}
