//! Ask command implementation.

use super::prepare_session;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ChatMode, Settings};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    top_k: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'legis doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.rag.model = model;
    }
    if let Some(top_k) = top_k {
        settings.rag.similarity_top_k = top_k;
    }
    // One-off questions have no history to condense against.
    settings.rag.chat_mode = ChatMode::Context;

    let session = prepare_session(settings).await?;

    let spinner = Output::spinner("Searching documents...");
    let result = session.engine.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    let link = source.source.starts_with("http").then_some(source.source.as_str());
                    Output::source(&source.label, source.score, &source.content, link);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
