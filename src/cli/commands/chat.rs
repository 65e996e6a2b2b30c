//! Interactive chat command.

use super::prepare_session;
use crate::chat_log::ChatLog;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ChatMode, Settings};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(
    model: Option<String>,
    mode: Option<ChatMode>,
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
    if let Some(mode) = mode {
        settings.rag.chat_mode = mode;
    }

    let chat_log = ChatLog::from_settings(&settings)?;
    let session = prepare_session(settings).await?;
    let engine = &session.engine;

    println!("\n{}", style("Legis Chat").bold().cyan());
    println!(
        "{}",
        style(format!(
            "{} documents, {} chunks, model {} ({} mode)",
            session.corpus.local_documents + session.corpus.remote_documents,
            session.index.chunks,
            engine.model_name(),
            engine.mode()
        ))
        .dim()
    );
    println!(
        "{}\n",
        style(
            "Ask about Senate hearings and legislation, or 'exit' to quit. \
             Use 'clear' to reset conversation."
        )
        .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            engine.clear_history().await;
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = engine.chat(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                if let Some(log) = &chat_log {
                    if let Err(e) = log.record(input, &response.answer) {
                        tracing::warn!("Failed to record chat exchange: {}", e);
                    }
                }
                println!(
                    "\n{} {}\n",
                    style("Legis:").cyan().bold(),
                    response.format_for_display()
                );
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
