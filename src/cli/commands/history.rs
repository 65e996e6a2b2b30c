//! History command: list or search past chat exchanges.

use crate::chat_log::{ChatExchange, ChatLog};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;

/// Run the history command.
pub fn run_history(
    limit: usize,
    search: Option<String>,
    json: bool,
    settings: &Settings,
) -> Result<()> {
    let Some(log) = ChatLog::from_settings(settings)? else {
        Output::warning("The chat log is disabled (chat_log.enabled = false).");
        return Ok(());
    };

    let exchanges = match search.as_deref() {
        Some(query) => log.search(query, limit)?,
        None => log.recent(limit)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&exchanges)?);
        return Ok(());
    }

    if exchanges.is_empty() {
        Output::info("No chat exchanges recorded yet.");
        return Ok(());
    }

    Output::header(&format!("Chat history ({})", settings.chat_log_path().display()));
    for exchange in &exchanges {
        print_exchange(exchange);
    }

    Ok(())
}

fn print_exchange(exchange: &ChatExchange) {
    println!();
    println!(
        "{} {}",
        style(exchange.created_at.format("%Y-%m-%d %H:%M")).dim(),
        style(&exchange.question).green().bold()
    );
    println!("  {}", exchange.answer);
}
