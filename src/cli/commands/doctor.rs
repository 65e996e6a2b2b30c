//! Doctor command - verify configuration and inputs.

use crate::cli::Output;
use crate::config::Settings;
use crate::discovery::discover_from_path;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Legis Doctor");
    println!();
    println!("Checking configuration and inputs...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_check = check_openai_api_key();
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Inputs").bold());
    let input_checks = vec![check_corpus_dir(settings), check_hearings_table(settings)];
    for check in &input_checks {
        check.print();
    }
    checks.extend(input_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![
        check_config_file(),
        check_providers(settings),
        check_saved_index(settings).await,
    ];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Legis.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Legis is ready to use.");
    }

    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...' or add it to ./.env",
        ),
    }
}

/// Check the local document directory.
fn check_corpus_dir(settings: &Settings) -> CheckResult {
    let dir = settings.corpus_dir();
    match std::fs::read_dir(&dir) {
        Ok(entries) => {
            let count = entries.filter_map(|e| e.ok()).count();
            CheckResult::ok(
                "Document directory",
                &format!("{} ({} entries)", dir.display(), count),
            )
        }
        Err(_) => CheckResult::warning(
            "Document directory",
            &format!("{} (missing)", dir.display()),
            "Only PDFs linked from the hearings table will be indexed",
        ),
    }
}

/// Check that the hearings table parses and contains links.
fn check_hearings_table(settings: &Settings) -> CheckResult {
    let path = settings.hearings_csv();
    let discovery =
        discover_from_path(&path, settings.corpus.has_header, settings.corpus.scan_mode);

    match discovery.failure {
        Some(failure) => CheckResult::warning(
            "Hearings table",
            &format!("{} ({})", path.display(), failure.reason),
            "Set corpus.hearings_csv in the config file",
        ),
        None if discovery.urls.is_empty() => CheckResult::warning(
            "Hearings table",
            &format!("{} (no PDF links)", path.display()),
            "Links must end in .pdf (case-sensitive)",
        ),
        None => CheckResult::ok(
            "Hearings table",
            &format!("{} ({} PDF links)", path.display(), discovery.urls.len()),
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning("Config file", "using defaults", "Create with: legis config init")
    }
}

/// Check provider names before a build fails on them.
fn check_providers(settings: &Settings) -> CheckResult {
    let embedding = settings.embedding.provider.to_lowercase();
    let store = settings.vector_store.provider.to_lowercase();

    if !matches!(embedding.as_str(), "openai" | "hashed") {
        return CheckResult::error(
            "Providers",
            &format!("unknown embedding provider '{}'", embedding),
            "Use 'openai' or 'hashed'",
        );
    }
    if !matches!(store.as_str(), "memory" | "sqlite") {
        return CheckResult::error(
            "Providers",
            &format!("unknown vector store '{}'", store),
            "Use 'memory' or 'sqlite'",
        );
    }

    CheckResult::ok(
        "Providers",
        &format!(
            "{} embeddings, {} store, {} ({})",
            embedding, store, settings.rag.model, settings.rag.chat_mode
        ),
    )
}

/// Report what a sqlite index on disk currently holds.
async fn check_saved_index(settings: &Settings) -> CheckResult {
    if !settings.vector_store.provider.eq_ignore_ascii_case("sqlite") {
        return CheckResult::ok("Saved index", "in-memory store, rebuilt on every start");
    }

    let path = settings.sqlite_path();
    if !path.exists() {
        return CheckResult::warning(
            "Saved index",
            &format!("{} (not built yet)", path.display()),
            "Built when legis serve, chat or ask starts",
        );
    }

    let count = match SqliteVectorStore::new(&path) {
        Ok(store) => store.chunk_count().await,
        Err(e) => Err(e),
    };
    match count {
        Ok(0) => CheckResult::warning(
            "Saved index",
            &format!("{} (empty)", path.display()),
            "Built when legis serve, chat or ask starts",
        ),
        Ok(chunks) => {
            CheckResult::ok("Saved index", &format!("{} ({} chunks)", path.display(), chunks))
        }
        Err(e) => CheckResult::error(
            "Saved index",
            &format!("{} ({})", path.display(), e),
            "Delete the file and restart legis serve",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_check_providers() {
        let mut settings = Settings::default();
        assert_eq!(check_providers(&settings).status, CheckStatus::Ok);

        settings.vector_store.provider = "chroma".to_string();
        assert_eq!(check_providers(&settings).status, CheckStatus::Error);
    }

    #[test]
    fn test_check_hearings_table_counts_links() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("hearings.csv");
        std::fs::write(&csv, "title,link\nA,https://x.gov/a.pdf\nB,https://x.gov/b.PDF\n").unwrap();

        let mut settings = Settings::default();
        settings.corpus.hearings_csv = csv.display().to_string();

        let result = check_hearings_table(&settings);
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("1 PDF links"));
    }

    #[tokio::test]
    async fn test_check_saved_index_counts_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.vector_store.provider = "sqlite".to_string();
        settings.vector_store.sqlite_path = dir.path().join("index.db").display().to_string();

        assert_eq!(check_saved_index(&settings).await.status, CheckStatus::Warning);

        let store = SqliteVectorStore::new(&settings.sqlite_path()).unwrap();
        store
            .replace_all(&[crate::vector_store::test_chunk("a.txt", None, "S. 1", vec![1.0])])
            .await
            .unwrap();

        let result = check_saved_index(&settings).await;
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("1 chunks"));
    }
}
