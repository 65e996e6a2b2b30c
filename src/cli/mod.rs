//! CLI module for Legis.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::{ChatMode, ScanMode};
use clap::{Parser, Subcommand};

/// Legis - chat with Senate hearing records and legislative documents
///
/// Builds a searchable index from local documents and the PDFs linked in a hearings
/// table, then answers questions about them over HTTP or in the terminal.
#[derive(Parser, Debug)]
#[command(name = "legis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Env file to load instead of ./.env
    #[arg(long, global = true)]
    pub env_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Accept connections before the index is built
        #[arg(long)]
        no_warm: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Chat mode (context, condense_question)
        #[arg(long)]
        mode: Option<ChatMode>,
    },

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,

        /// Number of passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// List PDF links found in the hearings table
    Discover {
        /// Table to scan (default from config)
        #[arg(long)]
        csv: Option<String>,

        /// Scan mode (every_cell, pdf_columns)
        #[arg(long)]
        mode: Option<ScanMode>,

        /// Treat the first row as a header row
        #[arg(long)]
        header: bool,
    },

    /// Assemble the corpus and report what was loaded
    Ingest {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List or search past chat exchanges
    History {
        /// Number of exchanges to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Only show exchanges containing this text
        #[arg(short, long)]
        search: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check configuration and inputs
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["legis", "-vv", "serve", "--port", "9000", "--no-warm"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { host, port, no_warm } => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
                assert!(no_warm);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_modes() {
        let cli = Cli::parse_from(["legis", "chat", "--mode", "condense"]);
        assert!(matches!(
            cli.command,
            Commands::Chat { mode: Some(ChatMode::CondenseQuestion), .. }
        ));

        let cli = Cli::parse_from(["legis", "discover", "--mode", "pdf_columns", "--header"]);
        assert!(matches!(
            cli.command,
            Commands::Discover { mode: Some(ScanMode::PdfColumns), header: true, .. }
        ));
    }

    #[test]
    fn test_parse_history() {
        let cli = Cli::parse_from(["legis", "history", "-n", "5", "--search", "wetlands"]);
        match cli.command {
            Commands::History { limit, search, json } => {
                assert_eq!(limit, 5);
                assert_eq!(search.as_deref(), Some("wetlands"));
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_env_file_is_global() {
        let cli = Cli::parse_from(["legis", "doctor", "--env-file", "~/secrets/legis.env"]);
        assert_eq!(cli.env_file.as_deref(), Some("~/secrets/legis.env"));
        assert!(matches!(cli.command, Commands::Doctor));
    }
}
