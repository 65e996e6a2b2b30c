//! Legis CLI entry point.

use anyhow::Result;
use clap::Parser;
use legis::cli::{commands, Cli, Commands};
use legis::config::{load_env_file, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // OPENAI_API_KEY may come from an env file; ./.env is optional.
    match &cli.env_file {
        Some(path) => load_env_file(&Settings::expand_path(path))?,
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let config_path = cli.config.as_ref().map(|p| Settings::expand_path(p));
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("legis={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    match &cli.command {
        Commands::Serve { host, port, no_warm } => {
            commands::run_serve(host.clone(), *port, *no_warm, settings).await?;
        }

        Commands::Chat { model, mode } => {
            commands::run_chat(model.clone(), *mode, settings).await?;
        }

        Commands::Ask {
            question,
            model,
            top_k,
        } => {
            commands::run_ask(question, model.clone(), *top_k, settings).await?;
        }

        Commands::Discover {
            csv,
            mode,
            header,
        } => {
            commands::run_discover(csv.clone(), *mode, *header, &settings)?;
        }

        Commands::Ingest { json } => {
            commands::run_ingest(*json, &settings).await?;
        }

        Commands::History {
            limit,
            search,
            json,
        } => {
            commands::run_history(*limit, search.clone(), *json, &settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
