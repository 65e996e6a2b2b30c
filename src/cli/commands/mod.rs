//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod discover;
mod doctor;
mod history;
mod ingest;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use discover::run_discover;
pub use doctor::run_doctor;
pub use history::run_history;
pub use ingest::run_ingest;
pub use serve::{build_router, build_router_with_log, run_serve, AppState};

use crate::cli::Output;
use crate::config::Settings;
use crate::session::{ChatSession, DefaultSessionFactory, SessionHandle};
use std::sync::Arc;

/// Build a session for a one-off command, showing progress.
async fn prepare_session(settings: Settings) -> anyhow::Result<Arc<ChatSession>> {
    let handle = SessionHandle::new(Arc::new(DefaultSessionFactory::new(settings)));

    let spinner = Output::spinner("Loading documents and building index...");
    let result = handle.ensure_ready().await;
    spinner.finish_and_clear();

    let session = result?;
    Output::success(&format!(
        "Indexed {} chunks from {} local and {} PDF documents",
        session.index.chunks, session.corpus.local_documents, session.corpus.remote_documents
    ));
    if !session.failures.is_empty() {
        Output::warning(&format!(
            "{} sources could not be loaded (see 'legis ingest')",
            session.failures.len()
        ));
    }

    Ok(session)
}
