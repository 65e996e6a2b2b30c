//! Persistent log of answered questions.
//!
//! Every exchange answered over the API or in the terminal is appended to a SQLite
//! table, and past exchanges can be listed or searched by text.

use crate::config::Settings;
use crate::error::{LegisError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chat_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chat_log_created ON chat_log(created_at);
"#;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatExchange {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only store of chat exchanges.
pub struct ChatLog {
    conn: Mutex<Connection>,
}

impl ChatLog {
    /// Open or create a log at `path`.
    #[instrument(skip_all)]
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened chat log at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a log that lives as long as the process.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the configured log, or `None` when `chat_log.enabled` is off.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        if !settings.chat_log.enabled {
            return Ok(None);
        }
        Self::open(&settings.chat_log_path()).map(Some)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LegisError::ChatLog(format!("Failed to acquire lock: {}", e)))
    }

    /// Append one exchange and return its id.
    pub fn record(&self, question: &str, answer: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO chat_log (question, answer, created_at) VALUES (?1, ?2, ?3)",
            params![question, answer, Utc::now().to_rfc3339()],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Recorded chat exchange {}", id);
        Ok(id)
    }

    /// The latest `limit` exchanges, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<ChatExchange>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, question, answer, created_at FROM chat_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], exchange_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Exchanges whose question or answer contains `query`, newest first.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<ChatExchange>> {
        let pattern = format!("%{}%", escape_like(query));
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, question, answer, created_at FROM chat_log
            WHERE question LIKE ?1 ESCAPE '\' OR answer LIKE ?1 ESCAPE '\'
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![pattern, limit as i64], exchange_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Number of recorded exchanges.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chat_log", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn exchange_from_row(row: &Row<'_>) -> rusqlite::Result<ChatExchange> {
    let created_at: String = row.get(3)?;
    Ok(ChatExchange {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_list_newest_first() {
        let log = ChatLog::in_memory().unwrap();
        log.record("Who chaired the hearing?", "Senator Smith.").unwrap();
        log.record("When was S. 1 introduced?", "In March.").unwrap();

        let recent = log.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].question, "When was S. 1 introduced?");
        assert_eq!(recent[1].answer, "Senator Smith.");
        assert_eq!(log.count().unwrap(), 2);

        assert_eq!(log.recent(1).unwrap().len(), 1);
    }

    #[test]
    fn test_search_matches_question_or_answer() {
        let log = ChatLog::in_memory().unwrap();
        log.record("What did the wetlands hearing cover?", "Tidal marsh restoration.").unwrap();
        log.record("Budget outlook?", "A 3% increase for wetlands programs.").unwrap();
        log.record("Who testified?", "Two witnesses.").unwrap();

        let hits = log.search("wetlands", 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].question, "Budget outlook?");

        assert_eq!(log.search("3%", 10).unwrap().len(), 1);
        assert!(log.search("100%", 10).unwrap().is_empty());
    }

    #[test]
    fn test_log_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/chat_log.db");

        ChatLog::open(&path).unwrap().record("q", "a").unwrap();

        let reopened = ChatLog::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_disabled_log_is_not_opened() {
        let mut settings = Settings::default();
        settings.chat_log.enabled = false;
        assert!(ChatLog::from_settings(&settings).unwrap().is_none());
    }
}
