//! SQLite-backed conversation history.

use super::HistoryStore;
use crate::types::{ConversationTurn, UserStats};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use medrag_core::{AppError, AppResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS chat_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    org_id TEXT,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    model_name TEXT NOT NULL,
    category TEXT NOT NULL,
    related_documents TEXT NOT NULL,
    suggested_questions TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chat_history_user ON chat_history(user_id, org_id, timestamp);
"#;

const SELECT_COLUMNS: &str = "user_id, org_id, question, answer, model_name, category, \
     related_documents, suggested_questions, timestamp";

/// Conversation history in a `chat_history` table.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
    retention_days: Option<u32>,
}

impl SqliteHistoryStore {
    /// Open the store at `db_path`.
    ///
    /// With `create_table` false a missing table is left missing: appends
    /// report failure and reads come back empty.
    pub fn open(db_path: &Path, create_table: bool) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::History(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::History(format!("Failed to open history database: {}", e)))?;

        tracing::debug!("Opened history database at {:?}", db_path);
        Self::init(conn, create_table)
    }

    /// In-memory store, mostly for tests.
    pub fn open_in_memory(create_table: bool) -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::History(format!("Failed to open history database: {}", e)))?;

        Self::init(conn, create_table)
    }

    fn init(conn: Connection, create_table: bool) -> AppResult<Self> {
        if create_table {
            conn.execute_batch(CREATE_TABLE_SQL)
                .map_err(|e| AppError::History(format!("Failed to create history table: {}", e)))?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
            retention_days: None,
        })
    }

    /// Delete turns older than `days` after every append.
    pub fn with_retention(mut self, days: Option<u32>) -> Self {
        self.retention_days = days;
        self
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::History("History connection lock poisoned".to_string()))
    }

    fn insert(&self, turn: &ConversationTurn) -> AppResult<()> {
        let related = serde_json::to_string(&turn.related_documents)?;
        let suggested = serde_json::to_string(&turn.suggested_questions)?;

        let conn = self.lock()?;
        if !table_exists(&conn)? {
            return Err(AppError::History(
                "chat_history table does not exist".to_string(),
            ));
        }

        conn.execute(
            "INSERT INTO chat_history (user_id, org_id, question, answer, model_name, category, \
             related_documents, suggested_questions, timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                turn.user_id,
                turn.org_id,
                turn.question,
                turn.answer,
                turn.model_name,
                turn.category,
                related,
                suggested,
                format_timestamp(&turn.timestamp),
            ],
        )
        .map_err(|e| AppError::History(format!("Failed to insert turn: {}", e)))?;

        if let Some(days) = self.retention_days {
            let cutoff = Utc::now() - Duration::days(i64::from(days));
            let removed = conn
                .execute(
                    "DELETE FROM chat_history WHERE timestamp < ?1",
                    params![format_timestamp(&cutoff)],
                )
                .map_err(|e| AppError::History(format!("Failed to prune history: {}", e)))?;
            if removed > 0 {
                tracing::debug!("Pruned {} turns older than {} days", removed, days);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(&self, turn: &ConversationTurn) -> bool {
        match self.insert(turn) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to store turn for user {}: {}", turn.user_id, e);
                false
            }
        }
    }

    async fn recent(
        &self,
        user_id: &str,
        org_id: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<ConversationTurn>> {
        let conn = self.lock()?;
        if !table_exists(&conn)? {
            tracing::debug!("chat_history table missing, no history for {}", user_id);
            return Ok(Vec::new());
        }

        let limit = limit as i64;
        let turns = match org_id {
            Some(org_id) => query_turns(
                &conn,
                &format!(
                    "SELECT {} FROM chat_history WHERE user_id = ?1 AND org_id = ?2 \
                     ORDER BY timestamp DESC, id DESC LIMIT ?3",
                    SELECT_COLUMNS
                ),
                &[&user_id, &org_id, &limit],
            ),
            None => query_turns(
                &conn,
                &format!(
                    "SELECT {} FROM chat_history WHERE user_id = ?1 \
                     ORDER BY timestamp DESC, id DESC LIMIT ?2",
                    SELECT_COLUMNS
                ),
                &[&user_id, &limit],
            ),
        };

        turns.map_err(|e| AppError::History(format!("Failed to read history: {}", e)))
    }

    async fn stats(&self, user_id: &str, org_id: Option<&str>) -> AppResult<UserStats> {
        let conn = self.lock()?;
        if !table_exists(&conn)? {
            return Ok(UserStats::default());
        }

        let mut args: Vec<&dyn rusqlite::ToSql> = Vec::new();
        args.push(&user_id);
        let scope = match org_id.as_ref() {
            Some(org_id) => {
                args.push(org_id);
                "user_id = ?1 AND org_id = ?2"
            }
            None => "user_id = ?1",
        };

        let (total, first, last) = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*), MIN(timestamp), MAX(timestamp) FROM chat_history WHERE {}",
                    scope
                ),
                args.as_slice(),
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .map_err(|e| AppError::History(format!("Failed to aggregate history: {}", e)))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT DISTINCT category FROM chat_history WHERE {} ORDER BY category",
                scope
            ))
            .map_err(|e| AppError::History(format!("Failed to prepare query: {}", e)))?;
        let categories = stmt
            .query_map(args.as_slice(), |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| AppError::History(format!("Failed to read categories: {}", e)))?;

        Ok(UserStats {
            total_questions: total as u64,
            first_interaction: first.as_deref().map(parse_timestamp).transpose()?,
            last_interaction: last.as_deref().map(parse_timestamp).transpose()?,
            categories_count: categories.len(),
            categories,
        })
    }

    async fn table_exists(&self) -> bool {
        match self.lock() {
            Ok(conn) => table_exists(&conn).unwrap_or(false),
            Err(_) => false,
        }
    }
}

fn table_exists(conn: &Connection) -> AppResult<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'chat_history'",
        [],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(|e| AppError::History(format!("Failed to inspect schema: {}", e)))
}

fn query_turns(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<ConversationTurn>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, read_turn)?;
    rows.collect()
}

fn read_turn(row: &Row<'_>) -> rusqlite::Result<ConversationTurn> {
    let related: String = row.get(6)?;
    let suggested: String = row.get(7)?;
    let timestamp: String = row.get(8)?;

    Ok(ConversationTurn {
        user_id: row.get(0)?,
        org_id: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        model_name: row.get(4)?,
        category: row.get(5)?,
        related_documents: serde_json::from_str(&related)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?,
        suggested_questions: serde_json::from_str(&suggested)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
    })
}

/// Fixed-width UTC timestamps, so text order matches time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::History(format!("Invalid stored timestamp '{}': {}", raw, e)))
}
