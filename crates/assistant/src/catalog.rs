//! Document chunk catalog.
//!
//! Read access to the `docs_chunks` table that backs the search index:
//! category and document listings plus raw chunk text for question mining.

use crate::types::ALL_CATEGORIES;
use async_trait::async_trait;
use medrag_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Listing and scanning over indexed document chunks.
#[async_trait]
pub trait DocumentCatalog: Send + Sync {
    /// Distinct categories, prefixed by `ALL`.
    async fn categories(&self) -> AppResult<Vec<String>>;

    /// Distinct relative paths of indexed documents.
    async fn documents(&self) -> AppResult<Vec<String>>;

    /// Up to `limit` chunk texts containing a `?`, optionally in one category.
    async fn question_candidates(&self, category: &str, limit: usize) -> AppResult<Vec<String>>;
}

/// SQLite-backed catalog.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open the catalog at `db_path`, creating the chunk table if needed.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Catalog(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Catalog(format!("Failed to open catalog: {}", e)))?;

        Self::init(conn)
    }

    /// In-memory catalog, mostly for tests.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Catalog(format!("Failed to open catalog: {}", e)))?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS docs_chunks (
                chunk TEXT NOT NULL,
                relative_path TEXT NOT NULL,
                category TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_docs_chunks_category ON docs_chunks(category);
            "#,
        )
        .map_err(|e| AppError::Catalog(format!("Failed to create chunk table: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert one chunk row.
    pub fn insert_chunk(&self, chunk: &str, relative_path: &str, category: &str) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO docs_chunks (chunk, relative_path, category) VALUES (?1, ?2, ?3)",
            params![chunk, relative_path, category],
        )
        .map_err(|e| AppError::Catalog(format!("Failed to insert chunk: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Catalog("Catalog connection lock poisoned".to_string()))
    }

    fn distinct_column(&self, sql: &str) -> AppResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| AppError::Catalog(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| AppError::Catalog(format!("Failed to query catalog: {}", e)))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Catalog(format!("Failed to read catalog row: {}", e)))
    }
}

#[async_trait]
impl DocumentCatalog for SqliteCatalog {
    async fn categories(&self) -> AppResult<Vec<String>> {
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        categories.extend(self.distinct_column(
            "SELECT DISTINCT category FROM docs_chunks WHERE category <> '' ORDER BY category",
        )?);
        Ok(categories)
    }

    async fn documents(&self) -> AppResult<Vec<String>> {
        self.distinct_column(
            "SELECT DISTINCT relative_path FROM docs_chunks WHERE relative_path <> '' ORDER BY relative_path",
        )
    }

    async fn question_candidates(&self, category: &str, limit: usize) -> AppResult<Vec<String>> {
        let conn = self.lock()?;
        let limit = limit as i64;

        let rows = if category == ALL_CATEGORIES {
            query_chunks(
                &conn,
                "SELECT chunk FROM docs_chunks WHERE instr(chunk, '?') > 0 LIMIT ?1",
                &[&limit],
            )
        } else {
            query_chunks(
                &conn,
                "SELECT chunk FROM docs_chunks WHERE instr(chunk, '?') > 0 AND category = ?1 LIMIT ?2",
                &[&category, &limit],
            )
        };

        rows.map_err(|e| AppError::Catalog(format!("Failed to scan chunks: {}", e)))
    }
}

fn query_chunks(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
    rows.collect()
}
