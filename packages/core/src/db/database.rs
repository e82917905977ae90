//! Database Connection Management
//!
//! Owns the libsql database holding the import staging tables. The schema
//! uses `CREATE TABLE IF NOT EXISTS` only, so opening an existing staging
//! database never migrates anything.
//!
//! Always use `connect_with_timeout()` in async code: the busy timeout lets
//! concurrent statements wait instead of failing with `SQLITE_BUSY` when
//! the runtime moves futures between threads.

use crate::db::error::DatabaseError;
use libsql::{Builder, Connection, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service managing the libsql connection and staging schema.
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the staging database at `db_path`.
    ///
    /// Ensures the parent directory exists, opens the file, enables WAL
    /// mode and initializes the staging tables.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = DatabaseService {
            db: Arc::new(db),
            db_path,
        };
        service.init_schema().await?;
        Ok(service)
    }

    /// Connection with a 5 second busy timeout for async contexts.
    pub async fn connect_with_timeout(&self) -> Result<Connection, DatabaseError> {
        let conn = self.db.connect()?;
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        Ok(conn)
    }

    /// PRAGMA statements return rows, so query() must be used instead of
    /// execute().
    async fn execute_pragma(
        &self,
        conn: &Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    async fn init_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.db.connect()?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS imports (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL DEFAULT 'pending',
                import_dir TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create imports: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS import_notes (
                importer_id TEXT NOT NULL,
                source_path TEXT NOT NULL,
                source_id TEXT,
                journal TEXT NOT NULL,
                content TEXT NOT NULL,
                front_matter TEXT NOT NULL,
                quill_id TEXT NOT NULL,
                quill_path TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                error TEXT,
                PRIMARY KEY (importer_id, source_path)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create import_notes: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS import_files (
                quill_id TEXT PRIMARY KEY,
                importer_id TEXT NOT NULL,
                source_path_resolved TEXT NOT NULL UNIQUE,
                filename TEXT NOT NULL,
                extension TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                error TEXT
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create import_files: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_import_notes_status
             ON import_notes(importer_id, status)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create index: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_import_files_status
             ON import_files(importer_id, status)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create index: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_import_files_filename
             ON import_files(filename)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create index: {}", e))
        })?;

        Ok(())
    }
}
