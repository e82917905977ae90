//! Staging Store
//!
//! Repository interface over the staging tables, injected into the import
//! services so all staging mutation funnels through one place. The libsql
//! implementation delegates to [`DatabaseService`] and converts rows back
//! into the model structs.
//!
//! Insert operations are insert-or-skip: staging the same note or file
//! twice is a conflict on the primary key (or the resolved-path uniqueness
//! for files) and reports `false` instead of failing, which is what makes
//! re-running an import safe.

use async_trait::async_trait;
use libsql::Row;

use crate::db::{DatabaseError, DatabaseService};
use crate::models::{FileStatus, ImportRun, NoteStatus, RunStatus, StagedFile, StagedNote};

/// Repository for the owned staging tables.
#[async_trait]
pub trait StagingStore: Send + Sync {
    async fn insert_run(&self, run: &ImportRun) -> Result<(), DatabaseError>;
    async fn latest_pending_run(&self) -> Result<Option<ImportRun>, DatabaseError>;
    async fn complete_run(&self, id: &str) -> Result<(), DatabaseError>;

    /// Insert a staged note; returns false when the `(importer_id,
    /// source_path)` key is already present.
    async fn insert_note(&self, note: &StagedNote) -> Result<bool, DatabaseError>;
    async fn notes_for_importer(&self, importer_id: &str) -> Result<Vec<StagedNote>, DatabaseError>;
    async fn set_note_status(
        &self,
        importer_id: &str,
        source_path: &str,
        status: NoteStatus,
        error: Option<&str>,
    ) -> Result<(), DatabaseError>;
    async fn count_note_errors(&self, importer_id: &str) -> Result<u64, DatabaseError>;

    /// Insert a staged file; returns false when the resolved source path
    /// was already staged.
    async fn insert_file(&self, file: &StagedFile) -> Result<bool, DatabaseError>;
    async fn files_for_importer(&self, importer_id: &str) -> Result<Vec<StagedFile>, DatabaseError>;
    async fn find_file_by_path(&self, resolved: &str) -> Result<Option<StagedFile>, DatabaseError>;
    async fn find_file_by_name(&self, filename: &str)
        -> Result<Option<StagedFile>, DatabaseError>;
    /// Move a pending file to `referenced`; later states are not demoted.
    async fn mark_file_referenced(&self, quill_id: &str) -> Result<(), DatabaseError>;
    async fn files_by_status(
        &self,
        importer_id: &str,
        status: FileStatus,
    ) -> Result<Vec<StagedFile>, DatabaseError>;
    async fn set_file_status(
        &self,
        quill_id: &str,
        status: FileStatus,
        error: Option<&str>,
    ) -> Result<(), DatabaseError>;
    /// Mark all still-pending files of this importer as orphaned; returns
    /// the number of rows changed.
    async fn mark_pending_files_orphaned(&self, importer_id: &str) -> Result<u64, DatabaseError>;

    /// Remove every staging row that did not reach a created/complete
    /// state, so a clean re-import can be attempted.
    async fn clear_incomplete(&self) -> Result<(), DatabaseError>;
}

/// libsql-backed [`StagingStore`].
pub struct TursoStagingStore {
    db: DatabaseService,
}

impl TursoStagingStore {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    fn row_to_run(row: &Row) -> Result<ImportRun, DatabaseError> {
        let id: String = row
            .get(0)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get id: {}", e)))?;
        let status: String = row
            .get(1)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get status: {}", e)))?;
        let import_dir: String = row.get(2).map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to get import_dir: {}", e))
        })?;
        Ok(ImportRun {
            id,
            status: RunStatus::parse(&status).ok_or_else(|| {
                DatabaseError::sql_execution(format!("Unknown run status '{}'", status))
            })?,
            import_dir,
        })
    }

    fn row_to_note(row: &Row) -> Result<StagedNote, DatabaseError> {
        let get_text = |idx: i32, name: &str| -> Result<String, DatabaseError> {
            row.get(idx).map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to get {}: {}", name, e))
            })
        };
        let importer_id = get_text(0, "importer_id")?;
        let source_path = get_text(1, "source_path")?;
        let source_id: Option<String> = row.get(2).map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to get source_id: {}", e))
        })?;
        let journal = get_text(3, "journal")?;
        let content = get_text(4, "content")?;
        let front_matter = get_text(5, "front_matter")?;
        let quill_id = get_text(6, "quill_id")?;
        let quill_path = get_text(7, "quill_path")?;
        let status = get_text(8, "status")?;
        let error: Option<String> = row
            .get(9)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get error: {}", e)))?;

        Ok(StagedNote {
            importer_id,
            source_path,
            source_id,
            journal,
            content,
            front_matter,
            quill_id,
            quill_path,
            status: NoteStatus::parse(&status).ok_or_else(|| {
                DatabaseError::sql_execution(format!("Unknown note status '{}'", status))
            })?,
            error,
        })
    }

    fn row_to_file(row: &Row) -> Result<StagedFile, DatabaseError> {
        let get_text = |idx: i32, name: &str| -> Result<String, DatabaseError> {
            row.get(idx).map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to get {}: {}", name, e))
            })
        };
        let quill_id = get_text(0, "quill_id")?;
        let importer_id = get_text(1, "importer_id")?;
        let source_path_resolved = get_text(2, "source_path_resolved")?;
        let filename = get_text(3, "filename")?;
        let extension = get_text(4, "extension")?;
        let status = get_text(5, "status")?;
        let error: Option<String> = row
            .get(6)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get error: {}", e)))?;

        Ok(StagedFile {
            quill_id,
            importer_id,
            source_path_resolved,
            filename,
            extension,
            status: FileStatus::parse(&status).ok_or_else(|| {
                DatabaseError::sql_execution(format!("Unknown file status '{}'", status))
            })?,
            error,
        })
    }
}

const NOTE_COLUMNS: &str = "importer_id, source_path, source_id, journal, content, \
     front_matter, quill_id, quill_path, status, error";

const FILE_COLUMNS: &str =
    "quill_id, importer_id, source_path_resolved, filename, extension, status, error";

#[async_trait]
impl StagingStore for TursoStagingStore {
    async fn insert_run(&self, run: &ImportRun) -> Result<(), DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO imports (id, status, import_dir) VALUES (?, ?, ?)",
            (
                run.id.as_str(),
                run.status.as_str(),
                run.import_dir.as_str(),
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert run: {}", e)))?;
        Ok(())
    }

    async fn latest_pending_run(&self) -> Result<Option<ImportRun>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, status, import_dir FROM imports
                 WHERE status = 'pending' ORDER BY id DESC LIMIT 1",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare run query: {}", e))
            })?;
        let mut rows = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to query pending run: {}", e))
        })?;
        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::row_to_run(&row)?)),
            None => Ok(None),
        }
    }

    async fn complete_run(&self, id: &str) -> Result<(), DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "UPDATE imports SET status = 'complete' WHERE id = ?",
            [id],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to complete run: {}", e)))?;
        Ok(())
    }

    async fn insert_note(&self, note: &StagedNote) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let affected = conn
            .execute(
                "INSERT OR IGNORE INTO import_notes (importer_id, source_path, source_id, \
                 journal, content, front_matter, quill_id, quill_path, status, error)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    note.importer_id.as_str(),
                    note.source_path.as_str(),
                    note.source_id.as_deref(),
                    note.journal.as_str(),
                    note.content.as_str(),
                    note.front_matter.as_str(),
                    note.quill_id.as_str(),
                    note.quill_path.as_str(),
                    note.status.as_str(),
                    note.error.as_deref(),
                ),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert note: {}", e)))?;
        Ok(affected > 0)
    }

    async fn notes_for_importer(
        &self,
        importer_id: &str,
    ) -> Result<Vec<StagedNote>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM import_notes WHERE importer_id = ? ORDER BY source_path",
                NOTE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare note query: {}", e))
            })?;
        let mut rows = stmt
            .query([importer_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query notes: {}", e)))?;
        let mut notes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            notes.push(Self::row_to_note(&row)?);
        }
        Ok(notes)
    }

    async fn set_note_status(
        &self,
        importer_id: &str,
        source_path: &str,
        status: NoteStatus,
        error: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "UPDATE import_notes SET status = ?, error = ?
             WHERE importer_id = ? AND source_path = ?",
            (status.as_str(), error, importer_id, source_path),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to update note status: {}", e))
        })?;
        Ok(())
    }

    async fn count_note_errors(&self, importer_id: &str) -> Result<u64, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(
                "SELECT COUNT(*) FROM import_notes
                 WHERE importer_id = ? AND status IN ('staging_error', 'processing_error')",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare count query: {}", e))
            })?;
        let mut rows = stmt
            .query([importer_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to count errors: {}", e)))?;
        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
            .ok_or_else(|| DatabaseError::sql_execution("COUNT returned no rows".to_string()))?;
        let count: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get count: {}", e)))?;
        Ok(count.max(0) as u64)
    }

    async fn insert_file(&self, file: &StagedFile) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let affected = conn
            .execute(
                "INSERT OR IGNORE INTO import_files (quill_id, importer_id, \
                 source_path_resolved, filename, extension, status, error)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                (
                    file.quill_id.as_str(),
                    file.importer_id.as_str(),
                    file.source_path_resolved.as_str(),
                    file.filename.as_str(),
                    file.extension.as_str(),
                    file.status.as_str(),
                    file.error.as_deref(),
                ),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert file: {}", e)))?;
        Ok(affected > 0)
    }

    async fn files_for_importer(
        &self,
        importer_id: &str,
    ) -> Result<Vec<StagedFile>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM import_files WHERE importer_id = ?",
                FILE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare file query: {}", e))
            })?;
        let mut rows = stmt
            .query([importer_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query files: {}", e)))?;
        let mut files = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            files.push(Self::row_to_file(&row)?);
        }
        Ok(files)
    }

    async fn find_file_by_path(
        &self,
        resolved: &str,
    ) -> Result<Option<StagedFile>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM import_files WHERE source_path_resolved = ? LIMIT 1",
                FILE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare file query: {}", e))
            })?;
        let mut rows = stmt
            .query([resolved])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query file: {}", e)))?;
        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::row_to_file(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_file_by_name(
        &self,
        filename: &str,
    ) -> Result<Option<StagedFile>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM import_files WHERE filename = ? LIMIT 1",
                FILE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare file query: {}", e))
            })?;
        let mut rows = stmt
            .query([filename])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query file: {}", e)))?;
        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::row_to_file(&row)?)),
            None => Ok(None),
        }
    }

    async fn mark_file_referenced(&self, quill_id: &str) -> Result<(), DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "UPDATE import_files SET status = 'referenced'
             WHERE quill_id = ? AND status = 'pending'",
            [quill_id],
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to mark file referenced: {}", e))
        })?;
        Ok(())
    }

    async fn files_by_status(
        &self,
        importer_id: &str,
        status: FileStatus,
    ) -> Result<Vec<StagedFile>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM import_files WHERE importer_id = ? AND status = ?",
                FILE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare file query: {}", e))
            })?;
        let mut rows = stmt
            .query((importer_id, status.as_str()))
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query files: {}", e)))?;
        let mut files = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            files.push(Self::row_to_file(&row)?);
        }
        Ok(files)
    }

    async fn set_file_status(
        &self,
        quill_id: &str,
        status: FileStatus,
        error: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "UPDATE import_files SET status = ?, error = ? WHERE quill_id = ?",
            (status.as_str(), error, quill_id),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to update file status: {}", e))
        })?;
        Ok(())
    }

    async fn mark_pending_files_orphaned(&self, importer_id: &str) -> Result<u64, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let affected = conn
            .execute(
                "UPDATE import_files SET status = 'orphaned'
                 WHERE importer_id = ? AND status = 'pending'",
                [importer_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to mark orphans: {}", e))
            })?;
        Ok(affected)
    }

    async fn clear_incomplete(&self) -> Result<(), DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "DELETE FROM import_notes WHERE status != 'note_created'",
            (),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to clear notes: {}", e)))?;
        conn.execute(
            "DELETE FROM import_files WHERE status != 'complete'",
            (),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to clear files: {}", e)))?;
        conn.execute("DELETE FROM imports WHERE status != 'complete'", ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to clear runs: {}", e)))?;
        Ok(())
    }
}
