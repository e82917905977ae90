//! Attachment File Mover
//!
//! Runs after every note in the batch has been rewritten, so the
//! `referenced` marks are complete before any copy happens. Each referenced
//! file is verified to still live inside the import directory (malformed
//! links must not become path traversal) and copied to its
//! content-addressed destination. Files nothing referenced are marked
//! orphaned — never deleted — so a human can inspect the run afterward.

use std::path::Path;

use crate::db::StagingStore;
use crate::models::{FileStatus, ATTACHMENTS_DIR};
use crate::services::error::ImporterError;
use crate::services::files::FileStore;

/// Counts reported by a move pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MoveSummary {
    pub moved: u64,
    pub failed: u64,
    pub orphaned: u64,
}

pub struct FileMover<'a> {
    staging: &'a dyn StagingStore,
    files: &'a dyn FileStore,
}

impl<'a> FileMover<'a> {
    pub fn new(staging: &'a dyn StagingStore, files: &'a dyn FileStore) -> Self {
        Self { staging, files }
    }

    /// Copy every `referenced` staged file into `<root>/_attachments/`,
    /// then mark the never-referenced remainder orphaned. Per-file
    /// failures are recorded on the row and the pass continues.
    pub async fn move_referenced(
        &self,
        root: &Path,
        importer_id: &str,
        import_dir: &Path,
    ) -> Result<MoveSummary, ImporterError> {
        let referenced = self
            .staging
            .files_by_status(importer_id, FileStatus::Referenced)
            .await?;

        let attachments_dir = root.join(ATTACHMENTS_DIR);
        self.files
            .ensure_dir(&attachments_dir)
            .await
            .map_err(ImporterError::file_store)?;

        let mut summary = MoveSummary::default();
        for file in referenced {
            let source = Path::new(&file.source_path_resolved);

            if let Err(reason) = self.safe_access(source, import_dir).await {
                tracing::error!(
                    "Cannot move staged file {}: {}",
                    file.source_path_resolved,
                    reason
                );
                self.staging
                    .set_file_status(&file.quill_id, FileStatus::Referenced, Some(&reason))
                    .await?;
                summary.failed += 1;
                continue;
            }

            let destination =
                attachments_dir.join(format!("{}{}", file.quill_id, file.extension));
            match self.files.copy_file(source, &destination).await {
                Ok(()) => {
                    self.staging
                        .set_file_status(&file.quill_id, FileStatus::Complete, None)
                        .await?;
                    summary.moved += 1;
                }
                Err(err) => {
                    tracing::error!("Error moving file {}: {}", file.quill_id, err);
                    self.staging
                        .set_file_status(
                            &file.quill_id,
                            FileStatus::Referenced,
                            Some(&err.to_string()),
                        )
                        .await?;
                    summary.failed += 1;
                }
            }
        }

        summary.orphaned = self
            .staging
            .mark_pending_files_orphaned(importer_id)
            .await?;
        Ok(summary)
    }

    /// Reject sources that escaped the import directory or are unreadable.
    async fn safe_access(&self, source: &Path, import_dir: &Path) -> Result<(), String> {
        if !source.starts_with(import_dir) {
            return Err("Potential path traversal detected".to_string());
        }
        if !self.files.is_readable(source).await {
            return Err("Source file does not exist or is not readable".to_string());
        }
        Ok(())
    }
}
