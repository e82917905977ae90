//! Import Pipeline Orchestration
//!
//! Two independent passes over a durable staging area. The staging pass
//! walks the source directory and records every note and attachment into
//! the staging tables without touching the final store. The processing
//! pass decodes each staged note, resolves its links against the whole
//! batch, commits it to the document store, and finally moves referenced
//! attachment files.
//!
//! Nothing here keeps partial state in memory: a note or file that fails
//! is recorded in its row's status column and the batch continues, so
//! re-invoking the pipeline retries exactly the rows still pending.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::db::StagingStore;
use crate::markdown::{collect_tags, decode_import, encode, flatten_wikilinks};
use crate::models::{Document, FrontMatter, ImportRun, NoteStatus, RunStatus, StagedFile, StagedNote};
use crate::services::documents::DocumentStore;
use crate::services::error::ImporterError;
use crate::services::files::{FileStore, WalkEntry};
use crate::services::frontmatter::{iso_string, parse_title_and_front_matter, SourceType};
use crate::services::journals::{infer_or_generate_journal_name, strip_export_id};
use crate::services::links::LinkResolver;
use crate::services::mover::FileMover;
use crate::models::ATTACHMENTS_DIR;
use crate::utils::{attachment_id, note_id};

/// Directory traversal depth bound for the staging walk.
const MAX_WALK_DEPTH: usize = 16;

/// Counts reported by an import invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub importer_id: String,
    pub notes_created: u64,
    pub notes_failed: u64,
    pub files_moved: u64,
    pub files_orphaned: u64,
}

/// Imports a directory of external notes into Quill.
pub struct ImporterService {
    staging: Arc<dyn StagingStore>,
    documents: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,

    /// Notes root directory; imported documents and attachments land here.
    root_dir: PathBuf,

    /// File names skipped during the staging walk.
    skip_files: HashSet<String>,
}

impl ImporterService {
    pub fn new(
        staging: Arc<dyn StagingStore>,
        documents: Arc<dyn DocumentStore>,
        files: Arc<dyn FileStore>,
        root_dir: PathBuf,
    ) -> Self {
        Self {
            staging,
            documents,
            files,
            root_dir,
            skip_files: [".DS_Store".to_string()].into_iter().collect(),
        }
    }

    /// Extend the set of file names skipped during staging.
    pub fn with_skip_files<I: IntoIterator<Item = String>>(mut self, names: I) -> Self {
        self.skip_files.extend(names);
        self
    }

    /// Run a full import: stage every file under `import_dir`, then
    /// process the staged batch.
    pub async fn import(
        &self,
        import_dir: &Path,
        source: SourceType,
    ) -> Result<ImportSummary, ImporterError> {
        let root = self.ensure_root()?;

        let import_dir = import_dir.canonicalize().map_err(|err| {
            ImporterError::configuration(format!(
                "Cannot access import directory {}: {}",
                import_dir.display(),
                err
            ))
        })?;
        if !import_dir.is_dir() {
            return Err(ImporterError::configuration(format!(
                "Import path {} is not a directory",
                import_dir.display()
            )));
        }
        if import_dir.starts_with(&root) {
            return Err(ImporterError::configuration(
                "Import directory must not reside within the notes root directory".to_string(),
            ));
        }

        // re-invoking on a directory whose run is still pending resumes
        // that run: staged rows conflict-skip and only pending rows process
        let import_dir_str = import_dir.to_string_lossy().to_string();
        let importer_id = match self.staging.latest_pending_run().await? {
            Some(run) if run.import_dir == import_dir_str => {
                tracing::info!("Resuming pending import {}", run.id);
                run.id
            }
            _ => {
                let importer_id = note_id();
                self.staging
                    .insert_run(&ImportRun {
                        id: importer_id.clone(),
                        status: RunStatus::Pending,
                        import_dir: import_dir_str,
                    })
                    .await?;
                importer_id
            }
        };

        tracing::info!("Importing directory {}", import_dir.display());
        self.stage_directory(&import_dir, &importer_id, source)
            .await?;
        self.process_pending().await
    }

    /// Process the most recent pending run: rewrite and commit every
    /// staged note still pending, then move referenced attachments. The
    /// run flips to complete only when no row carries an error status.
    pub async fn process_pending(&self) -> Result<ImportSummary, ImporterError> {
        let root = self.ensure_root()?;
        let Some(run) = self.staging.latest_pending_run().await? else {
            tracing::info!("No pending imports");
            return Ok(ImportSummary::default());
        };
        tracing::info!("Processing import {} from {}", run.id, run.import_dir);

        let import_dir = PathBuf::from(&run.import_dir);
        let notes = self.staging.notes_for_importer(&run.id).await?;
        let resolver = LinkResolver::build(self.staging.as_ref(), &run.id, &notes).await?;

        let mut summary = ImportSummary {
            importer_id: run.id.clone(),
            ..Default::default()
        };

        for note in &notes {
            if note.status != NoteStatus::Pending {
                continue;
            }
            match self.process_note(note, &resolver).await {
                Ok(()) => {
                    self.staging
                        .set_note_status(
                            &note.importer_id,
                            &note.source_path,
                            NoteStatus::NoteCreated,
                            None,
                        )
                        .await?;
                    summary.notes_created += 1;
                }
                // a single bad note never aborts the batch
                Err(message) => {
                    tracing::error!("Error processing note {}: {}", note.source_path, message);
                    self.staging
                        .set_note_status(
                            &note.importer_id,
                            &note.source_path,
                            NoteStatus::ProcessingError,
                            Some(&message),
                        )
                        .await?;
                    summary.notes_failed += 1;
                }
            }
        }

        let mover = FileMover::new(self.staging.as_ref(), self.files.as_ref());
        let moved = mover.move_referenced(&root, &run.id, &import_dir).await?;
        summary.files_moved = moved.moved;
        summary.files_orphaned = moved.orphaned;

        let errors = self.staging.count_note_errors(&run.id).await?;
        if errors == 0 {
            self.staging.complete_run(&run.id).await?;
            tracing::info!("Import {} complete", run.id);
        } else {
            tracing::info!(
                "Import {} finished with {} errored notes; run stays pending for retry",
                run.id,
                errors
            );
        }
        Ok(summary)
    }

    /// Purge every staging row that did not complete, so a clean
    /// re-import can be attempted.
    pub async fn clear_incomplete(&self) -> Result<(), ImporterError> {
        self.staging.clear_incomplete().await?;
        Ok(())
    }

    fn ensure_root(&self) -> Result<PathBuf, ImporterError> {
        let root = self.root_dir.canonicalize().map_err(|err| {
            ImporterError::configuration(format!(
                "Notes root directory {} is not accessible: {}",
                self.root_dir.display(),
                err
            ))
        })?;
        if !root.is_dir() {
            return Err(ImporterError::configuration(format!(
                "Notes root {} is not a directory",
                root.display()
            )));
        }
        Ok(root)
    }

    async fn stage_directory(
        &self,
        import_dir: &Path,
        importer_id: &str,
        source: SourceType,
    ) -> Result<(), ImporterError> {
        let descend = |path: &Path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            // hidden and underscore-prefixed directories are skipped, but
            // an _attachments directory always gets walked
            name == ATTACHMENTS_DIR || !(name.starts_with('.') || name.starts_with('_'))
        };
        let entries = self
            .files
            .walk(import_dir, MAX_WALK_DEPTH, &descend)
            .map_err(ImporterError::file_store)?;

        // maps each source folder to its journal so notes in one folder
        // stay together
        let mut journal_cache: HashMap<String, String> = HashMap::new();

        for entry in entries {
            let name = entry
                .path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            if name.starts_with('.') || self.skip_files.contains(&name) {
                continue;
            }
            if entry.path.extension().and_then(|ext| ext.to_str()) == Some("md") {
                self.stage_note(&entry, import_dir, importer_id, source, &mut journal_cache)
                    .await?;
            } else {
                self.stage_file(&entry, importer_id).await?;
            }
        }
        Ok(())
    }

    async fn stage_note(
        &self,
        entry: &WalkEntry,
        import_dir: &Path,
        importer_id: &str,
        source: SourceType,
        journal_cache: &mut HashMap<String, String>,
    ) -> Result<(), ImporterError> {
        let source_path = entry.path.to_string_lossy().to_string();
        let stem = entry
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let (fallback_title, source_id) = strip_export_id(&stem);

        let staged = match self
            .build_staged_note(entry, import_dir, importer_id, source, journal_cache, &fallback_title)
            .await
        {
            Ok(mut note) => {
                note.source_id = source_id;
                note
            }
            Err((message, content)) => {
                // capture the failure durably so the run can be diagnosed
                // and retried; the original content is preserved
                tracing::error!("Error staging note {}: {}", source_path, message);
                StagedNote {
                    importer_id: importer_id.to_string(),
                    source_path: source_path.clone(),
                    source_id,
                    journal: String::new(),
                    content,
                    front_matter: "{}".to_string(),
                    quill_id: note_id(),
                    quill_path: String::new(),
                    status: NoteStatus::StagingError,
                    error: Some(message),
                }
            }
        };

        let inserted = self.staging.insert_note(&staged).await?;
        if !inserted {
            tracing::debug!("Note already staged, skipping: {}", source_path);
        }
        Ok(())
    }

    /// Build a pending staged note; errors carry the message plus whatever
    /// content was read so the error row preserves it.
    async fn build_staged_note(
        &self,
        entry: &WalkEntry,
        import_dir: &Path,
        importer_id: &str,
        source: SourceType,
        journal_cache: &mut HashMap<String, String>,
        fallback_title: &str,
    ) -> Result<StagedNote, (String, String)> {
        let contents = self
            .files
            .read_to_string(&entry.path)
            .await
            .map_err(|err| (format!("Failed to read note: {}", err), String::new()))?;

        let parsed = parse_title_and_front_matter(&contents, fallback_title, source);

        let category = parsed
            .front_matter
            .extra
            .get("Category")
            .and_then(|value| value.as_str())
            .map(str::to_string);
        let journal = infer_or_generate_journal_name(
            entry.path.parent().unwrap_or(import_dir),
            import_dir,
            journal_cache,
            category.as_deref(),
        );

        let mut front_matter = parsed.front_matter;
        if front_matter.created_at.is_none() {
            front_matter.created_at = entry.created.map(iso_string);
        }
        if front_matter.updated_at.is_none() {
            front_matter.updated_at = entry.modified.map(iso_string);
        }

        let front_matter = serde_json::to_string(&front_matter)
            .map_err(|err| (format!("Failed to serialize front matter: {}", err), contents.clone()))?;

        let quill_id = note_id();
        Ok(StagedNote {
            importer_id: importer_id.to_string(),
            source_path: entry.path.to_string_lossy().to_string(),
            source_id: None,
            journal: journal.clone(),
            content: parsed.body,
            front_matter,
            quill_id: quill_id.clone(),
            quill_path: format!("{}/{}.md", journal, quill_id),
            status: NoteStatus::Pending,
            error: None,
        })
    }

    async fn stage_file(&self, entry: &WalkEntry, importer_id: &str) -> Result<(), ImporterError> {
        let extension = entry
            .path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let filename = entry
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        let file = StagedFile {
            quill_id: attachment_id(),
            importer_id: importer_id.to_string(),
            source_path_resolved: entry.path.to_string_lossy().to_string(),
            filename,
            extension,
            status: crate::models::FileStatus::Pending,
            error: None,
        };
        let inserted = self.staging.insert_file(&file).await?;
        if !inserted {
            tracing::debug!("File already staged, skipping: {}", file.source_path_resolved);
        }
        Ok(())
    }

    /// Decode, resolve, re-encode and commit one staged note. The error
    /// string is recorded on the row by the caller.
    async fn process_note(
        &self,
        note: &StagedNote,
        resolver: &LinkResolver,
    ) -> Result<(), String> {
        let tree = decode_import(&note.content);
        let note_dir = Path::new(&note.source_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let outcome = resolver.rewrite(&note_dir, tree);

        // reference marks must land before the file mover runs
        for quill_id in &outcome.referenced_files {
            self.staging
                .mark_file_referenced(quill_id)
                .await
                .map_err(|err| err.to_string())?;
        }

        let (tree, tags) = collect_tags(outcome.tree);
        let tree = flatten_wikilinks(tree);
        let content = encode(&tree);

        let mut front_matter: FrontMatter = serde_json::from_str(&note.front_matter)
            .map_err(|err| format!("Invalid staged front matter: {}", err))?;
        front_matter.merge_tags(tags);

        self.documents
            .create_document(Document {
                id: note.quill_id.clone(),
                journal: note.journal.clone(),
                content,
                front_matter,
            })
            .await
            .map_err(|err| err.to_string())?;

        let mut targets = outcome.note_targets;
        targets.sort();
        targets.dedup();
        if !targets.is_empty() {
            self.documents
                .set_document_links(&note.quill_id, &targets)
                .await
                .map_err(|err| err.to_string())?;
        }
        Ok(())
    }
}
