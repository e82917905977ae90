//! Staging Records
//!
//! Durable rows written during the first (staging) pass of an import. Every
//! partial result lives in a status column rather than in memory, so a batch
//! can always be re-run: re-invoking the pipeline only touches rows still
//! `pending`.

use serde::{Deserialize, Serialize};

/// Directory under the notes root where imported attachments land.
pub const ATTACHMENTS_DIR: &str = "_attachments";

/// Lifecycle of a staged note.
///
/// Transitions are monotonic: `Pending` moves to `NoteCreated` or
/// `ProcessingError` during the processing pass; `StagingError` rows are
/// terminal until an explicit clear-incomplete sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    Pending,
    StagingError,
    NoteCreated,
    ProcessingError,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Pending => "pending",
            NoteStatus::StagingError => "staging_error",
            NoteStatus::NoteCreated => "note_created",
            NoteStatus::ProcessingError => "processing_error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(NoteStatus::Pending),
            "staging_error" => Some(NoteStatus::StagingError),
            "note_created" => Some(NoteStatus::NoteCreated),
            "processing_error" => Some(NoteStatus::ProcessingError),
            _ => None,
        }
    }

    /// True for rows that should count against batch completion.
    pub fn is_error(&self) -> bool {
        matches!(self, NoteStatus::StagingError | NoteStatus::ProcessingError)
    }
}

/// Lifecycle of a staged attachment file.
///
/// `Pending` rows become `Referenced` when some note's rewritten link points
/// at them, `Complete` once physically copied, and `Orphaned` at batch end if
/// no note ever referenced them. Orphans are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Referenced,
    Complete,
    Orphaned,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Referenced => "referenced",
            FileStatus::Complete => "complete",
            FileStatus::Orphaned => "orphaned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FileStatus::Pending),
            "referenced" => Some(FileStatus::Referenced),
            "complete" => Some(FileStatus::Complete),
            "orphaned" => Some(FileStatus::Orphaned),
            _ => None,
        }
    }
}

/// Status of an import run as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Complete,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RunStatus::Pending),
            "complete" => Some(RunStatus::Complete),
            _ => None,
        }
    }
}

/// One invocation of the import pipeline.
///
/// Staging and processing always operate against the single most recent
/// `pending` run; a run only flips to `complete` when no row in the batch
/// carries an error status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRun {
    pub id: String,
    pub status: RunStatus,
    pub import_dir: String,
}

/// A note recorded during the staging pass.
///
/// Keyed by `(importer_id, source_path)`; staging the same file again is a
/// primary-key conflict and is skipped, which makes staging idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedNote {
    pub importer_id: String,

    /// Absolute path of the source file.
    pub source_path: String,

    /// External identifier stripped from the source filename, if any.
    pub source_id: Option<String>,

    /// Inferred journal (folder/category) name.
    pub journal: String,

    /// Raw note body with front matter stripped.
    pub content: String,

    /// Serialized front matter map; always contains at least `tags`.
    pub front_matter: String,

    /// Pre-allocated time-ordered identifier the note will have in Quill.
    pub quill_id: String,

    /// Future path of the note relative to the notes root:
    /// `<journal>/<quill_id>.md`.
    pub quill_path: String,

    pub status: NoteStatus,
    pub error: Option<String>,
}

/// An attachment recorded during the staging pass.
///
/// Keyed by `quill_id`; uniqueness of `source_path_resolved` makes repeat
/// staging of the same file a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedFile {
    pub quill_id: String,
    pub importer_id: String,

    /// Absolute, normalized path of the source file.
    pub source_path_resolved: String,

    /// Base name without extension, for wikilink-embed resolution.
    pub filename: String,

    /// Extension including the leading dot, or empty.
    pub extension: String,

    pub status: FileStatus,
    pub error: Option<String>,
}

impl StagedFile {
    /// Relative URL the file will have once moved under the notes root,
    /// as written into rewritten note bodies.
    pub fn destination_url(&self) -> String {
        format!("../{}/{}{}", ATTACHMENTS_DIR, self.quill_id, self.extension)
    }
}
