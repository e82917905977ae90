//! Import Pipeline Services
//!
//! Staging, link resolution, processing and file moving for directory
//! imports, plus the external store interfaces they consume.

pub mod documents;
pub mod error;
pub mod files;
pub mod frontmatter;
pub mod importer;
pub mod journals;
pub mod links;
pub mod mover;

pub use documents::{DocumentStore, InMemoryDocumentStore};
pub use error::ImporterError;
pub use files::{FileStore, FsFileStore, WalkEntry};
pub use frontmatter::{parse_title_and_front_matter, ParsedNote, SourceType};
pub use importer::{ImportSummary, ImporterService};
pub use journals::{
    infer_or_generate_journal_name, strip_export_id, validate_journal_name,
    MAX_JOURNAL_NAME_LENGTH,
};
pub use links::{LinkResolver, NoteTarget, RewriteOutcome};
pub use mover::{FileMover, MoveSummary};
