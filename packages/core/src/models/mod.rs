//! Data Model Layer
//!
//! Durable records owned by the import pipeline (staged notes/files, import
//! runs) and the document shapes exchanged with the external document store.

mod document;
mod staging;

pub use document::{Document, DocumentLink, FrontMatter};
pub use staging::{
    FileStatus, ImportRun, NoteStatus, RunStatus, StagedFile, StagedNote, ATTACHMENTS_DIR,
};
