//! Import Pipeline Error Types
//!
//! Only configuration problems abort a run. Everything else — a note that
//! fails to parse, a link that fails to resolve, a file that fails to copy —
//! is recorded in the durable status column of its staging row and the
//! batch continues.

use crate::db::DatabaseError;
use thiserror::Error;

/// Errors surfaced by the import services.
#[derive(Error, Debug)]
pub enum ImporterError {
    /// Invalid import configuration (missing notes root, import directory
    /// inside the notes root, unreadable import directory). Aborts the
    /// whole run before any staging happens.
    #[error("Invalid import configuration: {0}")]
    Configuration(String),

    /// Staging database operation failed
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    /// External document store operation failed
    #[error("Document store operation failed: {0}")]
    DocumentStore(#[source] anyhow::Error),

    /// File store operation failed
    #[error("File store operation failed: {0}")]
    FileStore(#[source] anyhow::Error),
}

impl ImporterError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a document store error
    pub fn document_store(err: anyhow::Error) -> Self {
        Self::DocumentStore(err)
    }

    /// Create a file store error
    pub fn file_store(err: anyhow::Error) -> Self {
        Self::FileStore(err)
    }
}
