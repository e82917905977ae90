//! Database Layer
//!
//! libsql persistence for the owned staging tables (`imports`,
//! `import_notes`, `import_files`). The final document store is not here;
//! it is an external collaborator consumed through
//! [`crate::services::DocumentStore`].

mod database;
mod error;
mod staging_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use staging_store::{StagingStore, TursoStagingStore};
