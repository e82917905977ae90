//! Quill Core Business Logic Layer
//!
//! This crate provides the document interchange codec and the staged import
//! pipeline for the Quill journaling application.
//!
//! # Architecture
//!
//! - **Editable tree codec**: Markdown text is decoded into a closed,
//!   tagged-variant document tree and re-encoded with correctly nested
//!   inline decorations
//! - **Staged imports**: external note exports are staged into durable
//!   libsql tables first, then processed and committed in an independent
//!   second pass, so partial failures never lose state
//! - **Injected stores**: the final document store and the filesystem are
//!   consumed through traits; only the staging tables are owned here
//!
//! # Modules
//!
//! - [`models`] - Data structures (Document, StagedNote, StagedFile, ...)
//! - [`markdown`] - Markdown decode/encode and tree transforms
//! - [`services`] - Import pipeline (staging, link resolution, processing)
//! - [`db`] - Staging table persistence with libsql
//! - [`utils`] - Identifier generation helpers

pub mod db;
pub mod markdown;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use models::*;
pub use services::*;
