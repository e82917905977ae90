//! Time-Ordered Identifiers
//!
//! Quill identifiers are UUIDv7 so lexicographic order approximates creation
//! order. Notes use the hyphenated form (visible in storage paths and
//! note-to-note links); attachments use the compact hex form for shorter
//! content-addressed filenames.

use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

/// Matches a hyphenated UUIDv7, for recognizing note ids inside link URLs.
static NOTE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[0-9a-f]{8}-[0-9a-f]{4}-7[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$",
    )
    .expect("note id regex")
});

/// New identifier for a note (hyphenated UUIDv7).
pub fn note_id() -> String {
    Uuid::now_v7().to_string()
}

/// New identifier for an attachment (compact hex UUIDv7).
pub fn attachment_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Whether `s` looks like a note identifier.
pub fn is_note_id(s: &str) -> bool {
    NOTE_ID_RE.is_match(&s.to_ascii_lowercase())
}
