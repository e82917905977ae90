//! Document Shapes
//!
//! The `Document` struct is the unit committed to the external document
//! store; `FrontMatter` is its typed metadata header. Source-specific keys
//! that Quill does not interpret (e.g. Notion's `Created By`) are preserved
//! in `extra` so imports are not lossy.

use serde::{Deserialize, Serialize};

/// Typed front matter for a document.
///
/// Serializes to the JSON object stored in the `front_matter` column of
/// staged notes, and to the metadata handed to the document store. `tags`
/// is always present (possibly empty); unknown keys round-trip via `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,

    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,

    /// Source-specific keys carried through unmodified.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FrontMatter {
    /// Append tags, skipping duplicates while preserving insertion order.
    pub fn merge_tags<I: IntoIterator<Item = String>>(&mut self, tags: I) {
        for tag in tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }
}

/// A document as committed to the external document store.
///
/// `id` is the pre-allocated time-ordered identifier assigned during
/// staging; `content` is Markdown with all links already rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub journal: String,
    pub content: String,
    pub front_matter: FrontMatter,
}

/// A directed link between two documents, derived from a resolved
/// note-to-note link during import processing. Never staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub document_id: String,
    pub target_id: String,
}
