//! Link Resolution
//!
//! Before any note body is rewritten, two mappings are built over the whole
//! batch: source path → future note identity, and title → future note
//! identity, plus the equivalent mappings for staged attachment files. Each
//! note's tree is then rewritten as a pure transform: resolved links point
//! at stable identifiers, attachment references collect into a
//! `referenced` set (marked in the staging store by the caller), and
//! anything unresolvable is left untouched — not every link target exists
//! in a batch, and that is expected.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use crate::db::{DatabaseError, StagingStore};
use crate::markdown::{plain_text, Node};
use crate::models::{FrontMatter, StagedNote, ATTACHMENTS_DIR};

/// Future identity of a staged note.
#[derive(Debug, Clone)]
pub struct NoteTarget {
    pub journal: String,
    pub quill_id: String,
}

/// Future identity of a staged attachment.
#[derive(Debug, Clone)]
struct FileTarget {
    quill_id: String,
    extension: String,
}

/// Result of rewriting one note's tree.
#[derive(Debug, Default)]
pub struct RewriteOutcome {
    pub tree: Vec<Node>,
    /// quill ids of notes this note now links to (for document links).
    pub note_targets: Vec<String>,
    /// quill ids of staged files this note references.
    pub referenced_files: Vec<String>,
}

/// URLs with a scheme, anchors and absolute paths are never import-local
/// file references.
static EXTERNAL_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.-]*:|#|/)").expect("external url regex"));

pub struct LinkResolver {
    notes_by_path: HashMap<String, NoteTarget>,
    notes_by_title: HashMap<String, NoteTarget>,
    files_by_path: HashMap<String, FileTarget>,
    files_by_name: HashMap<String, FileTarget>,
}

impl LinkResolver {
    /// Build the batch-wide mappings. Notes with error statuses are
    /// excluded; their identities may be stale.
    pub async fn build(
        staging: &dyn StagingStore,
        importer_id: &str,
        notes: &[StagedNote],
    ) -> Result<Self, DatabaseError> {
        let mut notes_by_path = HashMap::new();
        let mut notes_by_title = HashMap::new();
        for note in notes {
            if note.status.is_error() {
                continue;
            }
            let target = NoteTarget {
                journal: note.journal.clone(),
                quill_id: note.quill_id.clone(),
            };
            notes_by_path.insert(note.source_path.clone(), target.clone());

            let title = serde_json::from_str::<FrontMatter>(&note.front_matter)
                .map(|fm| fm.title)
                .unwrap_or_default();
            if !title.is_empty() {
                notes_by_title.insert(title, target);
            }
        }

        let mut files_by_path = HashMap::new();
        let mut files_by_name = HashMap::new();
        for file in staging.files_for_importer(importer_id).await? {
            let target = FileTarget {
                quill_id: file.quill_id.clone(),
                extension: file.extension.clone(),
            };
            files_by_path.insert(file.source_path_resolved.clone(), target.clone());
            files_by_name.insert(file.filename.clone(), target);
        }

        Ok(Self {
            notes_by_path,
            notes_by_title,
            files_by_path,
            files_by_name,
        })
    }

    /// Rewrite a freshly decoded tree. `note_dir` is the directory of the
    /// note's source file, used to resolve relative URLs.
    pub fn rewrite(&self, note_dir: &Path, tree: Vec<Node>) -> RewriteOutcome {
        let mut collected = Collected::default();
        let tree = tree
            .into_iter()
            .map(|node| self.rewrite_node(note_dir, node, &mut collected))
            .collect();
        RewriteOutcome {
            tree,
            note_targets: collected.note_targets,
            referenced_files: collected.referenced_files,
        }
    }

    fn rewrite_node(&self, note_dir: &Path, node: Node, collected: &mut Collected) -> Node {
        match node {
            Node::Link {
                url,
                title,
                children,
            } => {
                let children = self.rewrite_children(note_dir, children, collected);
                if is_note_link(&url) {
                    let resolved = resolve_url(note_dir, &url);
                    if let Some(target) = self.notes_by_path.get(&resolved) {
                        collected.note_targets.push(target.quill_id.clone());
                        return Node::NoteLink {
                            target_id: target.quill_id.clone(),
                            target_journal: target.journal.clone(),
                            title: plain_text(&children),
                        };
                    }
                    return Node::Link {
                        url,
                        title,
                        children,
                    };
                }
                match self.resolve_file(note_dir, &url, collected) {
                    Some(rewritten) => Node::Link {
                        url: rewritten,
                        title,
                        children,
                    },
                    None => Node::Link {
                        url,
                        title,
                        children,
                    },
                }
            }
            Node::Image { url, title, alt } => match self.resolve_file(note_dir, &url, collected)
            {
                Some(rewritten) => Node::Image {
                    url: rewritten,
                    title,
                    alt,
                },
                None => Node::Image { url, title, alt },
            },
            Node::Video { url, title, alt } => match self.resolve_file(note_dir, &url, collected)
            {
                Some(rewritten) => Node::Video {
                    url: rewritten,
                    title,
                    alt,
                },
                None => Node::Video { url, title, alt },
            },
            Node::Wikilink {
                target,
                hash,
                alias,
                embed: true,
            } => {
                // embeds resolve by bare filename against staged files
                if let Some(file) = self.files_by_name.get(&alias) {
                    collected.referenced_files.push(file.quill_id.clone());
                    return Node::Image {
                        url: destination_url(file),
                        title: None,
                        alt: Some(alias),
                    };
                }
                Node::Wikilink {
                    target,
                    hash,
                    alias,
                    embed: true,
                }
            }
            Node::Wikilink {
                target,
                hash,
                alias,
                embed: false,
            } => {
                // note wikilinks resolve by title
                let target_entry = self
                    .notes_by_title
                    .get(&alias)
                    .or_else(|| self.notes_by_title.get(&target));
                if let Some(entry) = target_entry {
                    collected.note_targets.push(entry.quill_id.clone());
                    return Node::NoteLink {
                        target_id: entry.quill_id.clone(),
                        target_journal: entry.journal.clone(),
                        title: alias,
                    };
                }
                Node::Wikilink {
                    target,
                    hash,
                    alias,
                    embed: false,
                }
            }
            note_link @ Node::NoteLink { .. } => {
                if let Node::NoteLink { target_id, .. } = &note_link {
                    collected.note_targets.push(target_id.clone());
                }
                note_link
            }
            mut other => {
                if let Some(children) = other.children_mut() {
                    let rewritten =
                        self.rewrite_children(note_dir, std::mem::take(children), collected);
                    *children = rewritten;
                }
                other
            }
        }
    }

    fn rewrite_children(
        &self,
        note_dir: &Path,
        children: Vec<Node>,
        collected: &mut Collected,
    ) -> Vec<Node> {
        children
            .into_iter()
            .map(|child| self.rewrite_node(note_dir, child, collected))
            .collect()
    }

    /// Resolve a URL against the staged files; marks the file referenced
    /// and returns the rewritten content-addressed URL on success.
    fn resolve_file(
        &self,
        note_dir: &Path,
        url: &str,
        collected: &mut Collected,
    ) -> Option<String> {
        if !is_file_candidate(url) {
            return None;
        }
        let resolved = resolve_url(note_dir, url);
        let file = self.files_by_path.get(&resolved)?;
        collected.referenced_files.push(file.quill_id.clone());
        Some(destination_url(file))
    }
}

/// Accumulators threaded through the rewrite.
#[derive(Default)]
struct Collected {
    note_targets: Vec<String>,
    referenced_files: Vec<String>,
}

fn destination_url(file: &FileTarget) -> String {
    format!("../{}/{}{}", ATTACHMENTS_DIR, file.quill_id, file.extension)
}

/// A markdown link to another note: ends in `.md` and is not an absolute
/// URL with an `.md` domain.
pub fn is_note_link(url: &str) -> bool {
    url.ends_with(".md") && !url.contains("://")
}

fn is_file_candidate(url: &str) -> bool {
    !url.is_empty() && !EXTERNAL_URL_RE.is_match(url)
}

/// Resolve a link URL to the absolute, normalized source path it points
/// at: strip any query string, percent-decode (export links are encoded),
/// join onto the note's directory and fold `.`/`..` components.
pub fn resolve_url(note_dir: &Path, url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or_default();
    let decoded = urlencoding::decode(without_query)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| without_query.to_string());
    normalize_path(&note_dir.join(decoded))
        .to_string_lossy()
        .to_string()
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
