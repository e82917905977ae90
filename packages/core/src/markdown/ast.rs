//! Editable Document Tree
//!
//! The closed, tagged-variant node type consumed by the editor and produced
//! by the Markdown decoder. Inline formatting is stored as flat per-leaf
//! mark flags; nesting of emphasis markers is reconstructed at encode time.
//!
//! Invariants:
//!
//! - every leaf is a `Text` node
//! - every non-void element owns at least one child (`Text("")` when empty)
//! - a tree is exclusively owned by the conversion call that created it

use serde::{Deserialize, Serialize};

/// A single inline formatting flag.
///
/// `ALL` is ordered; the encoder opens markers in this order when several
/// marks begin on the same leaf, which keeps inline code innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Italic,
    Bold,
    Strikethrough,
    Code,
}

impl Mark {
    pub const ALL: [Mark; 4] = [Mark::Italic, Mark::Bold, Mark::Strikethrough, Mark::Code];
}

/// The set of marks active on a text leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSet {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
}

impl MarkSet {
    pub const EMPTY: MarkSet = MarkSet {
        italic: false,
        bold: false,
        strikethrough: false,
        code: false,
    };

    pub fn contains(&self, mark: Mark) -> bool {
        match mark {
            Mark::Italic => self.italic,
            Mark::Bold => self.bold,
            Mark::Strikethrough => self.strikethrough,
            Mark::Code => self.code,
        }
    }

    pub fn with(mut self, mark: Mark) -> MarkSet {
        match mark {
            Mark::Italic => self.italic = true,
            Mark::Bold => self.bold = true,
            Mark::Strikethrough => self.strikethrough = true,
            Mark::Code => self.code = true,
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == MarkSet::EMPTY
    }
}

/// A node of the editable document tree.
///
/// Matching is exhaustive everywhere the tree is consumed; adding a variant
/// without teaching the encoder about it is a compile error, not a silent
/// drop at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Text {
        value: String,
        #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
        marks: MarkSet,
    },
    Paragraph {
        children: Vec<Node>,
    },
    Heading {
        depth: u8,
        children: Vec<Node>,
    },
    Blockquote {
        children: Vec<Node>,
    },
    List {
        ordered: bool,
        start: Option<u64>,
        spread: bool,
        children: Vec<Node>,
    },
    ListItem {
        checked: Option<bool>,
        children: Vec<Node>,
    },
    Table {
        children: Vec<Node>,
    },
    TableRow {
        children: Vec<Node>,
    },
    TableCell {
        children: Vec<Node>,
    },
    CodeBlock {
        lang: Option<String>,
        meta: Option<String>,
        value: String,
    },
    Image {
        url: String,
        title: Option<String>,
        alt: Option<String>,
    },
    Video {
        url: String,
        title: Option<String>,
        alt: Option<String>,
    },
    /// A run of consecutive stand-alone images, grouped for the editor.
    /// Flattened back into one paragraph-wrapped image each on encode.
    ImageGallery {
        children: Vec<Node>,
    },
    Link {
        url: String,
        title: Option<String>,
        children: Vec<Node>,
    },
    /// A link to another Quill note by stable identifier.
    NoteLink {
        target_id: String,
        target_journal: String,
        title: String,
    },
    FootnoteReference {
        identifier: String,
    },
    FootnoteDefinition {
        identifier: String,
        children: Vec<Node>,
    },
    Math {
        value: String,
    },
    InlineMath {
        value: String,
    },
    Html {
        value: String,
    },
    ThematicBreak,
    Break,
    /// Inline `#tag` marker. Produced by the import decoder; the processor
    /// lifts the value into front matter and flattens the node to text.
    Tag {
        value: String,
    },
    /// `[[Wikilink]]` / `![[embed]]` reference. Produced by the import
    /// decoder; resolved or flattened to text before encoding.
    Wikilink {
        target: String,
        hash: Option<String>,
        alias: String,
        embed: bool,
    },
}

impl Node {
    pub fn text(value: impl Into<String>) -> Node {
        Node::Text {
            value: value.into(),
            marks: MarkSet::EMPTY,
        }
    }

    pub fn marked_text(value: impl Into<String>, marks: MarkSet) -> Node {
        Node::Text {
            value: value.into(),
            marks,
        }
    }

    pub fn paragraph(children: Vec<Node>) -> Node {
        Node::Paragraph {
            children: non_empty(children),
        }
    }

    /// Child list of this node, if it is a parent type.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Table { children }
            | Node::TableRow { children }
            | Node::TableCell { children }
            | Node::ImageGallery { children }
            | Node::Link { children, .. }
            | Node::FootnoteDefinition { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Table { children }
            | Node::TableRow { children }
            | Node::TableCell { children }
            | Node::ImageGallery { children }
            | Node::Link { children, .. }
            | Node::FootnoteDefinition { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Concatenated text content of this subtree, markers stripped.
    pub fn plain_text(&self) -> String {
        match self {
            Node::Text { value, .. } => value.clone(),
            Node::CodeBlock { value, .. }
            | Node::Math { value }
            | Node::InlineMath { value }
            | Node::Html { value }
            | Node::Tag { value } => value.clone(),
            Node::NoteLink { title, .. } => title.clone(),
            Node::Wikilink { alias, .. } => alias.clone(),
            Node::Image { alt, .. } | Node::Video { alt, .. } => {
                alt.clone().unwrap_or_default()
            }
            other => other
                .children()
                .map(|children| children.iter().map(Node::plain_text).collect())
                .unwrap_or_default(),
        }
    }
}

/// Concatenated text of a node sequence.
pub fn plain_text(nodes: &[Node]) -> String {
    nodes.iter().map(Node::plain_text).collect()
}

/// Enforce the non-empty-children invariant for element nodes.
pub(crate) fn non_empty(children: Vec<Node>) -> Vec<Node> {
    if children.is_empty() {
        vec![Node::text("")]
    } else {
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_elements_default_to_empty_text_child() {
        let para = Node::paragraph(vec![]);
        assert_eq!(para.children().unwrap(), &[Node::text("")]);
    }

    #[test]
    fn plain_text_concatenates_leaves() {
        let para = Node::paragraph(vec![
            Node::text("a "),
            Node::marked_text("b", MarkSet::EMPTY.with(Mark::Bold)),
            Node::Link {
                url: "x".to_string(),
                title: None,
                children: vec![Node::text(" c")],
            },
        ]);
        assert_eq!(para.plain_text(), "a b c");
    }

    #[test]
    fn mark_set_with_is_additive() {
        let marks = MarkSet::EMPTY.with(Mark::Bold).with(Mark::Italic);
        assert!(marks.contains(Mark::Bold));
        assert!(marks.contains(Mark::Italic));
        assert!(!marks.contains(Mark::Code));
        assert!(!marks.is_empty());
    }
}
