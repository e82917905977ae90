//! Inline Tag Markers
//!
//! Obsidian-style `#tag` markers are not part of CommonMark, so the import
//! decoder splits them out of text leaves after parsing. A candidate must
//! sit at a whitespace boundary and contain at least one non-digit (`#2024`
//! alone is prose, not a tag). Code-marked leaves are never split.

use regex::Regex;
use std::sync::LazyLock;

use super::ast::Node;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_/-]+)").expect("tag regex"));

/// Split `#tag` markers in every text leaf of the tree into `Tag` nodes.
pub(crate) fn split_tags(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .flat_map(|node| match node {
            Node::Text { value, marks } if !marks.code => {
                let pieces = split_text(&value);
                if pieces.is_empty() {
                    vec![Node::marked_text(value, marks)]
                } else {
                    pieces
                        .into_iter()
                        .map(|piece| match piece {
                            Piece::Text(text) => Node::marked_text(text, marks),
                            Piece::Tag(tag) => Node::Tag { value: tag },
                        })
                        .collect()
                }
            }
            mut other => {
                if let Some(children) = other.children_mut() {
                    let split = split_tags(std::mem::take(children));
                    *children = split;
                }
                vec![other]
            }
        })
        .collect()
}

enum Piece {
    Text(String),
    Tag(String),
}

/// Returns an empty vec when the text contains no tags.
fn split_text(value: &str) -> Vec<Piece> {
    let mut pieces: Vec<Piece> = Vec::new();
    let mut last = 0;
    for captures in TAG_RE.captures_iter(value) {
        let whole = captures.get(0).expect("match");
        let name = &captures[1];

        let at_boundary = whole.start() == 0
            || value[..whole.start()]
                .chars()
                .next_back()
                .map_or(false, char::is_whitespace);
        let has_non_digit = name.chars().any(|c| !c.is_ascii_digit());
        if !at_boundary || !has_non_digit {
            continue;
        }

        if whole.start() > last {
            pieces.push(Piece::Text(value[last..whole.start()].to_string()));
        }
        pieces.push(Piece::Tag(name.to_string()));
        last = whole.end();
    }
    if pieces.is_empty() {
        return pieces;
    }
    if last < value.len() {
        pieces.push(Piece::Text(value[last..].to_string()));
    }
    pieces
}

/// Collect every inline tag into a deduplicated list, replacing the nodes
/// with plain text so the markers survive as ordinary content.
pub fn collect_tags(nodes: Vec<Node>) -> (Vec<Node>, Vec<String>) {
    let mut tags: Vec<String> = Vec::new();
    let tree = collect_into(nodes, &mut tags);
    (tree, tags)
}

fn collect_into(nodes: Vec<Node>, tags: &mut Vec<String>) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Tag { value } => {
                if !tags.contains(&value) {
                    tags.push(value.clone());
                }
                Node::text(format!("#{}", value))
            }
            mut other => {
                if let Some(children) = other.children_mut() {
                    let collected = collect_into(std::mem::take(children), tags);
                    *children = collected;
                }
                other
            }
        })
        .collect()
}
