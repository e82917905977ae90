//! Markdown → Editable Tree
//!
//! Folds the pulldown-cmark event stream into the tree defined in
//! [`super::ast`]. Block structure is tracked with an explicit frame stack;
//! inline decoration context is a stack of mark sets so nested emphasis
//! markers collapse into flat per-leaf flags.
//!
//! Two modes exist. The editor mode flattens `[[wikilinks]]` into literal
//! text (the editor has no wikilink element); the import mode keeps them as
//! low-level `Wikilink` nodes and additionally splits inline `#tag` markers,
//! both of which the import processor resolves before re-encoding.

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};

use super::ast::{non_empty, plain_text, Mark, MarkSet, Node};
use super::tags::split_tags;
use crate::utils::is_note_id;

/// File extensions treated as video when decoding image syntax. Videos are
/// stored in Markdown as images and recovered here by extension.
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "webm", "ogv", "mov"];

/// Decode Markdown into an editable tree for the editor.
///
/// Wikilink syntax is parsed but flattened back to literal text so it
/// survives as ordinary content.
pub fn decode(markdown: &str) -> Vec<Node> {
    decode_with(markdown, false)
}

/// Decode Markdown for import processing.
///
/// Keeps `[[wikilinks]]` / `![[embeds]]` as `Wikilink` nodes and splits
/// inline `#tag` markers into `Tag` nodes for the processor to resolve.
pub fn decode_import(markdown: &str) -> Vec<Node> {
    decode_with(markdown, true)
}

fn decode_with(markdown: &str, import_mode: bool) -> Vec<Node> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);
    options.insert(Options::ENABLE_WIKILINKS);
    options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);

    let parser = Parser::new_ext(markdown, options);
    let mut decoder = Decoder::new(import_mode);

    for event in parser {
        decoder.handle(event);
    }

    let tree = unwrap_standalone_media(decoder.root);
    if import_mode {
        split_tags(tree)
    } else {
        tree
    }
}

/// An open element while folding the event stream.
struct Frame {
    kind: FrameKind,
    children: Vec<Node>,
    /// True for paragraphs synthesized inside tight list items; closed
    /// automatically when the item ends.
    implicit: bool,
}

enum FrameKind {
    Paragraph,
    Heading(u8),
    Blockquote,
    List {
        ordered: bool,
        start: Option<u64>,
        spread: bool,
    },
    ListItem {
        checked: Option<bool>,
    },
    Table,
    TableRow,
    TableCell,
    FootnoteDefinition(String),
    Link {
        url: String,
        title: Option<String>,
        wikilink: bool,
    },
    Image {
        url: String,
        title: Option<String>,
        wikilink: bool,
    },
    CodeBlock {
        lang: Option<String>,
        meta: Option<String>,
        value: String,
    },
    HtmlBlock {
        value: String,
    },
    /// YAML front matter block; content is swallowed (front matter is
    /// stripped before decoding, this is defense against stray blocks).
    Metadata,
}

struct Decoder {
    stack: Vec<Frame>,
    root: Vec<Node>,
    mark_stack: Vec<MarkSet>,
    import_mode: bool,
}

impl Decoder {
    fn new(import_mode: bool) -> Self {
        Decoder {
            stack: Vec::new(),
            root: Vec::new(),
            mark_stack: vec![MarkSet::EMPTY],
            import_mode,
        }
    }

    fn marks(&self) -> MarkSet {
        *self.mark_stack.last().unwrap_or(&MarkSet::EMPTY)
    }

    fn open(&mut self, kind: FrameKind) {
        self.stack.push(Frame {
            kind,
            children: Vec::new(),
            implicit: false,
        });
    }

    /// Pop the top frame and attach its finished node to the parent.
    fn close(&mut self) {
        if let Some(frame) = self.stack.pop() {
            if let Some(node) = self.finish(frame) {
                self.push_node(node);
            }
        }
    }

    fn push_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(node),
            None => self.root.push(node),
        }
    }

    /// Append a text run, merging into the previous leaf when marks match.
    fn push_text(&mut self, value: &str, marks: MarkSet) {
        let children = match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        };
        if let Some(Node::Text {
            value: prev,
            marks: prev_marks,
        }) = children.last_mut()
        {
            if *prev_marks == marks {
                prev.push_str(value);
                return;
            }
        }
        children.push(Node::marked_text(value, marks));
    }

    /// Tight list items receive inline events directly; wrap them in an
    /// implicit paragraph so every leaf stays inside a block element.
    fn ensure_inline_container(&mut self) {
        if matches!(
            self.stack.last().map(|f| &f.kind),
            Some(FrameKind::ListItem { .. })
        ) {
            self.stack.push(Frame {
                kind: FrameKind::Paragraph,
                children: Vec::new(),
                implicit: true,
            });
        }
    }

    fn close_implicit_paragraph(&mut self) {
        if self.stack.last().map(|f| f.implicit) == Some(true) {
            self.close();
        }
    }

    /// An explicit paragraph inside a list item means the list is loose.
    fn mark_enclosing_list_spread(&mut self) {
        for frame in self.stack.iter_mut().rev() {
            if let FrameKind::List { spread, .. } = &mut frame.kind {
                *spread = true;
                return;
            }
        }
    }

    fn set_item_checked(&mut self, value: bool) {
        for frame in self.stack.iter_mut().rev() {
            if let FrameKind::ListItem { checked } = &mut frame.kind {
                *checked = Some(value);
                return;
            }
        }
    }

    fn in_swallowed_block(&self) -> bool {
        matches!(
            self.stack.last().map(|f| &f.kind),
            Some(FrameKind::Metadata)
        )
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.handle_start(tag),
            Event::End(end) => self.handle_end(end),
            Event::Text(text) => {
                if self.in_swallowed_block() {
                    return;
                }
                if let Some(frame) = self.stack.last_mut() {
                    match &mut frame.kind {
                        FrameKind::CodeBlock { value, .. } => {
                            value.push_str(&text);
                            return;
                        }
                        FrameKind::HtmlBlock { value } => {
                            value.push_str(&text);
                            return;
                        }
                        _ => {}
                    }
                }
                self.ensure_inline_container();
                let marks = self.marks();
                self.push_text(&text, marks);
            }
            Event::Code(code) => {
                self.ensure_inline_container();
                let marks = self.marks().with(Mark::Code);
                self.push_text(&code, marks);
            }
            Event::InlineMath(value) => {
                self.ensure_inline_container();
                self.push_node(Node::InlineMath {
                    value: value.to_string(),
                });
            }
            Event::DisplayMath(value) => {
                self.push_node(Node::Math {
                    value: value.to_string(),
                });
            }
            Event::Html(html) => {
                if let Some(frame) = self.stack.last_mut() {
                    if let FrameKind::HtmlBlock { value } = &mut frame.kind {
                        value.push_str(&html);
                        return;
                    }
                }
                self.push_node(Node::Html {
                    value: html.trim_end_matches('\n').to_string(),
                });
            }
            Event::InlineHtml(html) => {
                self.ensure_inline_container();
                self.push_node(Node::Html {
                    value: html.to_string(),
                });
            }
            Event::FootnoteReference(identifier) => {
                self.ensure_inline_container();
                self.push_node(Node::FootnoteReference {
                    identifier: identifier.to_string(),
                });
            }
            Event::SoftBreak => {
                self.ensure_inline_container();
                let marks = self.marks();
                self.push_text("\n", marks);
            }
            Event::HardBreak => {
                self.ensure_inline_container();
                self.push_node(Node::Break);
            }
            Event::Rule => {
                self.close_implicit_paragraph();
                self.push_node(Node::ThematicBreak);
            }
            Event::TaskListMarker(checked) => self.set_item_checked(checked),
        }
    }

    fn handle_start(&mut self, tag: Tag<'_>) {
        // a block element opening inside a tight list item ends the
        // synthesized paragraph
        if matches!(
            tag,
            Tag::Paragraph
                | Tag::Heading { .. }
                | Tag::BlockQuote { .. }
                | Tag::CodeBlock(_)
                | Tag::List(_)
                | Tag::Table { .. }
                | Tag::FootnoteDefinition(_)
                | Tag::HtmlBlock
        ) {
            self.close_implicit_paragraph();
        }
        match tag {
            Tag::Paragraph => {
                if matches!(
                    self.stack.last().map(|f| &f.kind),
                    Some(FrameKind::ListItem { .. })
                ) {
                    self.mark_enclosing_list_spread();
                }
                self.open(FrameKind::Paragraph);
            }
            Tag::Heading { level, .. } => {
                // the editor supports two heading sizes
                let depth = (level as u8).min(2);
                self.open(FrameKind::Heading(depth));
            }
            Tag::BlockQuote { .. } => self.open(FrameKind::Blockquote),
            Tag::CodeBlock(kind) => {
                let (lang, meta) = match kind {
                    CodeBlockKind::Fenced(info) => split_code_info(&info),
                    CodeBlockKind::Indented => (None, None),
                };
                self.open(FrameKind::CodeBlock {
                    lang,
                    meta,
                    value: String::new(),
                });
            }
            Tag::List(start) => self.open(FrameKind::List {
                ordered: start.is_some(),
                start,
                spread: false,
            }),
            Tag::Item => self.open(FrameKind::ListItem { checked: None }),
            Tag::FootnoteDefinition(identifier) => {
                self.open(FrameKind::FootnoteDefinition(identifier.to_string()));
            }
            Tag::Table { .. } => self.open(FrameKind::Table),
            Tag::TableHead => self.open(FrameKind::TableRow),
            Tag::TableRow => self.open(FrameKind::TableRow),
            Tag::TableCell => self.open(FrameKind::TableCell),
            Tag::Emphasis => {
                self.ensure_inline_container();
                self.mark_stack.push(self.marks().with(Mark::Italic));
            }
            Tag::Strong => {
                self.ensure_inline_container();
                self.mark_stack.push(self.marks().with(Mark::Bold));
            }
            Tag::Strikethrough => {
                self.ensure_inline_container();
                self.mark_stack.push(self.marks().with(Mark::Strikethrough));
            }
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                self.ensure_inline_container();
                self.open(FrameKind::Link {
                    url: dest_url.to_string(),
                    title: none_if_empty(&title),
                    wikilink: matches!(link_type, LinkType::WikiLink { .. }),
                });
            }
            Tag::Image {
                link_type,
                dest_url,
                title,
                ..
            } => {
                self.ensure_inline_container();
                self.open(FrameKind::Image {
                    url: dest_url.to_string(),
                    title: none_if_empty(&title),
                    wikilink: matches!(link_type, LinkType::WikiLink { .. }),
                });
            }
            Tag::HtmlBlock => self.open(FrameKind::HtmlBlock {
                value: String::new(),
            }),
            Tag::MetadataBlock(_) => self.open(FrameKind::Metadata),
            // Extensions we do not enable (definition lists, sub/superscript)
            _ => {}
        }
    }

    fn handle_end(&mut self, end: TagEnd) {
        match end {
            TagEnd::Paragraph
            | TagEnd::Heading { .. }
            | TagEnd::BlockQuote { .. }
            | TagEnd::CodeBlock
            | TagEnd::List { .. }
            | TagEnd::FootnoteDefinition
            | TagEnd::Table
            | TagEnd::TableHead
            | TagEnd::TableRow
            | TagEnd::TableCell
            | TagEnd::Link
            | TagEnd::Image
            | TagEnd::HtmlBlock
            | TagEnd::MetadataBlock { .. } => self.close(),
            TagEnd::Item => {
                self.close_implicit_paragraph();
                self.close();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                if self.mark_stack.len() > 1 {
                    self.mark_stack.pop();
                }
            }
            _ => {}
        }
    }

    /// Build the finished node for a closed frame.
    fn finish(&mut self, frame: Frame) -> Option<Node> {
        let Frame { kind, children, .. } = frame;
        let node = match kind {
            FrameKind::Paragraph => Node::Paragraph {
                children: non_empty(children),
            },
            FrameKind::Heading(depth) => Node::Heading {
                depth,
                children: non_empty(children),
            },
            FrameKind::Blockquote => Node::Blockquote {
                children: non_empty(children),
            },
            FrameKind::List {
                ordered,
                start,
                spread,
            } => Node::List {
                ordered,
                start,
                spread,
                children: non_empty(children),
            },
            FrameKind::ListItem { checked } => Node::ListItem {
                checked,
                children: non_empty(children),
            },
            FrameKind::Table => Node::Table {
                children: non_empty(children),
            },
            FrameKind::TableRow => Node::TableRow {
                children: non_empty(children),
            },
            FrameKind::TableCell => Node::TableCell {
                children: non_empty(children),
            },
            FrameKind::FootnoteDefinition(identifier) => Node::FootnoteDefinition {
                identifier,
                children: non_empty(children),
            },
            FrameKind::CodeBlock { lang, meta, value } => Node::CodeBlock {
                lang,
                meta,
                value: value.trim_end_matches('\n').to_string(),
            },
            FrameKind::HtmlBlock { value } => Node::Html {
                value: value.trim_end_matches('\n').to_string(),
            },
            FrameKind::Metadata => return None,
            FrameKind::Link {
                url,
                title,
                wikilink,
            } => self.finish_link(url, title, wikilink, children),
            FrameKind::Image {
                url,
                title,
                wikilink,
            } => self.finish_image(url, title, wikilink, children),
        };
        Some(node)
    }

    fn finish_link(
        &self,
        url: String,
        title: Option<String>,
        wikilink: bool,
        children: Vec<Node>,
    ) -> Node {
        if wikilink {
            let node = wikilink_node(&url, &children, false);
            return if self.import_mode {
                node
            } else {
                Node::text(super::encode::wikilink_literal(&node))
            };
        }
        if let Some(note_link) = parse_note_link(&url, &children) {
            return note_link;
        }
        Node::Link {
            url,
            title,
            children: non_empty(children),
        }
    }

    fn finish_image(
        &self,
        url: String,
        title: Option<String>,
        wikilink: bool,
        children: Vec<Node>,
    ) -> Node {
        if wikilink {
            let node = wikilink_node(&url, &children, true);
            return if self.import_mode {
                node
            } else {
                Node::text(super::encode::wikilink_literal(&node))
            };
        }
        let alt = plain_text(&children);
        let alt = if alt.is_empty() { None } else { Some(alt) };
        if is_video_url(&url) {
            Node::Video { url, title, alt }
        } else {
            Node::Image { url, title, alt }
        }
    }
}

/// Split a fence info string into (lang, meta).
fn split_code_info(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    if info.is_empty() {
        return (None, None);
    }
    match info.split_once(char::is_whitespace) {
        Some((lang, meta)) => (
            Some(lang.to_string()),
            Some(meta.trim().to_string()).filter(|m| !m.is_empty()),
        ),
        None => (Some(info.to_string()), None),
    }
}

fn none_if_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn is_video_url(url: &str) -> bool {
    let ext = url.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// Build a `Wikilink` node from the raw `[[target#hash|alias]]` parts.
///
/// When no alias was written, the alias defaults to the target's file stem,
/// which is also the key used to resolve embeds against staged files.
fn wikilink_node(target: &str, children: &[Node], embed: bool) -> Node {
    let (target, hash) = match target.split_once('#') {
        Some((t, h)) if !h.is_empty() => (t.to_string(), Some(h.to_string())),
        _ => (target.to_string(), None),
    };
    let alias = {
        let text = plain_text(children);
        if text.is_empty() || text == target {
            file_stem(&target)
        } else {
            text
        }
    };
    Node::Wikilink {
        target,
        hash,
        alias,
        embed,
    }
}

fn file_stem(target: &str) -> String {
    let file = target.rsplit('/').next().unwrap_or(target);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

/// Recognize the private note-to-note link shape `../<journal>/<id>.md`.
fn parse_note_link(url: &str, children: &[Node]) -> Option<Node> {
    let rest = url.strip_prefix("../")?;
    let (journal, file) = rest.split_once('/')?;
    let id = file.strip_suffix(".md")?;
    if journal.is_empty() || journal.contains('/') || !is_note_id(id) {
        return None;
    }
    Some(Node::NoteLink {
        target_id: id.to_string(),
        target_journal: journal.to_string(),
        title: plain_text(children),
    })
}

/// Stand-alone images parse as paragraphs with a single image child; unwrap
/// them to top level and group consecutive runs into galleries. The encoder
/// reverses both transforms exactly.
fn unwrap_standalone_media(blocks: Vec<Node>) -> Vec<Node> {
    let unwrapped: Vec<Node> = blocks
        .into_iter()
        .map(|block| match block {
            Node::Paragraph { mut children }
                if children.len() == 1
                    && matches!(children[0], Node::Image { .. } | Node::Video { .. }) =>
            {
                children.remove(0)
            }
            other => other,
        })
        .collect();

    let mut out: Vec<Node> = Vec::new();
    let mut run: Vec<Node> = Vec::new();
    for block in unwrapped {
        if matches!(block, Node::Image { .. }) {
            run.push(block);
            continue;
        }
        flush_image_run(&mut out, &mut run);
        out.push(block);
    }
    flush_image_run(&mut out, &mut run);
    out
}

fn flush_image_run(out: &mut Vec<Node>, run: &mut Vec<Node>) {
    match run.len() {
        0 => {}
        1 => out.push(run.pop().unwrap()),
        _ => out.push(Node::ImageGallery {
            children: std::mem::take(run),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::ast::Mark;

    #[test]
    fn decodes_paragraph_with_nested_marks() {
        let tree = decode("plain **bold _both_** tail");
        let Node::Paragraph { children } = &tree[0] else {
            panic!("expected paragraph, got {:?}", tree[0]);
        };
        assert_eq!(children[0], Node::text("plain "));
        assert_eq!(
            children[1],
            Node::marked_text("bold ", MarkSet::EMPTY.with(Mark::Bold))
        );
        assert_eq!(
            children[2],
            Node::marked_text("both", MarkSet::EMPTY.with(Mark::Bold).with(Mark::Italic))
        );
        assert_eq!(children[3], Node::text(" tail"));
    }

    #[test]
    fn inline_code_inherits_surrounding_marks() {
        let tree = decode("**a `code`**");
        let Node::Paragraph { children } = &tree[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            children[1],
            Node::marked_text("code", MarkSet::EMPTY.with(Mark::Bold).with(Mark::Code))
        );
    }

    #[test]
    fn heading_depth_is_clamped_to_two() {
        let tree = decode("# one\n\n### three");
        assert!(matches!(tree[0], Node::Heading { depth: 1, .. }));
        assert!(matches!(tree[1], Node::Heading { depth: 2, .. }));
    }

    #[test]
    fn tight_list_items_get_implicit_paragraphs() {
        let tree = decode("- a\n- b");
        let Node::List {
            ordered,
            spread,
            children,
            ..
        } = &tree[0]
        else {
            panic!("expected list");
        };
        assert!(!ordered);
        assert!(!spread);
        let Node::ListItem { children: item, .. } = &children[0] else {
            panic!("expected item");
        };
        assert_eq!(
            item[0],
            Node::Paragraph {
                children: vec![Node::text("a")]
            }
        );
    }

    #[test]
    fn loose_list_is_spread() {
        let tree = decode("- a\n\n- b");
        assert!(matches!(tree[0], Node::List { spread: true, .. }));
    }

    #[test]
    fn task_markers_set_checked() {
        let tree = decode("- [x] done\n- [ ] todo");
        let Node::List { children, .. } = &tree[0] else {
            panic!("expected list");
        };
        assert!(matches!(
            children[0],
            Node::ListItem {
                checked: Some(true),
                ..
            }
        ));
        assert!(matches!(
            children[1],
            Node::ListItem {
                checked: Some(false),
                ..
            }
        ));
    }

    #[test]
    fn standalone_image_is_unwrapped() {
        let tree = decode("before\n\n![alt](a.png)\n\nafter");
        assert!(matches!(tree[1], Node::Image { .. }));
    }

    #[test]
    fn consecutive_images_group_into_a_gallery() {
        let tree = decode("![a](a.png)\n\n![b](b.png)\n\ntail");
        let Node::ImageGallery { children } = &tree[0] else {
            panic!("expected gallery, got {:?}", tree[0]);
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(tree[1], Node::Paragraph { .. }));
    }

    #[test]
    fn video_extension_decodes_to_video_node() {
        let tree = decode("![clip](movie.mp4)");
        assert!(matches!(tree[0], Node::Video { .. }));
    }

    #[test]
    fn note_link_pattern_becomes_note_link() {
        let md = "[Road Trip](../notion/0192bd1f-3a8c-7c93-a1e2-b3c4d5e6f708.md)";
        let tree = decode(md);
        let Node::Paragraph { children } = &tree[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            children[0],
            Node::NoteLink {
                target_id: "0192bd1f-3a8c-7c93-a1e2-b3c4d5e6f708".to_string(),
                target_journal: "notion".to_string(),
                title: "Road Trip".to_string(),
            }
        );
    }

    #[test]
    fn ordinary_md_link_stays_a_link() {
        let tree = decode("[doc](./other.md)");
        let Node::Paragraph { children } = &tree[0] else {
            panic!("expected paragraph");
        };
        assert!(matches!(children[0], Node::Link { .. }));
    }

    #[test]
    fn import_mode_keeps_wikilinks() {
        let tree = decode_import("see [[Document 2]] and ![[photo.png]]");
        let Node::Paragraph { children } = &tree[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            children[1],
            Node::Wikilink {
                target: "Document 2".to_string(),
                hash: None,
                alias: "Document 2".to_string(),
                embed: false,
            }
        );
        assert_eq!(
            children[3],
            Node::Wikilink {
                target: "photo.png".to_string(),
                hash: None,
                alias: "photo".to_string(),
                embed: true,
            }
        );
    }

    #[test]
    fn editor_mode_flattens_wikilinks_to_text() {
        let tree = decode("see [[Document 2]]");
        let Node::Paragraph { children } = &tree[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(children[1], Node::text("[[Document 2]]"));
    }

    #[test]
    fn code_block_captures_lang_and_meta() {
        let tree = decode("```rust ignore\nfn main() {}\n```");
        assert_eq!(
            tree[0],
            Node::CodeBlock {
                lang: Some("rust".to_string()),
                meta: Some("ignore".to_string()),
                value: "fn main() {}".to_string(),
            }
        );
    }

    #[test]
    fn front_matter_block_is_swallowed() {
        let tree = decode("---\ntitle: x\n---\n\nbody");
        assert_eq!(
            tree[0],
            Node::Paragraph {
                children: vec![Node::text("body")]
            }
        );
    }

    #[test]
    fn table_rows_and_cells_decode() {
        let md = "| a | b |\n| --- | --- |\n| c | d |";
        let tree = decode(md);
        let Node::Table { children } = &tree[0] else {
            panic!("expected table, got {:?}", tree[0]);
        };
        assert_eq!(children.len(), 2);
        let Node::TableRow { children: cells } = &children[0] else {
            panic!("expected row");
        };
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn hard_break_decodes_to_break_node() {
        let tree = decode("a\\\nb");
        let Node::Paragraph { children } = &tree[0] else {
            panic!("expected paragraph");
        };
        assert!(children.iter().any(|n| matches!(n, Node::Break)));
    }

    #[test]
    fn math_decodes_to_math_nodes() {
        let tree = decode("$x+y$\n\n$$z$$");
        let Node::Paragraph { children } = &tree[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            children[0],
            Node::InlineMath {
                value: "x+y".to_string()
            }
        );
    }
}
