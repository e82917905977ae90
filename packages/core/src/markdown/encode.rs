//! Editable Tree → Markdown
//!
//! The inverse of [`super::decode`]. Block structure serializes directly;
//! the work is in inline runs, where flat per-leaf mark flags must become
//! nested, balanced marker pairs. Conventions: `-` bullets, `_` emphasis,
//! `**` strong, fenced code blocks, `\` hard breaks.
//!
//! # Mark folding
//!
//! Sibling text leaves are processed left to right against a stack of open
//! marks. For each leaf, the marks that start here (absent on the previous
//! leaf) and end here (absent on the next) are computed; every leaf is
//! wrapped in the currently-open marks in reverse-open order and adjacent
//! spans of identical shape are merged afterwards. Closing therefore always
//! happens in reverse-open order and the output can never contain
//! overlapping marker pairs. When exactly one mark both opens and closes on
//! a single leaf, leading/trailing spaces are hoisted outside the markers
//! (marker-adjacent whitespace would void the emphasis); with multiple
//! simultaneous closers the whitespace stays inside.

use super::ast::{Mark, MarkSet, Node};

/// Encode a tree as Markdown. Output ends with a single trailing newline.
pub fn encode(nodes: &[Node]) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for node in nodes {
        match node {
            // galleries flatten back into one stand-alone image per block
            Node::ImageGallery { children } => {
                for image in children {
                    let block = encode_block(image);
                    if !block.is_empty() {
                        blocks.push(block);
                    }
                }
            }
            other => {
                let block = encode_block(other);
                if !block.is_empty() {
                    blocks.push(block);
                }
            }
        }
    }
    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn encode_block(node: &Node) -> String {
    match node {
        Node::Paragraph { children } => escape_line_starts(&encode_inlines(children)),
        Node::Heading { depth, children } => {
            format!(
                "{} {}",
                "#".repeat((*depth).max(1) as usize),
                encode_inlines(children)
            )
        }
        Node::Blockquote { children } => prefix_lines(&encode_block_sequence(children, "\n\n")),
        Node::List {
            ordered,
            start,
            spread,
            children,
        } => encode_list(*ordered, *start, *spread, children),
        Node::ListItem { checked, children } => {
            // only reachable for items outside a list; render as unordered
            encode_list_item("-", *checked, children, false)
        }
        Node::Table { children } => encode_table(children),
        Node::TableRow { children } | Node::TableCell { children } => encode_inlines(children),
        Node::CodeBlock { lang, meta, value } => encode_code_block(lang, meta, value),
        Node::ImageGallery { children } => encode_block_sequence(children, "\n\n"),
        Node::FootnoteDefinition {
            identifier,
            children,
        } => {
            let content = encode_block_sequence(children, "\n\n");
            let mut lines = content.lines();
            let first = lines.next().unwrap_or("");
            let mut out = format!("[^{}]: {}", identifier, first);
            for line in lines {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str("    ");
                    out.push_str(line);
                }
            }
            out
        }
        Node::Html { value } => value.clone(),
        Node::ThematicBreak => "---".to_string(),
        // inline nodes surfacing at block level render as their own run
        inline @ (Node::Text { .. }
        | Node::Link { .. }
        | Node::NoteLink { .. }
        | Node::Image { .. }
        | Node::Video { .. }
        | Node::InlineMath { .. }
        | Node::Math { .. }
        | Node::Break
        | Node::FootnoteReference { .. }
        | Node::Tag { .. }
        | Node::Wikilink { .. }) => encode_inlines(std::slice::from_ref(inline)),
    }
}

fn encode_block_sequence(nodes: &[Node], separator: &str) -> String {
    nodes
        .iter()
        .map(encode_block)
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn encode_list(ordered: bool, start: Option<u64>, spread: bool, children: &[Node]) -> String {
    let separator = if spread { "\n\n" } else { "\n" };
    let first = start.unwrap_or(1);
    children
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let marker = if ordered {
                format!("{}.", first + index as u64)
            } else {
                "-".to_string()
            };
            match item {
                Node::ListItem { checked, children } => {
                    encode_list_item(&marker, *checked, children, spread)
                }
                other => format!("{} {}", marker, encode_block(other)),
            }
        })
        .collect::<Vec<_>>()
        .join(separator)
}

fn encode_list_item(marker: &str, checked: Option<bool>, children: &[Node], spread: bool) -> String {
    let separator = if spread { "\n\n" } else { "\n" };
    let mut content = encode_block_sequence(children, separator);
    if let Some(checked) = checked {
        content = format!("[{}] {}", if checked { 'x' } else { ' ' }, content);
    }
    let indent = " ".repeat(marker.len() + 1);
    let mut lines = content.lines();
    let mut out = format!("{} {}", marker, lines.next().unwrap_or(""));
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&indent);
            out.push_str(line);
        }
    }
    out
}

fn encode_table(rows: &[Node]) -> String {
    let rendered: Vec<Vec<String>> = rows
        .iter()
        .map(|row| match row {
            Node::TableRow { children } => children
                .iter()
                .map(|cell| match cell {
                    Node::TableCell { children } => escape_table_cell(&encode_inlines(children)),
                    other => escape_table_cell(&encode_inlines(std::slice::from_ref(other))),
                })
                .collect(),
            other => vec![escape_table_cell(&encode_inlines(std::slice::from_ref(
                other,
            )))],
        })
        .collect();

    let mut out = String::new();
    for (index, cells) in rendered.iter().enumerate() {
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |");
        if index == 0 {
            out.push('\n');
            out.push_str("| ");
            out.push_str(&vec!["---"; cells.len().max(1)].join(" | "));
            out.push_str(" |");
        }
        if index + 1 < rendered.len() {
            out.push('\n');
        }
    }
    out
}

fn encode_code_block(lang: &Option<String>, meta: &Option<String>, value: &str) -> String {
    let mut fence = "```".to_string();
    while value.contains(&fence) {
        fence.push('`');
    }
    let mut info = lang.clone().unwrap_or_default();
    if let Some(meta) = meta {
        if !info.is_empty() {
            info.push(' ');
        }
        info.push_str(meta);
    }
    if value.is_empty() {
        format!("{}{}\n{}", fence, info, fence)
    } else {
        format!("{}{}\n{}\n{}", fence, info, value, fence)
    }
}

// ---------------------------------------------------------------------------
// Inline serialization
// ---------------------------------------------------------------------------

/// Nested inline span, the intermediate between flat leaves and markers.
#[derive(Debug, Clone, PartialEq)]
enum Span {
    Text(String),
    Code(String),
    Emphasis(Vec<Span>),
    Strong(Vec<Span>),
    Delete(Vec<Span>),
}

fn encode_inlines(nodes: &[Node]) -> String {
    let mut out = String::new();
    let mut run: Vec<(String, MarkSet)> = Vec::new();

    for node in nodes {
        if let Node::Text { value, marks } = node {
            run.push((value.clone(), *marks));
            continue;
        }
        flush_run(&mut out, &mut run);
        out.push_str(&encode_inline_node(node));
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut Vec<(String, MarkSet)>) {
    if run.is_empty() {
        return;
    }
    for span in fold_marks(run) {
        out.push_str(&span_to_string(&span));
    }
    run.clear();
}

fn encode_inline_node(node: &Node) -> String {
    match node {
        Node::Link {
            url,
            title,
            children,
        } => format!(
            "[{}]({})",
            encode_inlines(children),
            destination(url, title.as_deref())
        ),
        Node::NoteLink {
            target_id,
            target_journal,
            title,
        } => format!(
            "[{}](../{}/{}.md)",
            escape_inline(title),
            target_journal,
            target_id
        ),
        Node::Image { url, title, alt } | Node::Video { url, title, alt } => format!(
            "![{}]({})",
            escape_inline(alt.as_deref().unwrap_or_default()),
            destination(url, title.as_deref())
        ),
        Node::InlineMath { value } => format!("${}$", value),
        Node::Math { value } => format!("$${}$$", value),
        Node::Break => "\\\n".to_string(),
        Node::FootnoteReference { identifier } => format!("[^{}]", identifier),
        Node::Html { value } => value.clone(),
        Node::Tag { value } => format!("#{}", value),
        wikilink @ Node::Wikilink { .. } => wikilink_literal(wikilink),
        // a text leaf never reaches here; block nodes in inline position
        // fall back to their block form
        block @ (Node::Text { .. }
        | Node::Paragraph { .. }
        | Node::Heading { .. }
        | Node::Blockquote { .. }
        | Node::List { .. }
        | Node::ListItem { .. }
        | Node::Table { .. }
        | Node::TableRow { .. }
        | Node::TableCell { .. }
        | Node::CodeBlock { .. }
        | Node::ImageGallery { .. }
        | Node::FootnoteDefinition { .. }
        | Node::ThematicBreak) => encode_block(block),
    }
}

/// Serialize an unresolved wikilink back to its literal source form, so it
/// survives as ordinary text instead of dying confusingly.
pub(crate) fn wikilink_literal(node: &Node) -> String {
    let Node::Wikilink {
        target,
        hash,
        alias,
        embed,
    } = node
    else {
        return String::new();
    };
    let mut name = target.clone();
    if let Some(hash) = hash {
        name.push('#');
        name.push_str(hash);
    }
    if !target.contains(alias.as_str()) {
        name.push('|');
        name.push_str(alias);
    }
    let text = format!("[[{}]]", name);
    if *embed {
        format!("!{}", text)
    } else {
        text
    }
}

/// Fold a run of flat-marked leaves into nested spans.
fn fold_marks(leaves: &[(String, MarkSet)]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut open: Vec<Mark> = Vec::new();
    let mut text_acc = String::new();

    for index in 0..leaves.len() {
        let (text, current) = &leaves[index];
        text_acc.push_str(text);

        let open_before = open.clone();
        let previous = index.checked_sub(1).map(|i| leaves[i].1);
        let next = leaves.get(index + 1).map(|leaf| leaf.1);

        let mut ends: Vec<Mark> = Vec::new();
        for mark in Mark::ALL {
            if current.contains(mark) {
                if previous.map_or(true, |p| !p.contains(mark)) {
                    open.push(mark);
                }
                if next.map_or(true, |n| !n.contains(mark)) {
                    ends.push(mark);
                }
            }
        }

        let ends_to_remove: Vec<usize> = open
            .iter()
            .enumerate()
            .filter(|(_, mark)| ends.contains(mark))
            .map(|(i, _)| i)
            .collect();

        if !open.is_empty() {
            let mut before = String::new();
            let mut after = String::new();
            // hoist edge whitespace only in the unambiguous case: a single
            // mark that opens and closes on this very leaf
            if ends_to_remove.len() == 1 && open_before != open && open.len() == ends_to_remove.len()
            {
                while text_acc.starts_with(' ') {
                    before.push(' ');
                    text_acc.remove(0);
                }
                while text_acc.ends_with(' ') {
                    after.insert(0, ' ');
                    text_acc.pop();
                }
            }
            let mut wrapped = Span::Text(std::mem::take(&mut text_acc));
            for mark in open.iter().rev() {
                wrapped = match mark {
                    Mark::Code => Span::Code(span_plain_value(wrapped)),
                    Mark::Italic => Span::Emphasis(vec![wrapped]),
                    Mark::Bold => Span::Strong(vec![wrapped]),
                    Mark::Strikethrough => Span::Delete(vec![wrapped]),
                };
            }
            if !before.is_empty() {
                spans.push(Span::Text(before));
            }
            spans.push(wrapped);
            if !after.is_empty() {
                spans.push(Span::Text(after));
            }
        }

        if ends_to_remove.is_empty() {
            spans.push(Span::Text(std::mem::take(&mut text_acc)));
        } else {
            for i in ends_to_remove.iter().rev() {
                open.remove(*i);
            }
        }
    }
    if !text_acc.is_empty() {
        spans.push(Span::Text(text_acc));
    }

    merge_spans(spans)
}

/// Flatten a span to its raw text; inline code cannot nest other markers.
fn span_plain_value(span: Span) -> String {
    match span {
        Span::Text(value) | Span::Code(value) => value,
        Span::Emphasis(children) | Span::Strong(children) | Span::Delete(children) => {
            children.into_iter().map(span_plain_value).collect()
        }
    }
}

/// Merge adjacent spans of identical shape so `**a****b**` becomes `**ab**`.
fn merge_spans(spans: Vec<Span>) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for current in spans {
        match (merged.last_mut(), current) {
            (Some(Span::Text(last)), Span::Text(value)) => last.push_str(&value),
            (Some(Span::Code(last)), Span::Code(value)) => last.push_str(&value),
            (Some(Span::Emphasis(last)), Span::Emphasis(children)) => {
                last.extend(children);
                *last = merge_spans(std::mem::take(last));
            }
            (Some(Span::Strong(last)), Span::Strong(children)) => {
                last.extend(children);
                *last = merge_spans(std::mem::take(last));
            }
            (Some(Span::Delete(last)), Span::Delete(children)) => {
                last.extend(children);
                *last = merge_spans(std::mem::take(last));
            }
            (_, Span::Text(value)) if value.is_empty() => {}
            (_, current) => merged.push(current),
        }
    }
    merged
}

fn span_to_string(span: &Span) -> String {
    match span {
        Span::Text(value) => escape_inline(value),
        Span::Code(value) => code_span(value),
        Span::Emphasis(children) => format!("_{}_", spans_to_string(children)),
        Span::Strong(children) => format!("**{}**", spans_to_string(children)),
        Span::Delete(children) => format!("~~{}~~", spans_to_string(children)),
    }
}

fn spans_to_string(spans: &[Span]) -> String {
    spans.iter().map(span_to_string).collect()
}

/// Wrap a code span, lengthening the fence and padding as CommonMark
/// requires when the value itself contains backticks or edge spaces.
fn code_span(value: &str) -> String {
    let mut fence = "`".to_string();
    while value.contains(&fence) {
        fence.push('`');
    }
    let needs_padding = value.starts_with('`')
        || value.ends_with('`')
        || (value.starts_with(' ') && value.ends_with(' ') && !value.trim().is_empty());
    if needs_padding {
        format!("{} {} {}", fence, value, fence)
    } else {
        format!("{}{}{}", fence, value, fence)
    }
}

fn destination(url: &str, title: Option<&str>) -> String {
    let url_part = if url.is_empty() || url.chars().any(|c| c.is_whitespace() || c == '(' || c == ')')
    {
        format!("<{}>", url)
    } else {
        url.to_string()
    };
    match title {
        Some(title) => format!("{} \"{}\"", url_part, title.replace('"', "\\\"")),
        None => url_part,
    }
}

/// Backslash-escape characters that would otherwise re-parse as markup.
fn escape_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '~' | '<') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape characters that would start a block construct at a line start.
fn escape_line_starts(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let needs_escape = trimmed.starts_with('#')
                || trimmed.starts_with('>')
                || trimmed.starts_with("- ")
                || trimmed.starts_with("+ ")
                || trimmed == "-"
                || trimmed.starts_with("---")
                || starts_with_ordered_marker(trimmed);
            if needs_escape {
                let offset = line.len() - trimmed.len();
                format!("{}\\{}", &line[..offset], trimmed)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn starts_with_ordered_marker(line: &str) -> bool {
    let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() > 9 {
        return false;
    }
    let rest = &line[digits.len()..];
    rest.starts_with(". ") || rest.starts_with(") ")
}

fn prefix_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_table_cell(content: &str) -> String {
    content.replace('\n', " ").replace('|', "\\|")
}
