//! Front Matter Parsing
//!
//! Two strategies, selected by the import source. Quill-style Markdown uses
//! a strict `---`-delimited YAML block. Notion exports have no delimiters:
//! the title is the first `# Heading`, and the lines up to the first blank
//! line are key/value candidates that are only accepted as front matter
//! when they parse as a map and the first key looks plausibly like a key
//! rather than prose.
//!
//! Both strategies degrade to "whole input is body, empty front matter" on
//! any ambiguity. A malformed header is a recoverable condition, never an
//! error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::models::FrontMatter;

/// Where the notes being imported came from; selects the parsing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// Notion-style export: no YAML delimiters, loose key/value header.
    Notion,
    /// Plain Markdown files with strict `---`-delimited YAML front matter.
    Markdown,
}

/// Result of splitting a raw note into metadata and body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNote {
    pub title: String,
    pub front_matter: FrontMatter,
    pub body: String,
}

/// A first front-matter key longer than this is assumed to be prose.
const MAX_PLAUSIBLE_KEY_LEN: usize = 20;

/// Parse a note's title, front matter and body.
///
/// `fallback_title` (typically the filename without export suffix) is used
/// when the source provides no title of its own.
pub fn parse_title_and_front_matter(
    contents: &str,
    fallback_title: &str,
    source: SourceType,
) -> ParsedNote {
    match source {
        SourceType::Notion => parse_notion(contents, fallback_title),
        SourceType::Markdown => parse_markdown(contents, fallback_title),
    }
}

// ---------------------------------------------------------------------------
// Strict strategy
// ---------------------------------------------------------------------------

fn parse_markdown(contents: &str, fallback_title: &str) -> ParsedNote {
    let (map, body) = extract_delimited_front_matter(contents);
    let front_matter = front_matter_from_map(map, fallback_title);
    ParsedNote {
        title: front_matter.title.clone(),
        front_matter,
        body,
    }
}

/// Split a strict `---`-delimited YAML block off the body. Returns an empty
/// map and the whole input when no well-formed block is present.
fn extract_delimited_front_matter(contents: &str) -> (Map<String, Value>, String) {
    let lines: Vec<&str> = contents.split('\n').collect();
    if lines.first().map(|l| l.trim_end()) != Some("---") {
        return (Map::new(), contents.to_string());
    }
    let close = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| {
            let line = line.trim_end();
            line == "---" || line == "..."
        })
        .map(|(index, _)| index);
    let Some(close) = close else {
        return (Map::new(), contents.to_string());
    };

    let block = lines[1..close].join("\n");
    let map = match serde_yaml::from_str::<serde_yaml::Value>(&block)
        .ok()
        .and_then(|value| serde_json::to_value(&value).ok())
    {
        Some(Value::Object(map)) => map,
        _ => {
            tracing::warn!("Front matter block did not parse as a map; treating as body");
            return (Map::new(), contents.to_string());
        }
    };

    let body = lines[close + 1..].join("\n");
    (map, body.trim_start_matches('\n').to_string())
}

// ---------------------------------------------------------------------------
// Loose strategy (Notion-style exports)
// ---------------------------------------------------------------------------

struct RawParts {
    title: String,
    front_matter: String,
    body: String,
}

fn parse_notion(contents: &str, fallback_title: &str) -> ParsedNote {
    let raw = extract_raw_front_matter(contents);
    let mut map = if raw.front_matter.is_empty() {
        Map::new()
    } else {
        parse_loose_map(&raw.front_matter)
    };
    normalize_loose_keys(&mut map);

    let fallback = if raw.title.is_empty() {
        fallback_title
    } else {
        raw.title.as_str()
    };
    let front_matter = front_matter_from_map(map, fallback);
    ParsedNote {
        title: front_matter.title.clone(),
        front_matter,
        body: raw.body,
    }
}

/// Scan a Notion-style document for a title line and candidate front
/// matter. Both a bare key/value header and a `---`-bordered one are
/// supported, since exports mix the two.
fn extract_raw_front_matter(contents: &str) -> RawParts {
    let lines: Vec<&str> = contents.split('\n').collect();

    let mut title = String::new();
    let mut header_end = 0usize;
    if let Some(first) = lines.first() {
        if first.starts_with('#') {
            title = first.trim_start_matches('#').trim().to_string();
            header_end = 1;
        }
    }

    let mut front_matter_lines: Vec<&str> = Vec::new();
    let mut body_start = header_end;
    let mut dash_border = false;
    let mut first_empty_seen = false;

    let mut index = header_end;
    while index < lines.len() {
        let line = lines[index].trim();

        if index == header_end && line == "---" {
            dash_border = true;
            index += 1;
            continue;
        }
        if dash_border && index > header_end && line.starts_with("---") {
            body_start = index + 1;
            break;
        }
        if line.is_empty() && !dash_border {
            if first_empty_seen {
                body_start = index + 1;
                break;
            }
            first_empty_seen = true;
            index += 1;
            continue;
        }

        body_start = index + 1;
        front_matter_lines.push(lines[index]);
        index += 1;
    }

    // Plausibility gate: the candidate block must parse as a map and its
    // first key must not be implausibly long, otherwise it is prose.
    if !front_matter_lines.is_empty() {
        let candidate = preprocess_raw_front_matter(&front_matter_lines.join("\n"));
        let parses_as_map = serde_yaml::from_str::<serde_yaml::Value>(&candidate)
            .map(|value| value.is_mapping())
            .unwrap_or(false);
        let first_key_len = front_matter_lines[0]
            .split(':')
            .next()
            .unwrap_or_default()
            .len();
        if !parses_as_map || first_key_len > MAX_PLAUSIBLE_KEY_LEN {
            let body = if title.is_empty() {
                lines.join("\n").trim().to_string()
            } else {
                lines[1..].join("\n").trim().to_string()
            };
            return RawParts {
                title,
                front_matter: String::new(),
                body,
            };
        }
    }

    let body = lines[body_start.min(lines.len())..]
        .join("\n")
        .trim()
        .to_string();
    RawParts {
        title,
        front_matter: front_matter_lines.join("\n"),
        body,
    }
}

fn parse_loose_map(raw: &str) -> Map<String, Value> {
    let processed = preprocess_raw_front_matter(raw);
    match serde_yaml::from_str::<serde_yaml::Value>(&processed)
        .ok()
        .and_then(|value| serde_json::to_value(&value).ok())
    {
        Some(Value::Object(map)) => map,
        _ => {
            tracing::warn!("Loose front matter did not parse as a map; discarding");
            Map::new()
        }
    }
}

static EMPTY_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\w+):[ \t]*$").expect("empty value regex"));
static KEYED_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\w+):[ \t]*(.+)$").expect("keyed value regex"));
static SPECIAL_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[:{}\[\],&*#?|<>=!%@`-]"#).expect("special chars regex"));
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^['"].*['"]$"#).expect("quoted regex"));

/// Clean up raw front matter shapes that trip the YAML parser: keys with no
/// value become empty strings, and unquoted values containing YAML
/// metacharacters are quoted.
fn preprocess_raw_front_matter(content: &str) -> String {
    let step = EMPTY_VALUE_RE.replace_all(content, "$1: \"\"");
    KEYED_VALUE_RE
        .replace_all(&step, |caps: &regex::Captures<'_>| {
            let key = &caps[1];
            let value = caps[2].trim_end();
            if SPECIAL_CHARS_RE.is_match(value) && !QUOTED_RE.is_match(value) {
                format!("{}: \"{}\"", key, value.replace('"', "\\\""))
            } else {
                caps[0].to_string()
            }
        })
        .to_string()
}

/// Normalize export-specific keys: `Tags` to `tags`, `Last Edited` to
/// `updatedAt`, with best-effort date parsing. Invalid dates are dropped
/// with a warning, never fatal.
fn normalize_loose_keys(map: &mut Map<String, Value>) {
    if let Some(tags) = map.remove("Tags") {
        map.insert("tags".to_string(), tags);
    }

    if let Some(value) = map.remove("Last Edited") {
        if let Some(text) = value.as_str() {
            if text.trim().is_empty() {
                // empty values are discarded
            } else if let Some(iso) = parse_date_best_effort(text) {
                map.insert("updatedAt".to_string(), Value::String(iso));
            } else {
                tracing::warn!("Invalid date format for 'Last Edited': {}", text);
            }
        }
    }

    if let Some(value) = map.remove("createdAt") {
        if let Some(text) = value.as_str() {
            if text.trim().is_empty() {
                // discarded
            } else if let Some(iso) = parse_date_best_effort(text) {
                map.insert("createdAt".to_string(), Value::String(iso));
            } else {
                tracing::warn!("Invalid date format for 'createdAt': {}", text);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Build the typed front matter from a parsed map, coercing `tags` to an
/// array in all cases and filling the title fallback.
fn front_matter_from_map(mut map: Map<String, Value>, fallback_title: &str) -> FrontMatter {
    let title = map
        .remove("title")
        .and_then(|value| value.as_str().map(str::to_string))
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| fallback_title.to_string());
    let tags = coerce_tags(map.remove("tags"));
    let created_at = take_string(&mut map, "createdAt");
    let updated_at = take_string(&mut map, "updatedAt");

    FrontMatter {
        title,
        tags,
        created_at,
        updated_at,
        extra: map,
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value),
        Some(Value::String(_)) | None | Some(Value::Null) => None,
        Some(other) => Some(other.to_string()),
    }
}

/// Coerce a front matter `tags` value to an array: missing becomes empty,
/// a comma-joined string is split, an array is kept.
fn coerce_tags(value: Option<Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(tag) => Some(tag.trim().to_string()),
                other => Some(other.to_string()),
            })
            .filter(|tag| !tag.is_empty())
            .collect(),
        Some(_) => Vec::new(),
    }
}

/// Parse an export date through a candidate-format list, returning a
/// millisecond-precision RFC 3339 string.
pub(crate) fn parse_date_best_effort(value: &str) -> Option<String> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(iso_string(parsed.with_timezone(&Utc)));
    }
    for format in [
        "%B %d, %Y %I:%M %p",
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y %I:%M %p",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(iso_string(naive.and_utc()));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(iso_string(date.and_hms_opt(0, 0, 0)?.and_utc()));
    }
    None
}

pub(crate) fn iso_string(datetime: DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parses_delimited_front_matter() {
        let contents = "---\ntitle: My Note\ntags: a, b\n---\n\nbody text\n";
        let parsed = parse_title_and_front_matter(contents, "fallback", SourceType::Markdown);
        assert_eq!(parsed.title, "My Note");
        assert_eq!(parsed.front_matter.tags, vec!["a", "b"]);
        assert_eq!(parsed.body, "body text\n");
    }

    #[test]
    fn strict_title_falls_back_to_filename() {
        let contents = "---\ntags:\n  - x\n---\nbody";
        let parsed = parse_title_and_front_matter(contents, "My File", SourceType::Markdown);
        assert_eq!(parsed.title, "My File");
        assert_eq!(parsed.front_matter.tags, vec!["x"]);
    }

    #[test]
    fn strict_degrades_to_body_without_delimiters() {
        let contents = "just a note\nwith two lines";
        let parsed = parse_title_and_front_matter(contents, "f", SourceType::Markdown);
        assert_eq!(parsed.body, contents);
        assert!(parsed.front_matter.tags.is_empty());
        assert_eq!(parsed.title, "f");
    }

    #[test]
    fn strict_unclosed_block_is_body() {
        let contents = "---\ntitle: broken\nno closing";
        let parsed = parse_title_and_front_matter(contents, "f", SourceType::Markdown);
        assert_eq!(parsed.body, contents);
        assert_eq!(parsed.title, "f");
    }

    #[test]
    fn loose_parses_title_and_keys() {
        let contents = "# The Portland Drive\n\nCreated By: chris\nTags: review\nLast Edited: August 12, 2020 8:13 PM\n\nFirst paragraph.\n";
        let parsed = parse_title_and_front_matter(contents, "fallback", SourceType::Notion);
        assert_eq!(parsed.title, "The Portland Drive");
        assert_eq!(parsed.front_matter.tags, vec!["review"]);
        assert_eq!(
            parsed.front_matter.extra.get("Created By").unwrap(),
            "chris"
        );
        assert_eq!(
            parsed.front_matter.updated_at.as_deref(),
            Some("2020-08-12T20:13:00.000Z")
        );
        assert_eq!(parsed.body, "First paragraph.");
    }

    #[test]
    fn loose_rejects_prose_that_looks_like_front_matter() {
        let contents = "# A Note\n\nThis is a sentence that happens to contain: a colon\n\nmore body";
        let parsed = parse_title_and_front_matter(contents, "fallback", SourceType::Notion);
        assert!(parsed.front_matter.extra.is_empty());
        assert!(parsed
            .body
            .contains("This is a sentence that happens to contain: a colon"));
    }

    #[test]
    fn loose_supports_dash_borders_too() {
        let contents = "# T\n---\nCategory: Documents\n---\nbody here";
        let parsed = parse_title_and_front_matter(contents, "fallback", SourceType::Notion);
        assert_eq!(
            parsed.front_matter.extra.get("Category").unwrap(),
            "Documents"
        );
        assert_eq!(parsed.body, "body here");
    }

    #[test]
    fn loose_drops_invalid_dates() {
        let contents = "# T\n\ncreatedAt: not a date\nTags: x\n\nbody";
        let parsed = parse_title_and_front_matter(contents, "fallback", SourceType::Notion);
        assert_eq!(parsed.front_matter.created_at, None);
        assert_eq!(parsed.front_matter.tags, vec!["x"]);
    }

    #[test]
    fn loose_without_title_uses_fallback() {
        let contents = "plain body only";
        let parsed = parse_title_and_front_matter(contents, "My Export", SourceType::Notion);
        assert_eq!(parsed.title, "My Export");
        assert_eq!(parsed.body, "plain body only");
    }

    #[test]
    fn tags_coercion_covers_all_shapes() {
        assert!(coerce_tags(None).is_empty());
        assert_eq!(
            coerce_tags(Some(Value::String("a, b ,c".to_string()))),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            coerce_tags(Some(serde_json::json!(["x", "y"]))),
            vec!["x", "y"]
        );
    }

    #[test]
    fn date_candidates_parse() {
        assert_eq!(
            parse_date_best_effort("2024-11-08T14:17:11.337Z").as_deref(),
            Some("2024-11-08T14:17:11.337Z")
        );
        assert_eq!(
            parse_date_best_effort("August 12, 2020 8:13 PM").as_deref(),
            Some("2020-08-12T20:13:00.000Z")
        );
        assert_eq!(
            parse_date_best_effort("2024-01-05").as_deref(),
            Some("2024-01-05T00:00:00.000Z")
        );
        assert_eq!(parse_date_best_effort("yesterday"), None);
    }
}
