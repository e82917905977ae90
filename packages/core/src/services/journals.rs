//! Journal Name Inference
//!
//! Imported notes live in folders that may be nested, carry export-unique
//! id suffixes, and collide or fail validation as journal names. This
//! module turns a source folder (or a category front-matter hint) into a
//! valid, unique journal name, caching the result per source folder so
//! every note from one folder lands in the same journal.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::utils::note_id;

/// Maximum length of a journal name.
pub const MAX_JOURNAL_NAME_LENGTH: usize = 25;

/// Names reserved for Quill's own directories.
const RESERVED_JOURNAL_NAMES: [&str; 1] = ["_attachments"];

/// Export ids appended to file and folder names: a hex run that is long
/// enough and contains a digit, so ordinary words are left alone.
static EXPORT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{6,}$").expect("export id regex"));

/// Validate a journal name: non-empty, bounded length, no path separators,
/// no hidden/reserved prefixes.
pub fn validate_journal_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Journal name cannot be empty".to_string());
    }
    if trimmed.len() > MAX_JOURNAL_NAME_LENGTH {
        return Err(format!(
            "Journal name exceeds {} characters",
            MAX_JOURNAL_NAME_LENGTH
        ));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err("Journal name cannot contain path separators".to_string());
    }
    if trimmed.starts_with('.') || trimmed.starts_with('_') {
        return Err("Journal name cannot start with '.' or '_'".to_string());
    }
    if RESERVED_JOURNAL_NAMES.contains(&trimmed) {
        return Err(format!("Journal name '{}' is reserved", trimmed));
    }
    Ok(())
}

/// Strip an export-style unique id suffix from a file or folder name.
///
/// Exports name entries `Title <id>`, e.g. `My Note f35b7cabdf98421d` or
/// `Documents_abc123`. Returns the cleaned name and the id when present.
pub fn strip_export_id(name: &str) -> (String, Option<String>) {
    let separator = name.rfind(|c| c == ' ' || c == '_');
    if let Some(index) = separator {
        if index > 0 {
            let suffix = &name[index + 1..];
            if EXPORT_ID_RE.is_match(suffix) && suffix.chars().any(|c| c.is_ascii_digit()) {
                return (
                    name[..index].trim().to_string(),
                    Some(suffix.trim().to_string()),
                );
            }
        }
    }
    (name.trim().to_string(), None)
}

/// Infer or generate a journal name for a note's source folder.
///
/// Preference order: a valid category hint from front matter; the folder
/// path relative to the import root with export ids stripped from each
/// segment and segments joined by `_`; the truncated last segment; a
/// generated unused name. Results are cached per relative folder path, and
/// a name already assigned to a different folder is treated as a failure so
/// journals stay distinct.
pub fn infer_or_generate_journal_name(
    folder_path: &Path,
    import_dir: &Path,
    cache: &mut HashMap<String, String>,
    category: Option<&str>,
) -> String {
    if let Some(category) = category {
        match validate_journal_name(category) {
            Ok(()) => return category.trim().to_string(),
            Err(reason) => {
                tracing::warn!(
                    "Unable to use category '{}' as journal name: {}",
                    category,
                    reason
                );
            }
        }
    }

    let relative = folder_path
        .strip_prefix(import_dir)
        .unwrap_or(folder_path)
        .to_string_lossy()
        .to_string();

    if let Some(existing) = cache.get(&relative) {
        return existing.clone();
    }

    let name_parts: Vec<String> = if relative.is_empty() {
        vec![import_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()]
    } else {
        Path::new(&relative)
            .components()
            .map(|part| strip_export_id(&part.as_os_str().to_string_lossy()).0)
            .collect()
    };

    let mut journal_name = name_parts.join("_");

    let valid = match validate_journal_name(&journal_name) {
        Ok(()) => true,
        Err(_) => {
            // retry with only the last path segment, truncated
            journal_name = name_parts
                .last()
                .map(|part| truncate(part, MAX_JOURNAL_NAME_LENGTH))
                .unwrap_or_default();
            validate_journal_name(&journal_name).is_ok()
        }
    };

    let unique = !cache.values().any(|existing| existing == &journal_name);
    if !valid || !unique {
        // generate an unused name; the user can rename the journal later
        let generated = note_id();
        tracing::warn!(
            "Cannot use '{}' as journal name (valid: {}, unique: {}); generated '{}'",
            name_parts.join("/"),
            valid,
            unique,
            generated
        );
        journal_name = generated;
    }

    cache.insert(relative, journal_name.clone());
    journal_name
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn validation_rejects_bad_names() {
        assert!(validate_journal_name("work").is_ok());
        assert!(validate_journal_name("").is_err());
        assert!(validate_journal_name("   ").is_err());
        assert!(validate_journal_name("_attachments").is_err());
        assert!(validate_journal_name(".hidden").is_err());
        assert!(validate_journal_name("a/b").is_err());
        assert!(validate_journal_name(&"x".repeat(26)).is_err());
    }

    #[test]
    fn export_ids_are_stripped() {
        let (name, id) = strip_export_id("My Note f35b7cabdf98421d94a27722f0fbdeb8");
        assert_eq!(name, "My Note");
        assert_eq!(id.as_deref(), Some("f35b7cabdf98421d94a27722f0fbdeb8"));

        let (name, id) = strip_export_id("Documents_abc123");
        assert_eq!(name, "Documents");
        assert_eq!(id.as_deref(), Some("abc123"));

        // short or non-hex suffixes are left alone
        assert_eq!(strip_export_id("week_1").0, "week_1");
        assert_eq!(strip_export_id("my notes").0, "my notes");
    }

    #[test]
    fn category_wins_when_valid() {
        let mut cache = HashMap::new();
        let name = infer_or_generate_journal_name(
            &PathBuf::from("/import/folder"),
            &PathBuf::from("/import"),
            &mut cache,
            Some("recipes"),
        );
        assert_eq!(name, "recipes");
    }

    #[test]
    fn folder_suffix_is_stripped() {
        let mut cache = HashMap::new();
        let name = infer_or_generate_journal_name(
            &PathBuf::from("/import/Documents_abc123"),
            &PathBuf::from("/import"),
            &mut cache,
            None,
        );
        assert_eq!(name, "Documents");
    }

    #[test]
    fn nested_folders_join_with_underscore() {
        let mut cache = HashMap::new();
        let name = infer_or_generate_journal_name(
            &PathBuf::from("/import/Docs abc123456/Trips def456789"),
            &PathBuf::from("/import"),
            &mut cache,
            None,
        );
        assert_eq!(name, "Docs_Trips");
    }

    #[test]
    fn colliding_stripped_names_generate_distinct_fallbacks() {
        let mut cache = HashMap::new();
        let import = PathBuf::from("/import");
        let first = infer_or_generate_journal_name(
            &PathBuf::from("/import/Documents_abc123"),
            &import,
            &mut cache,
            None,
        );
        let second = infer_or_generate_journal_name(
            &PathBuf::from("/import/Documents_def456"),
            &import,
            &mut cache,
            None,
        );
        assert_eq!(first, "Documents");
        assert_ne!(second, "Documents");
        assert_ne!(first, second);
    }

    #[test]
    fn same_folder_reuses_cached_name() {
        let mut cache = HashMap::new();
        let import = PathBuf::from("/import");
        let folder = PathBuf::from("/import/Journal_abc123");
        let first = infer_or_generate_journal_name(&folder, &import, &mut cache, None);
        let second = infer_or_generate_journal_name(&folder, &import, &mut cache, None);
        assert_eq!(first, second);
    }

    #[test]
    fn notes_in_import_root_use_directory_name() {
        let mut cache = HashMap::new();
        let name = infer_or_generate_journal_name(
            &PathBuf::from("/home/user/export"),
            &PathBuf::from("/home/user/export"),
            &mut cache,
            None,
        );
        assert_eq!(name, "export");
    }

    #[test]
    fn invalid_and_long_names_fall_back_to_generated() {
        let mut cache = HashMap::new();
        let name = infer_or_generate_journal_name(
            &PathBuf::from("/import/_private"),
            &PathBuf::from("/import"),
            &mut cache,
            None,
        );
        // '_private' fails validation twice over; a generated name is used
        assert_ne!(name, "_private");
        assert!(!name.is_empty());
    }
}
