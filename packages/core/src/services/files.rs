//! File Store Interface
//!
//! Filesystem access consumed by the stager and file mover: a depth-bounded
//! directory walk plus the handful of file operations the pipeline needs.
//! `FsFileStore` is the real implementation; tests may substitute their own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file yielded by the directory walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// Predicate deciding whether the walk descends into a directory.
pub type DescendFilter<'a> = &'a (dyn Fn(&Path) -> bool + Send + Sync);

/// Filesystem operations consumed by the import pipeline.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn ensure_dir(&self, path: &Path) -> anyhow::Result<()>;

    async fn copy_file(&self, src: &Path, dst: &Path) -> anyhow::Result<()>;

    async fn read_to_string(&self, path: &Path) -> anyhow::Result<String>;

    /// Whether the path exists and can be opened for reading.
    async fn is_readable(&self, path: &Path) -> bool;

    /// Depth-first walk yielding files only. `descend` prunes directories;
    /// pruned subtrees are never visited.
    fn walk(
        &self,
        root: &Path,
        max_depth: usize,
        descend: DescendFilter<'_>,
    ) -> anyhow::Result<Vec<WalkEntry>>;
}

/// [`FileStore`] backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsFileStore;

impl FsFileStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileStore for FsFileStore {
    async fn ensure_dir(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn copy_file(&self, src: &Path, dst: &Path) -> anyhow::Result<()> {
        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(src, dst).await?;
        Ok(())
    }

    async fn read_to_string(&self, path: &Path) -> anyhow::Result<String> {
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn is_readable(&self, path: &Path) -> bool {
        tokio::fs::File::open(path).await.is_ok()
    }

    fn walk(
        &self,
        root: &Path,
        max_depth: usize,
        descend: DescendFilter<'_>,
    ) -> anyhow::Result<Vec<WalkEntry>> {
        let mut entries = Vec::new();
        let walker = WalkDir::new(root)
            .max_depth(max_depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_type().is_dir() || descend(entry.path())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry during walk: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let (created, modified) = match entry.metadata() {
                Ok(meta) => (
                    meta.created().ok().map(DateTime::<Utc>::from),
                    meta.modified().ok().map(DateTime::<Utc>::from),
                ),
                Err(_) => (None, None),
            };
            entries.push(WalkEntry {
                path: entry.into_path(),
                created,
                modified,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn walk_yields_files_and_prunes_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("keep")).unwrap();
        std::fs::create_dir(dir.path().join("skip")).unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("keep/b.md"), "b").unwrap();
        std::fs::write(dir.path().join("skip/c.md"), "c").unwrap();

        let store = FsFileStore::new();
        let filter: DescendFilter<'_> =
            &|path: &Path| path.file_name().map_or(true, |n| n.to_string_lossy() != "skip");
        let mut names: Vec<String> = store
            .walk(dir.path(), 10, filter)
            .unwrap()
            .into_iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[tokio::test]
    async fn copy_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.txt");
        std::fs::write(&src, "data").unwrap();
        let dst = dir.path().join("nested/deep/dst.txt");

        let store = FsFileStore::new();
        store.copy_file(&src, &dst).await.unwrap();
        assert_eq!(std::fs::read_to_string(dst).unwrap(), "data");
    }

    #[tokio::test]
    async fn readable_reports_missing_files() {
        let dir = TempDir::new().unwrap();
        let store = FsFileStore::new();
        assert!(!store.is_readable(&dir.path().join("missing")).await);
        let present = dir.path().join("present.txt");
        std::fs::write(&present, "x").unwrap();
        assert!(store.is_readable(&present).await);
    }
}
