//! Integration tests for the libsql staging store
//!
//! Tests cover:
//! - insert-or-skip idempotency for notes and files
//! - status transitions and error counting
//! - orphan marking
//! - run lifecycle and clear-incomplete

use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;

use quill_core::db::{DatabaseService, StagingStore, TursoStagingStore};
use quill_core::models::{FileStatus, ImportRun, NoteStatus, RunStatus, StagedFile, StagedNote};
use quill_core::utils::{attachment_id, note_id};

async fn create_store() -> Result<(Arc<TursoStagingStore>, TempDir)> {
    let dir = TempDir::new()?;
    let db = DatabaseService::new(dir.path().join("staging.db")).await?;
    Ok((Arc::new(TursoStagingStore::new(db)), dir))
}

fn note(importer_id: &str, source_path: &str) -> StagedNote {
    let quill_id = note_id();
    StagedNote {
        importer_id: importer_id.to_string(),
        source_path: source_path.to_string(),
        source_id: None,
        journal: "journal".to_string(),
        content: "body".to_string(),
        front_matter: r#"{"title":"t","tags":[]}"#.to_string(),
        quill_path: format!("journal/{}.md", quill_id),
        quill_id,
        status: NoteStatus::Pending,
        error: None,
    }
}

fn file(importer_id: &str, source_path: &str, filename: &str) -> StagedFile {
    StagedFile {
        quill_id: attachment_id(),
        importer_id: importer_id.to_string(),
        source_path_resolved: source_path.to_string(),
        filename: filename.to_string(),
        extension: ".png".to_string(),
        status: FileStatus::Pending,
        error: None,
    }
}

#[tokio::test]
async fn staging_notes_twice_is_a_skip() -> Result<()> {
    let (store, _dir) = create_store().await?;

    let first = note("imp", "/import/a.md");
    assert!(store.insert_note(&first).await?);

    // same key, different payload: the original row wins
    let duplicate = note("imp", "/import/a.md");
    assert!(!store.insert_note(&duplicate).await?);

    let rows = store.notes_for_importer("imp").await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quill_id, first.quill_id);
    Ok(())
}

#[tokio::test]
async fn staging_files_is_idempotent_on_resolved_path() -> Result<()> {
    let (store, _dir) = create_store().await?;

    assert!(store.insert_file(&file("imp", "/import/a.png", "a")).await?);
    // a second row for the same resolved path is ignored even though its
    // primary key differs
    assert!(!store.insert_file(&file("imp", "/import/a.png", "a")).await?);

    assert_eq!(store.files_for_importer("imp").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn note_status_updates_and_error_counts() -> Result<()> {
    let (store, _dir) = create_store().await?;
    let good = note("imp", "/import/good.md");
    let bad = note("imp", "/import/bad.md");
    store.insert_note(&good).await?;
    store.insert_note(&bad).await?;

    store
        .set_note_status("imp", &good.source_path, NoteStatus::NoteCreated, None)
        .await?;
    store
        .set_note_status(
            "imp",
            &bad.source_path,
            NoteStatus::ProcessingError,
            Some("kaboom"),
        )
        .await?;

    assert_eq!(store.count_note_errors("imp").await?, 1);
    let rows = store.notes_for_importer("imp").await?;
    let bad_row = rows
        .iter()
        .find(|n| n.source_path == bad.source_path)
        .unwrap();
    assert_eq!(bad_row.status, NoteStatus::ProcessingError);
    assert_eq!(bad_row.error.as_deref(), Some("kaboom"));
    Ok(())
}

#[tokio::test]
async fn referenced_files_survive_orphan_marking() -> Result<()> {
    let (store, _dir) = create_store().await?;
    let used = file("imp", "/import/used.png", "used");
    let unused = file("imp", "/import/unused.png", "unused");
    store.insert_file(&used).await?;
    store.insert_file(&unused).await?;

    store.mark_file_referenced(&used.quill_id).await?;
    let orphaned = store.mark_pending_files_orphaned("imp").await?;
    assert_eq!(orphaned, 1);

    let referenced = store.files_by_status("imp", FileStatus::Referenced).await?;
    assert_eq!(referenced.len(), 1);
    assert_eq!(referenced[0].quill_id, used.quill_id);

    let orphans = store.files_by_status("imp", FileStatus::Orphaned).await?;
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].quill_id, unused.quill_id);
    Ok(())
}

#[tokio::test]
async fn completed_files_are_not_re_marked() -> Result<()> {
    let (store, _dir) = create_store().await?;
    let staged = file("imp", "/import/a.png", "a");
    store.insert_file(&staged).await?;
    store.mark_file_referenced(&staged.quill_id).await?;
    store
        .set_file_status(&staged.quill_id, FileStatus::Complete, None)
        .await?;

    // a later reference mark must not demote a completed file
    store.mark_file_referenced(&staged.quill_id).await?;
    let complete = store.files_by_status("imp", FileStatus::Complete).await?;
    assert_eq!(complete.len(), 1);
    Ok(())
}

#[tokio::test]
async fn run_lifecycle_and_lookup() -> Result<()> {
    let (store, _dir) = create_store().await?;

    let older = ImportRun {
        id: note_id(),
        status: RunStatus::Pending,
        import_dir: "/import/one".to_string(),
    };
    let newer = ImportRun {
        id: note_id(),
        status: RunStatus::Pending,
        import_dir: "/import/two".to_string(),
    };
    store.insert_run(&older).await?;
    store.insert_run(&newer).await?;

    // ids are time-ordered, so the newest pending run wins
    let pending = store.latest_pending_run().await?.unwrap();
    assert_eq!(pending.id, newer.id);

    store.complete_run(&newer.id).await?;
    let pending = store.latest_pending_run().await?.unwrap();
    assert_eq!(pending.id, older.id);

    store.complete_run(&older.id).await?;
    assert!(store.latest_pending_run().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn clear_incomplete_keeps_finished_work() -> Result<()> {
    let (store, _dir) = create_store().await?;

    let run = ImportRun {
        id: note_id(),
        status: RunStatus::Pending,
        import_dir: "/import".to_string(),
    };
    store.insert_run(&run).await?;

    let created = note("imp", "/import/done.md");
    let pending = note("imp", "/import/pending.md");
    store.insert_note(&created).await?;
    store.insert_note(&pending).await?;
    store
        .set_note_status("imp", &created.source_path, NoteStatus::NoteCreated, None)
        .await?;

    let moved = file("imp", "/import/moved.png", "moved");
    let waiting = file("imp", "/import/waiting.png", "waiting");
    store.insert_file(&moved).await?;
    store.insert_file(&waiting).await?;
    store
        .set_file_status(&moved.quill_id, FileStatus::Complete, None)
        .await?;

    store.clear_incomplete().await?;

    let notes = store.notes_for_importer("imp").await?;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].status, NoteStatus::NoteCreated);

    let files = store.files_for_importer("imp").await?;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].status, FileStatus::Complete);

    assert!(store.latest_pending_run().await?.is_none());
    Ok(())
}
