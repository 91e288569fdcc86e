//! Integration tests for the raw per-kind event channels.
//!
//! These exercise the real OS notification facility against a tempdir, so
//! every wait is bounded by a timeout.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::time::timeout;

use dropwatch::{RawEvent, RawWatcher, WatchError, WatchTarget};

const EVENT_WAIT: Duration = Duration::from_secs(5);
const QUIET_WAIT: Duration = Duration::from_millis(400);

async fn next_event(rx: &mut broadcast::Receiver<RawEvent>) -> RawEvent {
    timeout(EVENT_WAIT, rx.recv())
        .await
        .expect("timed out waiting for raw event")
        .expect("raw channel closed")
}

fn watch_all(dir: &TempDir) -> RawWatcher {
    RawWatcher::new(WatchTarget::matching_all(dir.path())).unwrap()
}

#[tokio::test]
async fn create_file_streams_created() {
    let dir = TempDir::new().unwrap();
    let mut watcher = watch_all(&dir);
    let mut created = watcher.created();
    watcher.start().unwrap();

    let file = dir.path().join("Created.Txt");
    fs::write(&file, "foo").unwrap();

    let event = next_event(&mut created).await;
    assert_eq!(event.name(), "Created.Txt");
    assert_eq!(event.full_path(), file);
}

#[tokio::test]
async fn write_to_existing_file_streams_changed() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("Changed.Txt");
    fs::write(&file, "foo").unwrap();

    let mut watcher = watch_all(&dir);
    let mut changed = watcher.changed();
    watcher.start().unwrap();

    fs::write(&file, "bar").unwrap();

    let event = next_event(&mut changed).await;
    assert_eq!(event.name(), "Changed.Txt");
    assert_eq!(event.full_path(), file);
}

#[tokio::test]
async fn delete_file_streams_deleted() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("ToDelete.Txt");
    fs::write(&file, "foo").unwrap();

    let mut watcher = watch_all(&dir);
    let mut deleted = watcher.deleted();
    watcher.start().unwrap();

    fs::remove_file(&file).unwrap();

    let event = next_event(&mut deleted).await;
    assert_eq!(event.name(), "ToDelete.Txt");
    assert_eq!(event.full_path(), file);
}

#[tokio::test]
async fn rename_file_streams_renamed_with_old_path() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("Original.Txt");
    fs::write(&original, "foo").unwrap();

    let mut watcher = watch_all(&dir);
    let mut renamed = watcher.renamed();
    watcher.start().unwrap();

    let destination = dir.path().join("Renamed.Txt");
    fs::rename(&original, &destination).unwrap();

    let event = next_event(&mut renamed).await;
    match event {
        RawEvent::Renamed {
            name,
            full_path,
            old_full_path,
        } => {
            assert_eq!(name, "Renamed.Txt");
            assert_eq!(full_path, destination);
            assert_eq!(old_full_path, Some(original));
        }
        other => panic!("expected Renamed, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_watched_directory_streams_error() {
    let root = TempDir::new().unwrap();
    let watched = root.path().join("watched");
    fs::create_dir(&watched).unwrap();

    let mut watcher = RawWatcher::new(WatchTarget::matching_all(&watched)).unwrap();
    let mut errors = watcher.errors();
    let mut deleted = watcher.deleted();
    watcher.start().unwrap();

    fs::remove_dir(&watched).unwrap();

    let error = timeout(EVENT_WAIT, errors.recv())
        .await
        .expect("timed out waiting for watch error")
        .expect("error channel closed");
    assert!(matches!(error, WatchError::EventError { .. }));

    // The directory's own removal must not leak onto the deleted channel.
    assert!(timeout(QUIET_WAIT, deleted.recv()).await.is_err());
}

#[tokio::test]
async fn stop_before_start_is_safe() {
    let dir = TempDir::new().unwrap();
    let mut watcher = watch_all(&dir);
    watcher.stop().unwrap();
    watcher.start().unwrap();
    watcher.stop().unwrap();
}

#[tokio::test]
async fn stopped_watcher_emits_nothing() {
    let dir = TempDir::new().unwrap();
    let mut watcher = watch_all(&dir);
    let mut created = watcher.created();
    watcher.start().unwrap();
    watcher.stop().unwrap();

    fs::write(dir.path().join("late.txt"), "foo").unwrap();

    assert!(timeout(QUIET_WAIT, created.recv()).await.is_err());
}

#[tokio::test]
async fn start_after_dispose_fails() {
    let dir = TempDir::new().unwrap();
    let mut watcher = watch_all(&dir);
    watcher.start().unwrap();
    watcher.dispose();

    assert_eq!(watcher.start().unwrap_err(), WatchError::Disposed);
}

#[tokio::test]
async fn watching_missing_directory_fails_on_start() {
    let dir = TempDir::new().unwrap();
    let missing: PathBuf = dir.path().join("does-not-exist");

    let mut watcher = RawWatcher::new(WatchTarget::matching_all(missing)).unwrap();
    assert!(matches!(
        watcher.start().unwrap_err(),
        WatchError::PathWatchFailed { .. }
    ));
}
