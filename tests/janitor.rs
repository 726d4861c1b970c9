mod helpers;

use std::sync::Arc;
use std::time::Duration;

use contavoz::application::ports::ClipStorage;
use contavoz::application::services::TempFileJanitor;

use helpers::{ogg_bytes, FixtureStorage};

#[tokio::test]
async fn given_staged_file_when_cleaning_one_then_removed() {
    let storage = FixtureStorage::new();
    let path = storage.base_dir().join("audio_1_done.ogg");
    tokio::fs::write(&path, ogg_bytes(128)).await.unwrap();

    let janitor = TempFileJanitor::new(storage.clone());
    janitor.cleanup_one(&path).await;

    assert!(!path.exists());
}

#[tokio::test]
async fn given_missing_file_when_cleaning_one_then_silent_success() {
    let storage = FixtureStorage::new();
    let missing = storage.base_dir().join("audio_1_gone.ogg");

    let janitor = TempFileJanitor::new(storage);
    janitor.cleanup_one(&missing).await;
}

#[tokio::test]
async fn given_old_and_fresh_files_when_sweeping_then_only_old_removed() {
    let storage = FixtureStorage::new();
    let old = storage.base_dir().join("audio_1_old.ogg");
    tokio::fs::write(&old, ogg_bytes(128)).await.unwrap();
    let backdated = std::time::SystemTime::now() - Duration::from_secs(2);
    std::fs::File::options()
        .write(true)
        .open(&old)
        .unwrap()
        .set_modified(backdated)
        .unwrap();

    let janitor = TempFileJanitor::with_max_age(storage.clone(), Duration::from_secs(1));
    let fresh = storage.base_dir().join("audio_1_fresh.ogg");
    tokio::fs::write(&fresh, ogg_bytes(128)).await.unwrap();

    let removed = janitor.sweep_all().await.unwrap();

    assert_eq!(removed, 1);
    assert!(!old.exists());
    assert!(fresh.exists());
}

#[tokio::test]
async fn given_foreign_files_when_sweeping_then_untouched() {
    let storage = FixtureStorage::new();
    let foreign = storage.base_dir().join("notes.txt");
    tokio::fs::write(&foreign, b"keep me").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let janitor = TempFileJanitor::with_max_age(storage, Duration::from_millis(1));
    let removed = janitor.sweep_all().await.unwrap();

    assert_eq!(removed, 0);
    assert!(foreign.exists());
}

#[tokio::test]
async fn given_spawned_janitor_when_interval_elapses_then_stale_files_disappear() {
    let storage = FixtureStorage::new();
    let stale = storage.base_dir().join("audio_1_stale.ogg");
    tokio::fs::write(&stale, ogg_bytes(128)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let janitor = Arc::new(TempFileJanitor::with_max_age(
        storage.clone(),
        Duration::from_millis(1),
    ));
    let handle = janitor.spawn(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.abort();

    assert!(!stale.exists());
    assert_eq!(storage.staged_file_count().await.unwrap(), 0);
}
