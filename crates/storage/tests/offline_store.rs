//! Offline store semantics: idempotent puts, removal, and persistence
//! across reopen.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use vorleser_storage::{DownloadedChapter, FilesystemKv, MemoryKv, OfflineStore};
use vorleser_types::DownloadLimits;

fn chapter_at(novel: &str, id: &str, size: u64, minutes_ago: i64) -> DownloadedChapter {
    DownloadedChapter {
        novel_id: novel.into(),
        chapter_id: id.into(),
        novel_title: format!("Novel {novel}"),
        chapter_title: format!("Chapter {id}"),
        content: "x".repeat(size as usize),
        paragraphs: vec!["x".repeat(size as usize)],
        downloaded_at: Utc::now() - Duration::minutes(minutes_ago),
        size,
    }
}

#[tokio::test]
async fn put_then_get_roundtrip() {
    let store = OfflineStore::open(Arc::new(MemoryKv::new()), DownloadLimits::default())
        .await
        .unwrap();

    store
        .put(chapter_at("lotm", "ch-1", 64, 0), Some("cover.jpg".to_string()))
        .await
        .unwrap();

    assert!(store.is_downloaded(&"lotm".into(), &"ch-1".into()).await);
    let stored = store.get(&"lotm".into(), &"ch-1".into()).await.unwrap();
    assert_eq!(stored.chapter_title, "Chapter ch-1");
    assert_eq!(stored.size, 64);

    let novel = store.novel(&"lotm".into()).await.unwrap();
    assert_eq!(novel.cover_image.as_deref(), Some("cover.jpg"));
    assert_eq!(novel.total_size, 64);
}

#[tokio::test]
async fn put_is_idempotent() {
    let store = OfflineStore::open(Arc::new(MemoryKv::new()), DownloadLimits::default())
        .await
        .unwrap();

    store.put(chapter_at("n", "1", 100, 5), None).await.unwrap();

    // Second insert of the same chapter, even with different content, must
    // neither overwrite nor double-count.
    let mut replay = chapter_at("n", "1", 900, 0);
    replay.chapter_title = "Replayed".to_string();
    store.put(replay, None).await.unwrap();

    assert_eq!(store.chapter_count().await, 1);
    assert_eq!(store.total_size().await, 100);
    let stored = store.get(&"n".into(), &"1".into()).await.unwrap();
    assert_eq!(stored.chapter_title, "Chapter 1");
}

#[tokio::test]
async fn removing_last_chapter_drops_novel() {
    let store = OfflineStore::open(Arc::new(MemoryKv::new()), DownloadLimits::default())
        .await
        .unwrap();

    store.put(chapter_at("n", "1", 10, 2), None).await.unwrap();
    store.put(chapter_at("n", "2", 10, 1), None).await.unwrap();

    store.remove(&"n".into(), &"1".into()).await.unwrap();
    assert_eq!(store.chapter_count().await, 1);
    assert!(store.novel(&"n".into()).await.is_some());

    store.remove(&"n".into(), &"2".into()).await.unwrap();
    assert!(store.novel(&"n".into()).await.is_none());
    assert_eq!(store.total_size().await, 0);

    // Removing something absent stays a no-op.
    store.remove(&"n".into(), &"2".into()).await.unwrap();
}

#[tokio::test]
async fn remove_novel_and_clear() {
    let store = OfflineStore::open(Arc::new(MemoryKv::new()), DownloadLimits::default())
        .await
        .unwrap();

    store.put(chapter_at("a", "1", 10, 3), None).await.unwrap();
    store.put(chapter_at("a", "2", 10, 2), None).await.unwrap();
    store.put(chapter_at("b", "1", 10, 1), None).await.unwrap();

    store.remove_novel(&"a".into()).await.unwrap();
    assert_eq!(store.chapter_count().await, 1);
    assert_eq!(store.total_size().await, 10);

    store.clear().await.unwrap();
    assert_eq!(store.chapter_count().await, 0);
    assert!(store.summaries().await.is_empty());
}

#[tokio::test]
async fn library_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let kv = Arc::new(FilesystemKv::new(temp_dir.path()));
        let store = OfflineStore::open(kv, DownloadLimits::default()).await.unwrap();
        store.put(chapter_at("n", "1", 42, 1), None).await.unwrap();
        store.put(chapter_at("n", "2", 8, 0), None).await.unwrap();
    }

    let kv = Arc::new(FilesystemKv::new(temp_dir.path()));
    let store = OfflineStore::open(kv, DownloadLimits::default()).await.unwrap();

    assert!(store.is_downloaded(&"n".into(), &"1".into()).await);
    assert_eq!(store.chapter_count().await, 2);
    assert_eq!(store.total_size().await, 50);
    let stored = store.get(&"n".into(), &"1".into()).await.unwrap();
    assert_eq!(stored.content.len(), 42);
}

#[tokio::test]
async fn corrupt_library_document_starts_empty() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("vorleser.library.json"),
        "{not valid json",
    )
    .unwrap();

    let kv = Arc::new(FilesystemKv::new(temp_dir.path()));
    let store = OfflineStore::open(kv, DownloadLimits::default()).await.unwrap();
    assert_eq!(store.chapter_count().await, 0);

    // The store stays usable and overwrites the bad document.
    store.put(chapter_at("n", "1", 5, 0), None).await.unwrap();
    assert_eq!(store.chapter_count().await, 1);
}
