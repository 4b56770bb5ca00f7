use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use vorleser_client::{
    ChapterNavigation, ClientError, ContentClient, FetchedChapter, NovelInfo, NovelSummary,
};
use vorleser_downloads::{DownloadCoordinator, DownloadRequest, MAX_CONCURRENT_DOWNLOADS};
use vorleser_storage::{MemoryKv, OfflineStore};
use vorleser_types::{ChapterId, ChapterStub, DownloadLimits, NovelId};

/// Content client whose chapter fetches block until the test releases a
/// gate permit, tracking how many run at once.
struct GatedClient {
    gate: Semaphore,
    started: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    /// Chapter ids that fail instead of returning content.
    failing: Vec<ChapterId>,
}

impl GatedClient {
    fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            failing: Vec::new(),
        })
    }

    fn ungated() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
            started: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            failing: Vec::new(),
        })
    }

    fn ungated_failing(ids: &[&str]) -> Arc<Self> {
        let mut client = Self {
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
            started: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            failing: Vec::new(),
        };
        client.failing = ids.iter().map(|id| ChapterId::from(*id)).collect();
        Arc::new(client)
    }

    fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentClient for GatedClient {
    async fn search(&self, _keyword: &str) -> vorleser_client::Result<Vec<NovelSummary>> {
        unimplemented!("not used by the coordinator")
    }

    async fn fetch_novel_info(&self, _novel: &NovelId) -> vorleser_client::Result<NovelInfo> {
        unimplemented!("not used by the coordinator")
    }

    async fn fetch_chapter(
        &self,
        novel: &NovelId,
        chapter: &ChapterId,
    ) -> vorleser_client::Result<FetchedChapter> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let permit = self.gate.acquire().await.unwrap();
        permit.forget();
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(chapter) {
            return Err(ClientError::Api("chapter temporarily unavailable".into()));
        }
        Ok(FetchedChapter {
            id: chapter.clone(),
            title: format!("Chapter {chapter}"),
            content: format!("<p>Text of chapter {chapter} in {novel}.</p>"),
            novel_id: novel.clone(),
            novel_title: format!("Novel {novel}"),
            navigation: ChapterNavigation::default(),
        })
    }
}

async fn store() -> Arc<OfflineStore> {
    let store = OfflineStore::open(Arc::new(MemoryKv::new()), DownloadLimits::default())
        .await
        .unwrap();
    Arc::new(store)
}

fn request(novel: &str, chapter: &str) -> DownloadRequest {
    DownloadRequest {
        novel: novel.into(),
        novel_title: format!("Novel {novel}"),
        cover_image: Some("https://img.example/cover.jpg".to_string()),
        chapter: ChapterStub::new(chapter, format!("Chapter {chapter}")),
    }
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn at_most_three_downloads_run_concurrently() {
    let client = GatedClient::gated();
    let store = store().await;
    let coordinator = DownloadCoordinator::new(store.clone(), client.clone());

    let requests: Vec<DownloadRequest> = (1..=8).map(|i| request("n", &format!("ch-{i}"))).collect();
    assert_eq!(coordinator.enqueue_chapters(requests).await, 8);
    settle().await;

    assert_eq!(client.started(), MAX_CONCURRENT_DOWNLOADS);
    assert_eq!(coordinator.active_count().await, MAX_CONCURRENT_DOWNLOADS);
    assert_eq!(coordinator.queue_len().await, 5);

    client.release(8);
    coordinator.wait_idle().await;

    assert_eq!(client.started(), 8);
    assert_eq!(client.peak(), MAX_CONCURRENT_DOWNLOADS);
    assert_eq!(store.chapter_count().await, 8);
}

#[tokio::test]
async fn already_downloaded_chapters_are_skipped() {
    let client = GatedClient::ungated();
    let store = store().await;
    let coordinator = DownloadCoordinator::new(store.clone(), client.clone());

    assert!(coordinator.enqueue_chapter(request("n", "ch-1")).await);
    coordinator.wait_idle().await;
    assert_eq!(store.chapter_count().await, 1);

    // Second round: ch-1 is already stored, only ch-2 should be fetched.
    assert!(!coordinator.enqueue_chapter(request("n", "ch-1")).await);
    assert!(coordinator.enqueue_chapter(request("n", "ch-2")).await);
    coordinator.wait_idle().await;

    assert_eq!(client.started(), 2);
    assert_eq!(store.chapter_count().await, 2);
}

#[tokio::test]
async fn duplicate_enqueue_while_in_flight_is_dropped() {
    let client = GatedClient::gated();
    let store = store().await;
    let coordinator = DownloadCoordinator::new(store.clone(), client.clone());

    assert!(coordinator.enqueue_chapter(request("n", "ch-1")).await);
    settle().await;
    assert!(
        !coordinator.enqueue_chapter(request("n", "ch-1")).await,
        "an in-flight chapter must not be scheduled twice"
    );

    client.release(1);
    coordinator.wait_idle().await;
    assert_eq!(client.started(), 1);
    assert_eq!(store.chapter_count().await, 1);
}

#[tokio::test]
async fn cancel_drops_queued_but_keeps_in_flight() {
    let client = GatedClient::gated();
    let store = store().await;
    let coordinator = DownloadCoordinator::new(store.clone(), client.clone());

    let requests: Vec<DownloadRequest> = (1..=5).map(|i| request("n", &format!("ch-{i}"))).collect();
    coordinator.enqueue_chapters(requests).await;
    settle().await;
    assert_eq!(coordinator.active_count().await, 3);

    assert_eq!(coordinator.cancel_all().await, 2);
    assert_eq!(coordinator.queue_len().await, 0);

    client.release(3);
    coordinator.wait_idle().await;

    // The three in-flight downloads completed; the cancelled two never ran.
    assert_eq!(client.started(), 3);
    assert_eq!(store.chapter_count().await, 3);

    // A cancelled chapter can be queued again.
    assert!(coordinator.enqueue_chapter(request("n", "ch-4")).await);
    client.release(1);
    coordinator.wait_idle().await;
    assert_eq!(store.chapter_count().await, 4);
}

#[tokio::test]
async fn failed_download_is_dropped_without_blocking_the_queue() {
    let client = GatedClient::ungated_failing(&["ch-2"]);
    let store = store().await;
    let coordinator = DownloadCoordinator::new(store.clone(), client.clone());

    let requests: Vec<DownloadRequest> = (1..=4).map(|i| request("n", &format!("ch-{i}"))).collect();
    coordinator.enqueue_chapters(requests).await;
    coordinator.wait_idle().await;

    assert_eq!(client.started(), 4);
    assert_eq!(store.chapter_count().await, 3);
    assert!(!store.is_downloaded(&"n".into(), &"ch-2".into()).await);

    // The failure released its slot, so the chapter can be retried.
    assert!(coordinator.enqueue_chapter(request("n", "ch-2")).await);
}

#[tokio::test]
async fn downloads_store_normalized_paragraphs() {
    let client = GatedClient::ungated();
    let store = store().await;
    let coordinator = DownloadCoordinator::new(store.clone(), client.clone());

    coordinator.enqueue_chapter(request("lotm", "ch-1")).await;
    coordinator.wait_idle().await;

    let chapter = store.get(&"lotm".into(), &"ch-1".into()).await.unwrap();
    assert_eq!(chapter.chapter_title, "Chapter ch-1");
    assert_eq!(chapter.paragraphs, vec!["Text of chapter ch-1 in lotm."]);
    assert_eq!(chapter.size, chapter.content.len() as u64);

    let novel = store.novel(&"lotm".into()).await.unwrap();
    assert_eq!(novel.cover_image.as_deref(), Some("https://img.example/cover.jpg"));
}
