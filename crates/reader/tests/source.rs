use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use vorleser_client::{
    ChapterNavigation, ClientError, ContentClient, FetchedChapter, NovelInfo, NovelSummary,
};
use vorleser_reader::{ContentOrigin, ContentSource};
use vorleser_storage::{DownloadedChapter, MemoryKv, OfflineStore};
use vorleser_types::{ChapterId, ChapterStub, DownloadLimits, NovelId};

struct CountingClient {
    fetches: AtomicUsize,
    /// How many initial fetches fail before the client recovers.
    fail_first: AtomicUsize,
}

impl CountingClient {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
            fail_first: AtomicUsize::new(0),
        })
    }

    fn failing_once() -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
            fail_first: AtomicUsize::new(1),
        })
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentClient for CountingClient {
    async fn search(&self, _keyword: &str) -> vorleser_client::Result<Vec<NovelSummary>> {
        unimplemented!("not used by the content source")
    }

    async fn fetch_novel_info(&self, _novel: &NovelId) -> vorleser_client::Result<NovelInfo> {
        unimplemented!("not used by the content source")
    }

    async fn fetch_chapter(
        &self,
        novel: &NovelId,
        chapter: &ChapterId,
    ) -> vorleser_client::Result<FetchedChapter> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_first.load(Ordering::SeqCst) > 0 {
            self.fail_first.fetch_sub(1, Ordering::SeqCst);
            return Err(ClientError::Api("server overloaded".into()));
        }
        Ok(FetchedChapter {
            id: chapter.clone(),
            title: format!("Chapter {chapter}"),
            content: "<p>Fetched over the network.</p>".to_string(),
            novel_id: novel.clone(),
            novel_title: "Novel".to_string(),
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

fn stub(id: &str) -> ChapterStub {
    ChapterStub::new(id, format!("Chapter {id}"))
}

#[tokio::test]
async fn downloaded_chapters_skip_the_network() {
    let client = CountingClient::new();
    let store = store().await;
    let content = "<p>Stored offline.</p>".to_string();
    store
        .put(
            DownloadedChapter {
                novel_id: "n".into(),
                chapter_id: "ch-1".into(),
                novel_title: "Novel".to_string(),
                chapter_title: "Chapter ch-1".to_string(),
                size: content.len() as u64,
                content,
                paragraphs: vec!["Stored offline.".to_string()],
                downloaded_at: Utc::now(),
            },
            None,
        )
        .await
        .unwrap();

    let source = ContentSource::new(store, client.clone());
    let chapter = source.resolve(&"n".into(), &stub("ch-1")).await.unwrap();

    assert_eq!(chapter.origin, ContentOrigin::Offline);
    assert_eq!(chapter.paragraphs, vec!["Stored offline."]);
    assert_eq!(chapter.word_count, 2);
    assert_eq!(client.fetches(), 0);
}

#[tokio::test]
async fn network_resolutions_are_memoized() {
    let client = CountingClient::new();
    let source = ContentSource::new(store().await, client.clone());

    let first = source.resolve(&"n".into(), &stub("ch-1")).await.unwrap();
    let second = source.resolve(&"n".into(), &stub("ch-1")).await.unwrap();

    assert_eq!(first.origin, ContentOrigin::Network);
    assert_eq!(first.paragraphs, second.paragraphs);
    assert_eq!(client.fetches(), 1, "the second resolve must hit the cache");
}

#[tokio::test]
async fn failures_are_recoverable_and_not_cached() {
    let client = CountingClient::failing_once();
    let source = ContentSource::new(store().await, client.clone());

    let err = source.resolve(&"n".into(), &stub("ch-1")).await.unwrap_err();
    assert!(err.is_recoverable(), "a fetch failure should invite a retry");

    let chapter = source.resolve(&"n".into(), &stub("ch-1")).await.unwrap();
    assert_eq!(chapter.paragraphs, vec!["Fetched over the network."]);
    assert_eq!(client.fetches(), 2);
}
