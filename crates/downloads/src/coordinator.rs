//! Queued chapter downloads with a concurrency ceiling.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, Notify};

use vorleser_client::ContentClient;
use vorleser_storage::{DownloadedChapter, OfflineStore};
use vorleser_types::{ChapterKey, ChapterStub, NovelId};

/// How many chapter downloads may run at once. Everything beyond this
/// waits in the queue in enqueue order.
pub const MAX_CONCURRENT_DOWNLOADS: usize = 3;

/// One chapter to download, carrying the novel metadata the stored copy
/// needs.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub novel: NovelId,
    pub novel_title: String,
    pub cover_image: Option<String>,
    pub chapter: ChapterStub,
}

impl DownloadRequest {
    fn key(&self) -> ChapterKey {
        ChapterKey::new(self.novel.clone(), self.chapter.id.clone())
    }
}

/// Runs chapter downloads in the background: fetch, normalize, commit to
/// the offline store.
///
/// At most [`MAX_CONCURRENT_DOWNLOADS`] downloads are in flight at a time.
/// A failed download is logged and dropped; it never blocks the chapters
/// queued behind it, and the chapter can be enqueued again afterwards.
pub struct DownloadCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<OfflineStore>,
    client: Arc<dyn ContentClient>,
    state: Mutex<QueueState>,
    idle: Notify,
}

#[derive(Default)]
struct QueueState {
    queue: VecDeque<DownloadRequest>,
    /// Keys queued or in flight, so a chapter cannot be scheduled twice.
    pending: HashSet<ChapterKey>,
    active: usize,
}

impl DownloadCoordinator {
    pub fn new(store: Arc<OfflineStore>, client: Arc<dyn ContentClient>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                client,
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Queue one chapter. Returns false when the chapter is already
    /// downloaded, queued, or in flight.
    pub async fn enqueue_chapter(&self, request: DownloadRequest) -> bool {
        if self
            .inner
            .store
            .is_downloaded(&request.novel, &request.chapter.id)
            .await
        {
            tracing::debug!(
                "Chapter {} of {} already downloaded, skipping",
                request.chapter.id,
                request.novel
            );
            return false;
        }

        {
            let mut state = self.inner.state.lock().await;
            if !state.pending.insert(request.key()) {
                return false;
            }
            state.queue.push_back(request);
        }
        self.inner.pump().await;
        true
    }

    /// Queue a batch of chapters, typically a whole novel. Returns how many
    /// were actually queued.
    pub async fn enqueue_chapters(
        &self,
        requests: impl IntoIterator<Item = DownloadRequest>,
    ) -> usize {
        let mut queued = 0;
        for request in requests {
            if self.enqueue_chapter(request).await {
                queued += 1;
            }
        }
        queued
    }

    /// Drop every queued chapter. Downloads already in flight run to
    /// completion and their results are kept. Returns the number dropped.
    pub async fn cancel_all(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let dropped: Vec<DownloadRequest> = state.queue.drain(..).collect();
        for request in &dropped {
            state.pending.remove(&request.key());
        }
        if !dropped.is_empty() {
            tracing::info!("Cancelled {} queued downloads", dropped.len());
        }
        dropped.len()
    }

    /// Wait until the queue is empty and no download is in flight. Returns
    /// immediately when the coordinator is already idle.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle().await {
                return;
            }
            notified.await;
        }
    }

    pub async fn is_idle(&self) -> bool {
        let state = self.inner.state.lock().await;
        state.queue.is_empty() && state.active == 0
    }

    pub async fn queue_len(&self) -> usize {
        self.inner.state.lock().await.queue.len()
    }

    pub async fn active_count(&self) -> usize {
        self.inner.state.lock().await.active
    }
}

impl Inner {
    /// Start workers for queued requests until the concurrency ceiling is
    /// reached or the queue runs dry.
    ///
    /// Returns a boxed future: `pump` is awaited (via `finish`) inside the
    /// task it spawns, and boxing breaks the resulting recursive opaque type.
    fn pump<'a>(self: &'a Arc<Self>) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            loop {
                let request = {
                    let mut state = self.state.lock().await;
                    if state.active >= MAX_CONCURRENT_DOWNLOADS {
                        return;
                    }
                    let Some(request) = state.queue.pop_front() else {
                        return;
                    };
                    state.active += 1;
                    request
                };

                let inner = Arc::clone(self);
                tokio::spawn(async move {
                    let key = request.key();
                    inner.download(request).await;
                    inner.finish(key).await;
                });
            }
        })
    }

    async fn download(&self, request: DownloadRequest) {
        let fetched = match self
            .client
            .fetch_chapter(&request.novel, &request.chapter.id)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(
                    "Failed to download chapter {} of {}: {}",
                    request.chapter.id,
                    request.novel,
                    e
                );
                return;
            }
        };

        let parsed = vorleser_text::normalize(&fetched.content);
        let size = fetched.content.len() as u64;
        let chapter_title = if fetched.title.is_empty() {
            request.chapter.title
        } else {
            fetched.title
        };
        let chapter = DownloadedChapter {
            novel_id: request.novel.clone(),
            chapter_id: request.chapter.id.clone(),
            novel_title: request.novel_title,
            chapter_title,
            content: fetched.content,
            paragraphs: parsed.paragraphs,
            downloaded_at: Utc::now(),
            size,
        };

        match self.store.put(chapter, request.cover_image).await {
            Ok(()) => {
                tracing::info!(
                    "Downloaded chapter {} of {} ({} bytes)",
                    request.chapter.id,
                    request.novel,
                    size
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to persist chapter {} of {}: {}",
                    request.chapter.id,
                    request.novel,
                    e
                );
            }
        }
    }

    async fn finish(self: &Arc<Self>, key: ChapterKey) {
        {
            let mut state = self.state.lock().await;
            state.pending.remove(&key);
            state.active -= 1;
        }
        self.pump().await;

        let state = self.state.lock().await;
        if state.queue.is_empty() && state.active == 0 {
            self.idle.notify_waiters();
        }
    }
}
