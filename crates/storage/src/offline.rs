//! Offline chapter store with global storage ceilings.

use std::sync::Arc;

use tokio::sync::Mutex;

use vorleser_types::{ChapterId, DownloadLimits, NovelId};

use crate::error::{Result, StorageError};
use crate::kv::KeyValueStore;
use crate::models::{DownloadedChapter, DownloadedNovel, Library, StoredNovelSummary};

/// Key the whole library document is persisted under.
const LIBRARY_KEY: &str = "vorleser.library";

/// Persistent store of downloaded chapters, bounded by a chapter-count and
/// a byte-size ceiling that hold globally across novels.
///
/// All mutating operations serialize through one lock, so an insertion and
/// its eviction sweep execute atomically with respect to concurrent
/// downloads, and the document is durable in the backing [`KeyValueStore`]
/// before the operation returns.
pub struct OfflineStore {
    kv: Arc<dyn KeyValueStore>,
    state: Mutex<StoreState>,
}

struct StoreState {
    library: Library,
    limits: DownloadLimits,
}

impl OfflineStore {
    /// Open the store, restoring any previously persisted library.
    ///
    /// A document that no longer parses is logged and replaced with an
    /// empty library rather than failing the open.
    pub async fn open(kv: Arc<dyn KeyValueStore>, limits: DownloadLimits) -> Result<Self> {
        let library = match kv.get(LIBRARY_KEY).await? {
            Some(json) => match serde_json::from_str::<Library>(&json) {
                Ok(library) => {
                    tracing::info!(
                        "Restored offline library: {} novels, {} chapters",
                        library.novels.len(),
                        library.chapter_count()
                    );
                    library
                }
                Err(e) => {
                    tracing::error!("Discarding corrupt offline library document: {}", e);
                    Library::default()
                }
            },
            None => Library::default(),
        };

        Ok(Self {
            kv,
            state: Mutex::new(StoreState { library, limits }),
        })
    }

    pub async fn is_downloaded(&self, novel: &NovelId, chapter: &ChapterId) -> bool {
        self.state.lock().await.library.contains(novel, chapter)
    }

    pub async fn get(&self, novel: &NovelId, chapter: &ChapterId) -> Option<DownloadedChapter> {
        self.state.lock().await.library.chapter(novel, chapter).cloned()
    }

    /// Insert a downloaded chapter and enforce the store ceilings.
    ///
    /// Idempotent: a chapter that is already present is left untouched and
    /// never double-counted. The just-inserted chapter takes part in the
    /// eviction sweep like any other, so a chapter bigger than the whole
    /// storage ceiling is stored and immediately evicted again.
    pub async fn put(&self, chapter: DownloadedChapter, cover_image: Option<String>) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.library.insert(chapter, cover_image) {
            return Ok(());
        }
        enforce_limits(&mut state);
        self.persist(&state.library).await
    }

    /// Remove one chapter. Removing an absent chapter is a no-op.
    pub async fn remove(&self, novel: &NovelId, chapter: &ChapterId) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.library.remove(novel, chapter).is_none() {
            return Ok(());
        }
        self.persist(&state.library).await
    }

    /// Remove a novel and all its chapters.
    pub async fn remove_novel(&self, novel: &NovelId) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.library.remove_novel(novel).is_none() {
            return Ok(());
        }
        self.persist(&state.library).await
    }

    /// Drop every downloaded chapter.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.library = Library::default();
        self.persist(&state.library).await
    }

    pub async fn total_size(&self) -> u64 {
        self.state.lock().await.library.total_size()
    }

    pub async fn chapter_count(&self) -> usize {
        self.state.lock().await.library.chapter_count()
    }

    pub async fn novel(&self, id: &NovelId) -> Option<DownloadedNovel> {
        self.state.lock().await.library.novel(id).cloned()
    }

    pub async fn summaries(&self) -> Vec<StoredNovelSummary> {
        let state = self.state.lock().await;
        state
            .library
            .novels
            .iter()
            .map(|n| StoredNovelSummary {
                novel_id: n.novel_id.clone(),
                novel_title: n.novel_title.clone(),
                cover_image: n.cover_image.clone(),
                chapter_count: n.chapters.len(),
                total_size: n.total_size,
                downloaded_at: n.downloaded_at,
            })
            .collect()
    }

    pub async fn limits(&self) -> DownloadLimits {
        self.state.lock().await.limits
    }

    /// Replace the store ceilings and re-enforce them immediately.
    pub async fn set_limits(&self, limits: DownloadLimits) -> Result<()> {
        let mut state = self.state.lock().await;
        state.limits = limits;
        if enforce_limits(&mut state) == 0 {
            return Ok(());
        }
        self.persist(&state.library).await
    }

    async fn persist(&self, library: &Library) -> Result<()> {
        let json = serde_json::to_string(library).map_err(|e| StorageError::OperationFailed {
            operation: "serialize offline library".to_string(),
            source: Some(eyre::eyre!(e)),
        })?;
        self.kv.set(LIBRARY_KEY, &json).await
    }
}

/// Evict oldest chapters until both ceilings hold or the library is empty.
/// Returns the number of chapters evicted.
fn enforce_limits(state: &mut StoreState) -> usize {
    let max_bytes = state.limits.max_storage_bytes();
    let max_chapters = state.limits.max_chapters;
    let mut evicted = 0;

    while state.library.chapter_count() > max_chapters
        || state.library.total_size() > max_bytes
    {
        let Some((_, key)) = state.library.oldest_chapter() else {
            break;
        };
        if state.library.remove(&key.novel, &key.chapter).is_some() {
            tracing::info!(
                "Evicted chapter {} of {} to stay within offline limits",
                key.chapter,
                key.novel
            );
            evicted += 1;
        }
    }
    evicted
}
