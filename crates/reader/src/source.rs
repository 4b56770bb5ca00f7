//! Chapter resolution: offline store first, network second.

use std::sync::Arc;

use dashmap::DashMap;

use vorleser_client::ContentClient;
use vorleser_storage::OfflineStore;
use vorleser_text::count_words;
use vorleser_types::{ChapterId, ChapterKey, ChapterStub, NovelId};

use crate::error::Result;

/// Where a resolved chapter's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOrigin {
    Offline,
    Network,
}

/// A chapter ready for display and narration.
#[derive(Debug, Clone)]
pub struct ResolvedChapter {
    pub novel_id: NovelId,
    pub chapter_id: ChapterId,
    pub title: String,
    pub paragraphs: Vec<String>,
    pub word_count: usize,
    pub origin: ContentOrigin,
}

/// Resolves chapters for reading sessions.
///
/// The offline store is the fast path; anything not downloaded is fetched
/// and normalized. Resolutions are memoized for the life of the source so
/// stepping back and forth between adjacent chapters never refetches.
pub struct ContentSource {
    store: Arc<OfflineStore>,
    client: Arc<dyn ContentClient>,
    cache: DashMap<ChapterKey, Arc<ResolvedChapter>>,
}

impl ContentSource {
    pub fn new(store: Arc<OfflineStore>, client: Arc<dyn ContentClient>) -> Self {
        Self {
            store,
            client,
            cache: DashMap::new(),
        }
    }

    /// Resolve one chapter. Network failures keep the client's typed error
    /// so callers can decide whether a retry makes sense.
    pub async fn resolve(&self, novel: &NovelId, chapter: &ChapterStub) -> Result<Arc<ResolvedChapter>> {
        let key = ChapterKey::new(novel.clone(), chapter.id.clone());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(&hit));
        }

        let resolved = if let Some(stored) = self.store.get(novel, &chapter.id).await {
            tracing::debug!("Chapter {} of {} served from the offline store", chapter.id, novel);
            let word_count = stored.paragraphs.iter().map(|p| count_words(p)).sum();
            Arc::new(ResolvedChapter {
                novel_id: stored.novel_id,
                chapter_id: stored.chapter_id,
                title: stored.chapter_title,
                paragraphs: stored.paragraphs,
                word_count,
                origin: ContentOrigin::Offline,
            })
        } else {
            let fetched = self.client.fetch_chapter(novel, &chapter.id).await?;
            let parsed = vorleser_text::normalize(&fetched.content);
            let title = if fetched.title.is_empty() {
                chapter.title.clone()
            } else {
                fetched.title
            };
            Arc::new(ResolvedChapter {
                novel_id: fetched.novel_id,
                chapter_id: fetched.id,
                title,
                paragraphs: parsed.paragraphs,
                word_count: parsed.word_count,
                origin: ContentOrigin::Network,
            })
        };

        self.cache.insert(key, Arc::clone(&resolved));
        Ok(resolved)
    }
}
