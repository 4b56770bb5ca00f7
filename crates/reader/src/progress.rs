//! Reading positions, history and bookmarks.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use vorleser_storage::KeyValueStore;
use vorleser_types::{Bookmark, BookmarkColor, ChapterId, NovelId, ReadingProgress};

use crate::doc;
use crate::error::{ReaderError, Result};

const PROGRESS_KEY: &str = "vorleser.progress";

/// How many history entries are kept, newest first, one per novel.
const HISTORY_CAP: usize = 50;
/// How many novels the continue-reading shortlist holds.
const CONTINUE_READING_CAP: usize = 10;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressDoc {
    /// Latest position per novel.
    latest: HashMap<NovelId, ReadingProgress>,
    /// Reading history, newest first, unique per novel.
    history: Vec<ReadingProgress>,
    /// Shortlist shown as "continue reading". A known novel keeps its slot;
    /// a new one enters at the front.
    continue_reading: Vec<ReadingProgress>,
    bookmarks: Vec<Bookmark>,
}

/// Tracks where the user is in every novel, plus their bookmarks.
pub struct ProgressTracker {
    kv: Arc<dyn KeyValueStore>,
    state: Mutex<ProgressDoc>,
}

impl ProgressTracker {
    pub async fn open(kv: Arc<dyn KeyValueStore>) -> Result<Self> {
        let document = doc::load_or_default(kv.as_ref(), PROGRESS_KEY).await?;
        Ok(Self {
            kv,
            state: Mutex::new(document),
        })
    }

    /// Record a position: replaces the novel's latest entry and refreshes
    /// the history log and continue-reading shortlist.
    pub async fn record(&self, progress: ReadingProgress) -> Result<()> {
        let mut state = self.state.lock().await;

        state
            .latest
            .insert(progress.novel_id.clone(), progress.clone());

        state
            .history
            .retain(|entry| entry.novel_id != progress.novel_id);
        state.history.insert(0, progress.clone());
        state.history.truncate(HISTORY_CAP);

        match state
            .continue_reading
            .iter_mut()
            .find(|entry| entry.novel_id == progress.novel_id)
        {
            Some(entry) => *entry = progress,
            None => {
                state.continue_reading.insert(0, progress);
                state.continue_reading.truncate(CONTINUE_READING_CAP);
            }
        }

        self.persist(&state).await
    }

    pub async fn latest(&self, novel: &NovelId) -> Option<ReadingProgress> {
        self.state.lock().await.latest.get(novel).cloned()
    }

    /// Forget a novel's position and drop it from continue-reading. The
    /// history log keeps its entry.
    pub async fn clear(&self, novel: &NovelId) -> Result<()> {
        let mut state = self.state.lock().await;
        let had_latest = state.latest.remove(novel).is_some();
        let before = state.continue_reading.len();
        state.continue_reading.retain(|entry| &entry.novel_id != novel);
        if !had_latest && state.continue_reading.len() == before {
            return Ok(());
        }
        self.persist(&state).await
    }

    pub async fn history(&self) -> Vec<ReadingProgress> {
        self.state.lock().await.history.clone()
    }

    pub async fn clear_history(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.history.clear();
        self.persist(&state).await
    }

    pub async fn continue_reading(&self) -> Vec<ReadingProgress> {
        self.state.lock().await.continue_reading.clone()
    }

    pub async fn add_bookmark(&self, bookmark: Bookmark) -> Result<()> {
        let mut state = self.state.lock().await;
        state.bookmarks.insert(0, bookmark);
        self.persist(&state).await
    }

    pub async fn remove_bookmark(&self, id: &Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        let Some(pos) = state.bookmarks.iter().position(|b| &b.id == id) else {
            return Err(ReaderError::BookmarkNotFound { id: *id });
        };
        state.bookmarks.remove(pos);
        self.persist(&state).await
    }

    pub async fn set_bookmark_color(&self, id: &Uuid, color: BookmarkColor) -> Result<()> {
        let mut state = self.state.lock().await;
        let Some(bookmark) = state.bookmarks.iter_mut().find(|b| &b.id == id) else {
            return Err(ReaderError::BookmarkNotFound { id: *id });
        };
        bookmark.color = color;
        self.persist(&state).await
    }

    pub async fn bookmarks_for_novel(&self, novel: &NovelId) -> Vec<Bookmark> {
        let state = self.state.lock().await;
        state
            .bookmarks
            .iter()
            .filter(|b| &b.novel_id == novel)
            .cloned()
            .collect()
    }

    pub async fn bookmarks_for_chapter(
        &self,
        novel: &NovelId,
        chapter: &ChapterId,
    ) -> Vec<Bookmark> {
        let state = self.state.lock().await;
        state
            .bookmarks
            .iter()
            .filter(|b| &b.novel_id == novel && &b.chapter_id == chapter)
            .cloned()
            .collect()
    }

    async fn persist(&self, document: &ProgressDoc) -> Result<()> {
        doc::persist(self.kv.as_ref(), PROGRESS_KEY, document).await?;
        Ok(())
    }
}
