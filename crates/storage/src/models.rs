//! Persisted models for the downloaded-content library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vorleser_types::{ChapterId, ChapterKey, NovelId};

/// One downloaded chapter, exactly as committed by the download pipeline.
///
/// Immutable once written: the store only ever inserts and removes these,
/// never updates them in place. `size` is the byte length of the raw
/// `content`; the precomputed `paragraphs` are not counted, so the storage
/// limit is enforced against a slight under-estimate of the true footprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedChapter {
    pub novel_id: NovelId,
    pub chapter_id: ChapterId,
    pub novel_title: String,
    pub chapter_title: String,
    /// Raw markup as fetched, kept for renormalization.
    pub content: String,
    /// Normalized paragraphs, precomputed at download time.
    pub paragraphs: Vec<String>,
    pub downloaded_at: DateTime<Utc>,
    pub size: u64,
}

impl DownloadedChapter {
    pub fn key(&self) -> ChapterKey {
        ChapterKey::new(self.novel_id.clone(), self.chapter_id.clone())
    }
}

/// All downloaded chapters of one novel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedNovel {
    pub novel_id: NovelId,
    pub novel_title: String,
    pub cover_image: Option<String>,
    /// Unique by chapter id, in download order.
    pub chapters: Vec<DownloadedChapter>,
    /// Always equals the sum of the current members' `size`.
    pub total_size: u64,
    /// Timestamp of the first chapter downloaded for this novel.
    pub downloaded_at: DateTime<Utc>,
}

impl DownloadedNovel {
    pub fn chapter(&self, id: &ChapterId) -> Option<&DownloadedChapter> {
        self.chapters.iter().find(|c| &c.chapter_id == id)
    }

    pub fn has_chapter(&self, id: &ChapterId) -> bool {
        self.chapter(id).is_some()
    }
}

/// Lightweight view of a downloaded novel for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredNovelSummary {
    pub novel_id: NovelId,
    pub novel_title: String,
    pub cover_image: Option<String>,
    pub chapter_count: usize,
    pub total_size: u64,
    pub downloaded_at: DateTime<Utc>,
}

/// The library document persisted as one JSON value.
///
/// Invariant maintenance lives here: insertion and removal keep per-novel
/// `total_size` in sync and drop a novel entry the moment its last chapter
/// goes. The store serializes access; this type assumes it is the only
/// writer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Library {
    pub novels: Vec<DownloadedNovel>,
}

impl Library {
    pub fn novel(&self, id: &NovelId) -> Option<&DownloadedNovel> {
        self.novels.iter().find(|n| &n.novel_id == id)
    }

    pub fn chapter(&self, novel: &NovelId, chapter: &ChapterId) -> Option<&DownloadedChapter> {
        self.novel(novel).and_then(|n| n.chapter(chapter))
    }

    pub fn contains(&self, novel: &NovelId, chapter: &ChapterId) -> bool {
        self.chapter(novel, chapter).is_some()
    }

    pub fn chapter_count(&self) -> usize {
        self.novels.iter().map(|n| n.chapters.len()).sum()
    }

    pub fn total_size(&self) -> u64 {
        self.novels.iter().map(|n| n.total_size).sum()
    }

    /// Insert a chapter, creating the novel entry if needed. Returns false
    /// without changing anything when the chapter is already present.
    pub fn insert(&mut self, chapter: DownloadedChapter, cover_image: Option<String>) -> bool {
        if self.contains(&chapter.novel_id, &chapter.chapter_id) {
            return false;
        }

        match self
            .novels
            .iter_mut()
            .find(|n| n.novel_id == chapter.novel_id)
        {
            Some(novel) => {
                novel.total_size += chapter.size;
                novel.chapters.push(chapter);
            }
            None => {
                self.novels.push(DownloadedNovel {
                    novel_id: chapter.novel_id.clone(),
                    novel_title: chapter.novel_title.clone(),
                    cover_image,
                    total_size: chapter.size,
                    downloaded_at: chapter.downloaded_at,
                    chapters: vec![chapter],
                });
            }
        }
        true
    }

    /// Remove a chapter, dropping the novel entry if it becomes empty.
    pub fn remove(&mut self, novel: &NovelId, chapter: &ChapterId) -> Option<DownloadedChapter> {
        let idx = self.novels.iter().position(|n| &n.novel_id == novel)?;
        let entry = &mut self.novels[idx];
        let pos = entry.chapters.iter().position(|c| &c.chapter_id == chapter)?;

        let removed = entry.chapters.remove(pos);
        entry.total_size -= removed.size;
        if entry.chapters.is_empty() {
            self.novels.remove(idx);
        }
        Some(removed)
    }

    pub fn remove_novel(&mut self, novel: &NovelId) -> Option<DownloadedNovel> {
        let idx = self.novels.iter().position(|n| &n.novel_id == novel)?;
        Some(self.novels.remove(idx))
    }

    /// Key of the oldest chapter across all novels, the next eviction
    /// candidate. Ties are broken by scan order.
    pub fn oldest_chapter(&self) -> Option<(DateTime<Utc>, ChapterKey)> {
        self.novels
            .iter()
            .flat_map(|n| n.chapters.iter())
            .map(|c| (c.downloaded_at, c.key()))
            .min_by_key(|(at, _)| *at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(novel: &str, id: &str, size: u64) -> DownloadedChapter {
        DownloadedChapter {
            novel_id: novel.into(),
            chapter_id: id.into(),
            novel_title: format!("Novel {novel}"),
            chapter_title: format!("Chapter {id}"),
            content: "x".repeat(size as usize),
            paragraphs: vec!["x".to_string()],
            downloaded_at: Utc::now(),
            size,
        }
    }

    #[test]
    fn insert_tracks_total_size() {
        let mut library = Library::default();
        assert!(library.insert(chapter("n", "1", 10), None));
        assert!(library.insert(chapter("n", "2", 5), None));

        let novel = library.novel(&"n".into()).unwrap();
        assert_eq!(novel.total_size, 15);
        assert_eq!(library.total_size(), 15);
        assert_eq!(library.chapter_count(), 2);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut library = Library::default();
        assert!(library.insert(chapter("n", "1", 10), None));
        assert!(!library.insert(chapter("n", "1", 10), None));
        assert_eq!(library.total_size(), 10);
    }

    #[test]
    fn removing_last_chapter_drops_novel_entry() {
        let mut library = Library::default();
        library.insert(chapter("n", "1", 10), None);

        let removed = library.remove(&"n".into(), &"1".into()).unwrap();
        assert_eq!(removed.size, 10);
        assert!(library.novel(&"n".into()).is_none());
        assert_eq!(library.total_size(), 0);
    }

    #[test]
    fn oldest_chapter_spans_novels() {
        let mut library = Library::default();
        let mut first = chapter("a", "1", 1);
        first.downloaded_at = Utc::now() - chrono::Duration::minutes(10);
        let second = chapter("b", "1", 1);
        library.insert(second, None);
        library.insert(first, None);

        let (_, key) = library.oldest_chapter().unwrap();
        assert_eq!(key.novel, "a".into());
    }
}
