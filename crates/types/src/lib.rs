//! Shared data types for the vorleser reading core.
//!
//! Identifier newtypes and the plain-data records that cross crate
//! boundaries: reading progress, bookmarks, reading lists, statistics and
//! user settings. Everything here is serde-serializable; persistence lives
//! in the storage and reader crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a novel.
///
/// A simple string wrapper around whatever identifier the remote content
/// API uses (slugs today, but nothing here depends on that).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NovelId(pub String);

impl NovelId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NovelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NovelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for NovelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Unique identifier for a chapter within a novel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterId(pub String);

impl ChapterId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChapterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ChapterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Globally unique chapter address. Chapter ids are only unique within
/// their novel, so every cross-novel map is keyed by this pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterKey {
    pub novel: NovelId,
    pub chapter: ChapterId,
}

impl ChapterKey {
    pub fn new(novel: NovelId, chapter: ChapterId) -> Self {
        Self { novel, chapter }
    }
}

/// Chapter entry as listed by the remote API: identity and title, no
/// content. Download queues and session chapter lists are built from these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterStub {
    pub id: ChapterId,
    pub title: String,
}

impl ChapterStub {
    pub fn new(id: impl Into<ChapterId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Latest reading position within a novel. One value per novel; also the
/// record shape the history log and continue-reading shortlist store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingProgress {
    pub novel_id: NovelId,
    pub novel_title: String,
    pub chapter_id: ChapterId,
    pub chapter_title: String,
    /// Position of the chapter in the novel's ordered chapter list.
    pub chapter_index: usize,
    pub paragraph_index: usize,
    pub cover_image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A saved paragraph position, with enough denormalized context to render
/// it without refetching the chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub novel_id: NovelId,
    pub novel_title: String,
    pub chapter_id: ChapterId,
    pub chapter_title: String,
    pub paragraph_index: usize,
    /// First part of the bookmarked paragraph, for display.
    pub paragraph_text: String,
    pub color: BookmarkColor,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkColor {
    Yellow,
    Green,
    Blue,
    Red,
    Purple,
}

impl Default for BookmarkColor {
    fn default() -> Self {
        BookmarkColor::Yellow
    }
}

/// Named collection of novels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingList {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Member novels, unique, in insertion order.
    pub novel_ids: Vec<NovelId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReadingList {
    pub fn contains(&self, novel: &NovelId) -> bool {
        self.novel_ids.iter().any(|id| id == novel)
    }
}

/// One finished reading session, appended to the session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub novel_id: NovelId,
    pub novel_title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub words_read: u64,
    pub chapters_read: u32,
}

impl SessionRecord {
    /// Session length in whole minutes, never negative.
    pub fn minutes(&self) -> u64 {
        let secs = (self.ended_at - self.started_at).num_seconds().max(0) as u64;
        secs / 60
    }
}

/// Aggregate reading statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingStats {
    /// Total reading time in minutes.
    pub total_reading_time: u64,
    pub total_words_read: u64,
    pub total_chapters_read: u64,
    /// Consecutive days with at least one session, ending today.
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Last day a session was recorded, as a `YYYY-MM-DD` date string.
    pub last_read_date: Option<String>,
}

/// Voice parameters applied to every utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationSettings {
    pub pitch: f32,
    pub rate: f32,
    /// Backend voice identifier; `None` selects the backend default.
    pub voice: Option<String>,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            rate: 1.0,
            voice: None,
        }
    }
}

/// Ceilings for the offline store, both enforced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLimits {
    /// Maximum number of chapters kept offline across all novels.
    pub max_chapters: usize,
    /// Maximum total stored bytes, expressed in megabytes.
    pub max_storage_mb: u64,
}

impl DownloadLimits {
    pub fn max_storage_bytes(&self) -> u64 {
        self.max_storage_mb * 1024 * 1024
    }
}

impl Default for DownloadLimits {
    fn default() -> Self {
        Self {
            max_chapters: 500,
            max_storage_mb: 100,
        }
    }
}

/// Persisted user settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub narration: NarrationSettings,
    #[serde(default)]
    pub downloads: DownloadLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_key_distinguishes_novels() {
        let a = ChapterKey::new("novel-a".into(), "ch-1".into());
        let b = ChapterKey::new("novel-b".into(), "ch-1".into());
        assert_ne!(a, b);
    }

    #[test]
    fn session_minutes_rounds_down() {
        let started = Utc::now();
        let record = SessionRecord {
            id: Uuid::new_v4(),
            novel_id: "n".into(),
            novel_title: "N".to_string(),
            started_at: started,
            ended_at: started + chrono::Duration::seconds(150),
            words_read: 0,
            chapters_read: 0,
        };
        assert_eq!(record.minutes(), 2);
    }

    #[test]
    fn settings_roundtrip_with_missing_sections() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.downloads.max_chapters, 500);
        assert_eq!(settings.downloads.max_storage_mb, 100);
        assert_eq!(settings.narration.pitch, 1.0);
    }

    #[test]
    fn storage_limit_converts_to_bytes() {
        let limits = DownloadLimits {
            max_chapters: 10,
            max_storage_mb: 2,
        };
        assert_eq!(limits.max_storage_bytes(), 2 * 1024 * 1024);
    }
}
