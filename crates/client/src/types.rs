//! Wire types for the remote content API.
//!
//! Field names mirror the API's camelCase JSON exactly; everything the core
//! consumes is re-expressed through the shared id newtypes on the way in.

use serde::{Deserialize, Serialize};

use vorleser_types::{ChapterId, ChapterStub, NovelId};

/// Envelope every API route responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// One novel as returned by search and listing routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelSummary {
    pub id: NovelId,
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    pub author: String,
    pub cover_image: String,
    pub description: String,
    pub genre: String,
    pub status: String,
    pub update_time: String,
    #[serde(default)]
    pub latest_chapter: Option<String>,
}

/// Chapter entry in a novel's chapter list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterEntry {
    pub id: ChapterId,
    pub title: String,
    pub url: String,
}

impl From<ChapterEntry> for ChapterStub {
    fn from(entry: ChapterEntry) -> Self {
        ChapterStub {
            id: entry.id,
            title: entry.title,
        }
    }
}

/// Novel metadata together with its ordered chapter list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelInfo {
    #[serde(flatten)]
    pub novel: NovelSummary,
    pub chapters: Vec<ChapterEntry>,
    pub total_chapters: usize,
}

impl NovelInfo {
    /// The ordered chapter list as the id/title stubs the rest of the core
    /// works with.
    pub fn chapter_stubs(&self) -> Vec<ChapterStub> {
        self.chapters.iter().cloned().map(Into::into).collect()
    }
}

/// Link to an adjacent chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterLink {
    pub id: ChapterId,
    pub url: String,
}

/// Previous/next links the API resolves alongside chapter content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterNavigation {
    pub prev: Option<ChapterLink>,
    pub next: Option<ChapterLink>,
}

/// Raw chapter content as fetched, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedChapter {
    pub id: ChapterId,
    pub title: String,
    /// Raw markup; feed through the normalizer before display or speech.
    pub content: String,
    pub novel_id: NovelId,
    pub novel_title: String,
    #[serde(default)]
    pub navigation: ChapterNavigation,
}
