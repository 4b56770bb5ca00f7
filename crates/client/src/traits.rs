//! The remote content API contract.

use async_trait::async_trait;

use vorleser_types::{ChapterId, NovelId};

use crate::error::Result;
use crate::types::{FetchedChapter, NovelInfo, NovelSummary};

/// Client for the remote scraping API the reading core fetches from.
///
/// Implementations do not retry; failures are typed so callers can decide
/// (the download pipeline drops, a reading session offers retry).
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Search novels by keyword. A blank keyword yields no results without
    /// touching the network.
    async fn search(&self, keyword: &str) -> Result<Vec<NovelSummary>>;

    /// Fetch a novel's metadata and ordered chapter list.
    async fn fetch_novel_info(&self, novel: &NovelId) -> Result<NovelInfo>;

    /// Fetch one chapter's raw content with prev/next navigation.
    async fn fetch_chapter(&self, novel: &NovelId, chapter: &ChapterId)
        -> Result<FetchedChapter>;
}
