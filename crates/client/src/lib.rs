//! Client for the remote novel content API.
//!
//! The API is the scraping collaborator: it resolves novels, chapter lists
//! and raw chapter markup. This crate defines the [`ContentClient`] contract
//! the rest of the core consumes plus the HTTP implementation, speaking the
//! API's `{success, data, message}` JSON envelope.

mod error;
mod http;
mod traits;
mod types;

pub use error::{ClientError, Result};
pub use http::HttpContentClient;
pub use traits::ContentClient;
pub use types::{
    ApiResponse, ChapterEntry, ChapterLink, ChapterNavigation, FetchedChapter, NovelInfo,
    NovelSummary,
};
