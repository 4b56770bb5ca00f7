//! The reading layer: sessions, positions and organization.
//!
//! Ties the other crates together into the reading experience: a
//! [`ReadingSession`] streams chapters into one continuous paragraph buffer
//! (offline store fast path, network otherwise) and keeps narration and
//! saved progress consistent with it. Around the session live the
//! kv-backed document stores: reading progress and bookmarks, reading
//! lists, statistics and settings.

mod doc;
pub mod error;
pub mod lists;
pub mod progress;
pub mod session;
pub mod settings;
pub mod source;
pub mod stats;

pub use error::{ReaderError, Result};
pub use lists::{DOWNLOADS_LIST_ID, ReadingLists};
pub use progress::ProgressTracker;
pub use session::{ReadingSession, SessionEvent, SessionServices};
pub use settings::SettingsStore;
pub use source::{ContentOrigin, ContentSource, ResolvedChapter};
pub use stats::Statistics;
