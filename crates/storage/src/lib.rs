//! Persistent storage for the vorleser reading core.
//!
//! Two layers live here. [`kv`] is the durable key-value collaborator every
//! persisted document goes through, with filesystem and in-memory backends.
//! [`OfflineStore`] sits on top of it and owns the downloaded-chapter
//! library, including the global chapter-count and byte-size ceilings that
//! are enforced by evicting the oldest downloads first.

pub mod error;
pub mod kv;
pub mod models;
mod offline;

pub use error::{Result, StorageError};
pub use kv::{FilesystemKv, KeyValueStore, MemoryKv};
pub use models::{DownloadedChapter, DownloadedNovel, StoredNovelSummary};
pub use offline::OfflineStore;
