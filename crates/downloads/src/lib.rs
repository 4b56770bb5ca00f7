//! Background download pipeline for offline reading.
//!
//! The [`DownloadCoordinator`] accepts per-chapter requests, fetches and
//! normalizes them with bounded concurrency, and commits the results to the
//! offline store, which applies its own storage ceilings on every insert.

pub mod coordinator;

pub use coordinator::{DownloadCoordinator, DownloadRequest, MAX_CONCURRENT_DOWNLOADS};
