//! Persistent key-value backing storage.
//!
//! Every persisted document in the reading core (downloaded library, reading
//! progress, settings, lists, statistics) is a JSON string stored under a
//! fixed key. This module defines the storage contract and the two backends:
//! one on the filesystem, one in memory for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{Result, StorageError};

/// Durable string key-value storage.
///
/// Implementations must make `set` durable before returning; offline
/// guarantees are built on that. Keys are simple identifiers chosen by the
/// caller (this crate uses dot-separated constants), not arbitrary paths.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Removing an absent key is not
    /// an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Filesystem-backed key-value store.
///
/// Each key maps to one file under the root directory. The directory is
/// created on first write.
#[derive(Debug, Clone)]
pub struct FilesystemKv {
    root: PathBuf,
}

impl FilesystemKv {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FilesystemKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Backend {
                source: Some(eyre::eyre!("Failed to read '{}': {}", path.display(), e)),
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Backend {
                source: Some(eyre::eyre!(
                    "Failed to create storage directory '{}': {}",
                    self.root.display(),
                    e
                )),
            })?;

        let path = self.path_for(key);
        fs::write(&path, value)
            .await
            .map_err(|e| StorageError::Backend {
                source: Some(eyre::eyre!("Failed to write '{}': {}", path.display(), e)),
            })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Backend {
                source: Some(eyre::eyre!("Failed to delete '{}': {}", path.display(), e)),
            }),
        }
    }
}

/// In-memory key-value store for tests.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Backend {
            source: Some(eyre::eyre!("Memory store lock poisoned")),
        })?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Backend {
            source: Some(eyre::eyre!("Memory store lock poisoned")),
        })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Backend {
            source: Some(eyre::eyre!("Memory store lock poisoned")),
        })?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn filesystem_kv_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let kv = FilesystemKv::new(temp_dir.path());

        assert_eq!(kv.get("alpha").await.unwrap(), None);

        kv.set("alpha", "{\"value\":1}").await.unwrap();
        assert_eq!(kv.get("alpha").await.unwrap().unwrap(), "{\"value\":1}");

        kv.set("alpha", "{\"value\":2}").await.unwrap();
        assert_eq!(kv.get("alpha").await.unwrap().unwrap(), "{\"value\":2}");

        kv.delete("alpha").await.unwrap();
        assert_eq!(kv.get("alpha").await.unwrap(), None);
    }

    #[tokio::test]
    async fn filesystem_kv_delete_missing_key_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let kv = FilesystemKv::new(temp_dir.path());
        kv.delete("never-set").await.unwrap();
    }

    #[tokio::test]
    async fn memory_kv_roundtrip() {
        let kv = MemoryKv::new();
        kv.set("k", "v").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().unwrap(), "v");
        kv.delete("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);
    }
}
