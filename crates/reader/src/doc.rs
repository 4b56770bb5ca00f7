//! Loading and persisting the reading layer's JSON documents.
//!
//! Progress, lists, statistics and settings each live as one JSON document
//! under a fixed key in the key-value store, the same shape the offline
//! library uses.

use serde::Serialize;
use serde::de::DeserializeOwned;

use vorleser_storage::{KeyValueStore, StorageError};

/// Load the document under `key`, falling back to the default for a missing
/// or no-longer-parsable document. Corruption is logged, not fatal.
pub(crate) async fn load_or_default<T>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> std::result::Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    match kv.get(key).await? {
        Some(json) => match serde_json::from_str(&json) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                tracing::error!("Discarding corrupt document '{}': {}", key, e);
                Ok(T::default())
            }
        },
        None => Ok(T::default()),
    }
}

pub(crate) async fn persist<T: Serialize>(
    kv: &dyn KeyValueStore,
    key: &str,
    doc: &T,
) -> std::result::Result<(), StorageError> {
    let json = serde_json::to_string(doc).map_err(|e| StorageError::OperationFailed {
        operation: format!("serialize document '{key}'"),
        source: Some(eyre::eyre!(e)),
    })?;
    kv.set(key, &json).await
}
