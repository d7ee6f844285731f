//! Persistent key-value storage.
//!
//! The donation screens keep their collections as whole JSON documents under
//! versioned keys. A schema change introduces a new key instead of migrating
//! the old document.

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key holding the donation ledger
pub const TRANSACTIONS_KEY: &str = "donation_transactions_v1";
/// Key holding the reminder list
pub const REMINDERS_KEY: &str = "donation_reminders_v1";

/// String key to string value storage scoped to one session or device.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value for `key`, `None` if it was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Reads a JSON array stored under `key`.
///
/// Anything that does not decode as `Vec<T>` is discarded: the key is removed
/// and an empty collection is returned. A missing key is also empty.
///
/// # Errors
/// Returns the store's error when the key could not be read at all. Callers
/// must not overwrite the key in that case, since its contents are unknown.
pub async fn load_collection<T>(store: &dyn KeyValueStore, key: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => {
            debug!("Loaded {} item(s) from '{}'", items.len(), key);
            Ok(items)
        }
        Err(e) => {
            warn!("Discarding unreadable '{}': {}", key, e);
            if let Err(e) = store.remove(key).await {
                warn!("Failed to remove '{}': {}", key, e);
            }
            Ok(Vec::new())
        }
    }
}

/// Rewrites the whole collection under `key`.
pub async fn save_collection<T>(store: &dyn KeyValueStore, key: &str, items: &[T]) -> Result<()>
where
    T: Serialize + Sync,
{
    let raw = serde_json::to_string(items)?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FailingStore, setup_test_db};

    #[tokio::test]
    async fn test_load_missing_key_is_empty() -> Result<()> {
        let store = MemoryStore::new();
        let items: Vec<String> = load_collection(&store, "missing").await?;
        assert!(items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_read_failure_is_reported_not_emptied() {
        let result: Result<Vec<String>> = load_collection(&FailingStore, "names_v1").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_discarded() -> Result<()> {
        let store = MemoryStore::new();
        store.set("broken", "{not json").await?;

        let items: Vec<String> = load_collection(&store, "broken").await?;
        assert!(items.is_empty());
        assert_eq!(store.get("broken").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_load_sqlite() -> Result<()> {
        let db = setup_test_db().await?;
        let store = SqliteStore::new(db);

        let names = vec!["Maria".to_string(), "Juan".to_string()];
        save_collection(&store, "names_v1", &names).await?;

        let loaded: Vec<String> = load_collection(&store, "names_v1").await?;
        assert_eq!(loaded, names);
        Ok(())
    }
}
