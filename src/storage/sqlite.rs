//! Key-value store on top of the `storage_entries` table.

use super::KeyValueStore;
use crate::{
    entities::{StorageEntry, storage_entry},
    errors::Result,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::{debug, instrument};

/// Durable store backed by the local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    /// Wraps an open connection. Tables must already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = StorageEntry::find_by_id(key.to_string()).one(&self.db).await?;
        Ok(entry.map(|e| e.value))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().naive_utc();
        let existing = StorageEntry::find_by_id(key.to_string()).one(&self.db).await?;

        if let Some(entry) = existing {
            let mut active_model: storage_entry::ActiveModel = entry.into();
            active_model.value = Set(value.to_string());
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            let new_entry = storage_entry::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(now),
            };
            new_entry.insert(&self.db).await?;
        }

        debug!("Wrote {} byte(s) to '{}'", value.len(), key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        StorageEntry::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_tracing, setup_test_db};
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_set_and_get_new_key() -> Result<()> {
        init_test_tracing();
        let store = SqliteStore::new(setup_test_db().await?);

        store.set("test_key_1", "test_value_1").await?;

        assert_eq!(
            store.get("test_key_1").await?,
            Some("test_value_1".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_set_updates_existing_key() -> Result<()> {
        let db = setup_test_db().await?;
        let store = SqliteStore::new(db.clone());

        store.set("test_key_update", "initial_value").await?;
        store.set("test_key_update", "updated_value").await?;

        assert_eq!(
            store.get("test_key_update").await?,
            Some("updated_value".to_string())
        );
        let count = StorageEntry::find().count(&db).await?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_and_remove_missing_key() -> Result<()> {
        let store = SqliteStore::new(setup_test_db().await?);

        assert!(store.get("this_key_does_not_exist").await?.is_none());
        store.remove("this_key_does_not_exist").await?;
        Ok(())
    }
}
