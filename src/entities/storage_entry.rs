//! Storage entry entity - one row per persisted key.
//! Backs the key-value store that holds the donation ledger and the
//! reminder list as JSON documents.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key-value storage model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_entries")]
pub struct Model {
    /// Storage key (e.g., `"donation_transactions_v1"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Serialized value, rewritten in full on every write
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this key was last written
    pub updated_at: DateTime,
}

/// `StorageEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
