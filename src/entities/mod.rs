//! Entity module - SeaORM entity definitions for the local database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod payment;
pub mod storage_entry;

pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use storage_entry::{
    Column as StorageEntryColumn, Entity as StorageEntry, Model as StorageEntryModel,
};
