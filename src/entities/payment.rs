//! Payment entity - sacrament payments recorded by the parish secretary.
//!
//! `balance` and `status` are derived from `total_amount` and `amount_paid`
//! whenever a payment is written; see [`crate::core::payment`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Payer first name
    pub first_name: String,
    /// Payer last name
    pub last_name: String,
    /// Sacrament being paid for (e.g., `"Baptism"`, `"Wedding"`)
    pub sacrament_type: String,
    /// Parish chart-of-accounts category
    pub category: String,
    /// Full amount due
    pub total_amount: f64,
    /// Amount received so far
    pub amount_paid: f64,
    /// `total_amount - amount_paid`
    pub balance: f64,
    /// `"paid"`, `"partial"` or `"unpaid"`
    pub status: String,
    /// When the payment was first recorded
    pub created_at: DateTimeUtc,
    /// Generated receipt number, `RCP-<year>-<NNNN>`
    #[sea_orm(unique)]
    pub receipt_number: String,
}

/// `Payment` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
