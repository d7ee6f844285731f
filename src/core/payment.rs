//! Sacrament payment business logic for the secretary's payment screen.
//!
//! Payments are stored in the `payments` table. Balance and status are always
//! derived from the total and paid amounts, so the two can never disagree with
//! the stored figures. Receipt numbers are generated once, on creation, and
//! survive every later edit.

use super::report;
use crate::{
    entities::{Payment, payment},
    errors::{Error, Result},
};
use chrono::{Datelike, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Sacraments a payment can be recorded for
pub const SACRAMENT_TYPES: [&str; 6] = [
    "Baptism",
    "First Communion",
    "Confirmation",
    "Wedding",
    "Funeral",
    "Mass Intention",
];

/// Parish chart-of-accounts categories
pub const CATEGORIES: [&str; 19] = [
    "Ministerial Services",
    "Collections",
    "Other Income",
    "Donation from Special Projects",
    "Other Church Income/Donations Individuals",
    "Foreign & Local Fundings Assistance",
    "Pontifical Collections",
    "National Collections",
    "Diocesan Collections",
    "Priest Honoraria",
    "Rectory Expenses",
    "Regular Expenses",
    "Church Supplies & Other Expenses",
    "Repair & Maintenance",
    "Honorarium",
    "Pastoral Program",
    "Special Project Donation",
    "Remittance to the Curia",
    "Cash Advances (Receivables)",
];

/// How much of a payment has been settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    /// Nothing received yet
    Unpaid,
    /// Something received, balance remaining
    Partial,
    /// Fully settled
    Paid,
}

impl PaymentStatus {
    /// Status for the given amounts
    #[must_use]
    pub fn from_amounts(total_amount: f64, amount_paid: f64) -> Self {
        if amount_paid >= total_amount {
            Self::Paid
        } else if amount_paid > 0.0 {
            Self::Partial
        } else {
            Self::Unpaid
        }
    }

    /// Stored form: `"paid"`, `"partial"` or `"unpaid"`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable fields of a payment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInput {
    /// Payer first name
    pub first_name: String,
    /// Payer last name
    pub last_name: String,
    /// One of [`SACRAMENT_TYPES`]
    pub sacrament_type: String,
    /// One of [`CATEGORIES`]
    pub category: String,
    /// Full amount due
    pub total_amount: f64,
    /// Amount received so far
    pub amount_paid: f64,
}

impl PaymentInput {
    fn check_amounts(&self) -> Result<()> {
        for amount in [self.total_amount, self.amount_paid] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Error::InvalidAmount { amount });
            }
        }
        Ok(())
    }

    fn apply(self, model: &mut payment::ActiveModel) {
        let status = PaymentStatus::from_amounts(self.total_amount, self.amount_paid);
        model.first_name = Set(self.first_name.trim().to_string());
        model.last_name = Set(self.last_name.trim().to_string());
        model.sacrament_type = Set(self.sacrament_type);
        model.category = Set(self.category);
        model.total_amount = Set(self.total_amount);
        model.amount_paid = Set(self.amount_paid);
        model.balance = Set(self.total_amount - self.amount_paid);
        model.status = Set(status.as_str().to_string());
    }
}

/// Receipt number for the `sequence`-th payment of `year`, e.g. `RCP-2025-0003`
#[must_use]
pub fn receipt_number(year: i32, sequence: u64) -> String {
    format!("RCP-{year}-{sequence:04}")
}

/// Records a new payment.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] for negative or non-finite amounts, or a
/// database error.
pub async fn create_payment(db: &DatabaseConnection, input: PaymentInput) -> Result<payment::Model> {
    input.check_amounts()?;

    let txn = db.begin().await?;

    let existing = Payment::find().count(&txn).await?;
    let now = Utc::now();
    let receipt = receipt_number(now.year(), existing + 1);

    let mut model = payment::ActiveModel {
        created_at: Set(now),
        receipt_number: Set(receipt),
        ..Default::default()
    };
    input.apply(&mut model);

    let created = model.insert(&txn).await?;
    txn.commit().await?;

    info!(
        "Recorded payment {} for {} {} ({})",
        created.receipt_number, created.first_name, created.last_name, created.status
    );
    Ok(created)
}

/// Replaces the editable fields of an existing payment.
///
/// Id, creation time and receipt number are kept.
///
/// # Errors
/// Returns [`Error::PaymentNotFound`] when `id` does not exist, and
/// [`Error::InvalidAmount`] for bad amounts.
pub async fn update_payment(
    db: &DatabaseConnection,
    id: i64,
    input: PaymentInput,
) -> Result<payment::Model> {
    input.check_amounts()?;

    let existing = Payment::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::PaymentNotFound { id })?;

    let mut model: payment::ActiveModel = existing.into();
    input.apply(&mut model);
    let updated = model.update(db).await?;

    debug!("Updated payment {} ({})", updated.receipt_number, updated.status);
    Ok(updated)
}

/// Every payment in creation order
pub async fn list_payments(db: &DatabaseConnection) -> Result<Vec<payment::Model>> {
    Payment::find()
        .order_by_asc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks a payment up by id
pub async fn get_payment(db: &DatabaseConnection, id: i64) -> Result<Option<payment::Model>> {
    Payment::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Screen filters. Empty or `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFilter {
    /// Matched against `"first last"` and the receipt number, ignoring case
    pub search: String,
    /// Exact sacrament type
    pub sacrament_type: Option<String>,
    /// Exact status
    pub status: Option<PaymentStatus>,
    /// Exact category
    pub category: Option<String>,
}

impl PaymentFilter {
    /// Whether `payment` passes every filter
    #[must_use]
    pub fn matches(&self, payment: &payment::Model) -> bool {
        let term = self.search.to_lowercase();
        let full_name = format!("{} {}", payment.first_name, payment.last_name).to_lowercase();
        let matches_search = term.is_empty()
            || full_name.contains(&term)
            || payment.receipt_number.to_lowercase().contains(&term);

        matches_search
            && self
                .sacrament_type
                .as_ref()
                .is_none_or(|s| &payment.sacrament_type == s)
            && self.status.is_none_or(|s| payment.status == s.as_str())
            && self.category.as_ref().is_none_or(|c| &payment.category == c)
    }
}

/// Payments passing `filter`, in their original order
#[must_use]
pub fn filter_payments<'a>(
    payments: &'a [payment::Model],
    filter: &PaymentFilter,
) -> Vec<&'a payment::Model> {
    payments.iter().filter(|p| filter.matches(p)).collect()
}

/// Sum of amounts received
#[must_use]
pub fn total_income<'a, I>(payments: I) -> f64
where
    I: IntoIterator<Item = &'a payment::Model>,
{
    payments.into_iter().map(|p| p.amount_paid).sum()
}

/// Money to hand back when `paid` exceeds `total`
#[must_use]
pub fn calculate_change(total: f64, paid: f64) -> f64 {
    if paid > total { paid - total } else { 0.0 }
}

/// Amount received per category, in first-seen order
#[must_use]
pub fn income_by_category<'a, I>(payments: I) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = &'a payment::Model>,
{
    report::summarize_by(
        payments,
        |p: &payment::Model| p.category.clone(),
        |p: &payment::Model| p.amount_paid,
    )
}
