//! Core business logic, independent of any UI toolkit.
//!
//! The donation screen is built from [`form`] (input masks and validation),
//! [`ledger`] (the persisted donation list), [`reminder`] (Mass intention
//! notifications) and [`desk`], which ties them into the submit flow. The
//! secretary screens use [`payment`] and [`expense`]. [`report`] holds the
//! aggregation shared by all of them.

/// Donation submit flow
pub mod desk;
/// Donation records and their enumerations
pub mod donation;
/// Expense report query, decoding and search
pub mod expense;
/// Donation form state, input filters and validation
pub mod form;
/// Persisted donation ledger
pub mod ledger;
/// Sacrament payment records
pub mod payment;
/// Mass intention reminders
pub mod reminder;
/// Totals and per-key summaries
pub mod report;
