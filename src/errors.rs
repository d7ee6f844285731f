//! Unified error type for the parish ledger.
//!
//! Field validation problems are not errors in this sense; they are returned as
//! [`crate::core::form::FieldErrors`] so the form can show them inline. This enum
//! covers everything that actually stops an operation.

use thiserror::Error;

/// All failures surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database failure from sea-orm
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A monetary amount was negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A month filter outside 1..=12 or an unknown month name
    #[error("Invalid month: {month}")]
    InvalidMonth {
        /// The rejected month as given
        month: String,
    },

    /// No payment exists with the given id
    #[error("Payment not found: {id}")]
    PaymentNotFound {
        /// The missing payment id
        id: i64,
    },

    /// A donation submit was started while another one is still processing
    #[error("A donation is already being processed")]
    SubmissionInProgress,

    /// The platform refused or failed to show a notification
    #[error("Notification error: {message}")]
    Notification {
        /// Platform message
        message: String,
    },

    /// The expense report endpoint failed or returned an unsuccessful payload
    #[error("Expense report error: {message}")]
    Report {
        /// What went wrong
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
