//! Donation records - the shape persisted in the donation ledger.
//!
//! Records are closed structures: unknown fields are rejected when the ledger
//! is loaded, so a blob written by a different schema is discarded rather than
//! half-trusted. Completed and failed records are never modified.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Opaque, immutable record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wraps an existing id string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues millisecond-timestamp ids that strictly increase within a process.
///
/// Two submits in the same millisecond get consecutive ids instead of a
/// collision.
#[derive(Debug, Default)]
pub struct RecordIdGenerator {
    last: AtomicI64,
}

impl RecordIdGenerator {
    /// Creates a generator with no history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure later ids sort after `id` (used after loading a ledger).
    pub fn observe(&self, id: &RecordId) {
        if let Ok(value) = id.as_str().parse::<i64>() {
            self.last.fetch_max(value, Ordering::Relaxed);
        }
    }

    /// Next id for a record created at `now`
    pub fn next_id(&self, now: DateTime<Utc>) -> RecordId {
        let candidate = now.timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = candidate.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return RecordId(next.to_string()),
                Err(actual) => last = actual,
            }
        }
    }
}

/// What the donation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    /// Mass offered for a person or occasion
    #[serde(rename = "Mass Intentions")]
    MassIntentions,
    /// Building upkeep and improvements
    #[serde(rename = "Parish Development / Maintenance")]
    ParishDevelopment,
    /// Feeding, outreach and similar programs
    #[serde(rename = "Charity Programs (Feeding, Outreach, etc.)")]
    CharityPrograms,
    /// Unrestricted parish fund
    #[serde(rename = "General Parish Fund")]
    GeneralFund,
    /// Anything else
    #[serde(rename = "Others (specify)")]
    Other,
}

impl Purpose {
    /// Every purpose, in form order
    pub const ALL: [Self; 5] = [
        Self::MassIntentions,
        Self::ParishDevelopment,
        Self::CharityPrograms,
        Self::GeneralFund,
        Self::Other,
    ];

    /// Label used in the form and in persisted records
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MassIntentions => "Mass Intentions",
            Self::ParishDevelopment => "Parish Development / Maintenance",
            Self::CharityPrograms => "Charity Programs (Feeding, Outreach, etc.)",
            Self::GeneralFund => "General Parish Fund",
            Self::Other => "Others (specify)",
        }
    }

    /// Parses a form label
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of intention the donation is offered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentionType {
    /// Thanksgiving
    Thanksgiving,
    /// Healing or recovery
    #[serde(rename = "Healing/Recovery")]
    HealingRecovery,
    /// Birthday
    Birthday,
    /// Anniversary
    Anniversary,
    /// Anything else
    #[serde(rename = "Others(specify)")]
    Other,
}

impl IntentionType {
    /// Every intention type, in form order
    pub const ALL: [Self; 5] = [
        Self::Thanksgiving,
        Self::HealingRecovery,
        Self::Birthday,
        Self::Anniversary,
        Self::Other,
    ];

    /// Label used in the form and in persisted records
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Thanksgiving => "Thanksgiving",
            Self::HealingRecovery => "Healing/Recovery",
            Self::Birthday => "Birthday",
            Self::Anniversary => "Anniversary",
            Self::Other => "Others(specify)",
        }
    }

    /// Parses a form label
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for IntentionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Processing state of a donation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    /// Awaiting processing
    Pending,
    /// Processed; the record is final
    Completed,
    /// Processing failed; the record is final
    Failed,
}

/// A submitted donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DonationRecord {
    /// Unique id assigned at creation
    pub id: RecordId,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Date chosen for the donation or Mass
    pub scheduled_date: NaiveDate,
    /// Time of day chosen for the donation; midnight when absent
    #[serde(default)]
    pub scheduled_time: NaiveTime,
    /// Donor full name
    pub full_name: String,
    /// Donor contact number
    pub contact_number: String,
    /// Donor email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    /// Donor home address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_address: Option<String>,
    /// Amount in pesos, two decimal places
    pub amount: f64,
    /// External proof-of-payment reference
    pub reference_number: String,
    /// 11-digit GCash account the donation was sent from
    pub gcash_number: String,
    /// Person or occasion the Mass is offered for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intention_name: Option<String>,
    /// What the donation is for
    pub purpose: Purpose,
    /// Kind of intention
    pub intention_type: IntentionType,
    /// Processing state
    pub status: DonationStatus,
}

impl DonationRecord {
    /// Scheduled date and time combined, without a time zone
    #[must_use]
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }

    /// The intention name when this record asks for a Mass reminder.
    #[must_use]
    pub fn mass_intention(&self) -> Option<&str> {
        if self.purpose != Purpose::MassIntentions {
            return None;
        }
        self.intention_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Donor name as shown in the ledger table, with the intention if any
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.intention_name.as_deref().filter(|n| !n.is_empty()) {
            Some(intention) => format!("{} (Intention: {intention})", self.full_name),
            None => self.full_name.clone(),
        }
    }
}

/// Rounds a peso amount to centavos
#[must_use]
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
