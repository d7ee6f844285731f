//! Shared test utilities for the parish ledger.
//!
//! Database setup, sample donation records and forms, and fakes for the
//! storage and notification seams.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        donation::{DonationRecord, DonationStatus, IntentionType, Purpose, RecordId},
        form::DonationForm,
        reminder::{Notifier, Permission},
    },
    errors::{Error, Result},
    storage::{KeyValueStore, MemoryStore},
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

/// Routes tracing output to the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A completed Mass Intentions record that names nobody.
///
/// # Defaults
/// * purpose: Mass Intentions, but no intention name, so no reminder
/// * time: 10:00
/// * amount: 100.00
pub fn sample_record(id: &str, date: &str) -> DonationRecord {
    DonationRecord {
        id: RecordId::new(id),
        created_at: Utc::now(),
        scheduled_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        scheduled_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        full_name: "Maria Santos".to_string(),
        contact_number: "09170000000".to_string(),
        email_address: None,
        home_address: None,
        amount: 100.0,
        reference_number: "REF-001".to_string(),
        gcash_number: "09171234567".to_string(),
        intention_name: None,
        purpose: Purpose::MassIntentions,
        intention_type: IntentionType::Thanksgiving,
        status: DonationStatus::Completed,
    }
}

/// A Mass intention for `name` at 10:00 on `date`.
pub fn intention_record(id: &str, date: &str, name: &str) -> DonationRecord {
    let mut record = sample_record(id, date);
    record.intention_name = Some(name.to_string());
    record
}

/// A form that passes validation: a Mass for Juan Dela Cruz on 2025-01-01.
pub fn filled_form() -> DonationForm {
    let mut form = DonationForm::new();
    form.date_of_donation = "2025-01-01".to_string();
    form.time_of_donation = "10:00".to_string();
    form.full_name = "Maria Santos".to_string();
    form.contact_number = "09170000000".to_string();
    form.donation_amount = "500".to_string();
    form.reference_number = "REF-001".to_string();
    form.gcash_number = "09171234567".to_string();
    form.name_of_persons = "Juan Dela Cruz".to_string();
    form.purpose_of_donation = "Mass Intentions".to_string();
    form.intention_type = "Thanksgiving".to_string();
    form
}

/// Store whose every operation fails, as a full or unavailable disk would.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Io(std::io::Error::other("storage unavailable")))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Io(std::io::Error::other("storage full")))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(Error::Io(std::io::Error::other("storage unavailable")))
    }
}

/// Notifier that records what it was asked to show.
#[derive(Debug)]
pub struct RecordingNotifier {
    permission: Option<Permission>,
    requests: AtomicUsize,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// Grants permission
    pub fn granted() -> Self {
        Self::with_permission(Permission::Granted)
    }

    /// Answers every permission request with `permission`
    pub fn with_permission(permission: Permission) -> Self {
        Self {
            permission: Some(permission),
            requests: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Fails every permission request
    pub fn failing_permission() -> Self {
        Self {
            permission: None,
            requests: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// `(title, body)` of every notification shown so far
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// How many times permission was requested
    pub fn permission_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn request_permission(&self) -> Result<Permission> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.permission.ok_or_else(|| Error::Notification {
            message: "permission prompt failed".to_string(),
        })
    }

    fn notify(&self, title: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// In-memory store whose first `n` reads fail; writes always succeed.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_reads: AtomicUsize,
}

impl FlakyStore {
    /// Fails the next `n` calls to `get`
    pub fn failing_reads(n: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_reads: AtomicUsize::new(n),
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let left = self.failing_reads.load(Ordering::SeqCst);
        if left > 0 {
            self.failing_reads.store(left - 1, Ordering::SeqCst);
            return Err(Error::Io(std::io::Error::other("database is locked")));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}
