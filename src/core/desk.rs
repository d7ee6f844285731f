//! Donation desk - the submit flow behind the donation form.
//!
//! Validates the form, waits out the processing delay, appends the completed
//! record to the ledger and lists its reminder. The notification permission
//! prompt and the reminder timer run in the background, so a submit never
//! waits on the donor answering a prompt. Only one submission can be
//! in flight at a time; a second submit while the first is processing is
//! rejected with [`Error::SubmissionInProgress`].

use super::{
    donation::{DonationRecord, Purpose, RecordId, RecordIdGenerator},
    form::{DonationForm, FieldErrors, build_record},
    ledger::TransactionStore,
    reminder::{Notifier, ReminderScheduler, ReminderState},
    report,
};
use crate::{
    config::AppConfig,
    errors::{Error, Result},
    storage::KeyValueStore,
};
use chrono::{Local, NaiveDate, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Shown after a successful submit
pub const SUCCESS_MESSAGE: &str = "Donation recorded and payment processed (mock).";
/// Shown under the `general` key when processing fails
pub const FAILURE_MESSAGE: &str = "Failed to process donation. Try again.";

/// Result of one submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The form has errors; nothing was stored
    Invalid(FieldErrors),
    /// Processing failed; the form keeps its values so the donor can retry
    Failed {
        /// Message also placed on the form
        message: String,
    },
    /// The donation was stored and the form cleared
    Recorded {
        /// The stored record
        record: DonationRecord,
        /// What happened to its reminder
        reminder: ReminderState,
    },
}

impl SubmitOutcome {
    /// Banner text for the outcome; field errors have none.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Invalid(_) => None,
            Self::Failed { message } => Some(message.as_str()),
            Self::Recorded { .. } => Some(SUCCESS_MESSAGE),
        }
    }
}

/// Filtered ledger view with its totals
#[derive(Debug, Clone, PartialEq)]
pub struct DonationReport {
    /// Records in range, newest first
    pub records: Vec<DonationRecord>,
    /// Sum of `records`
    pub total: f64,
    /// Per-purpose subtotals of `records`
    pub by_purpose: Vec<(Purpose, f64)>,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The donation screen's state for one session.
#[derive(Debug)]
pub struct DonationDesk {
    ledger: Mutex<TransactionStore>,
    reminders: ReminderScheduler,
    ids: RecordIdGenerator,
    processing_delay: Duration,
    busy: AtomicBool,
}

impl DonationDesk {
    /// Loads the ledger and reminder list from `store`.
    pub async fn open(
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> Self {
        let ledger = TransactionStore::load(Arc::clone(&store)).await;
        let ids = RecordIdGenerator::new();
        for record in ledger.records() {
            ids.observe(&record.id);
        }
        let reminders =
            ReminderScheduler::load(store, notifier, config.reminders.notification_title.clone())
                .await;

        Self {
            ledger: Mutex::new(ledger),
            reminders,
            ids,
            processing_delay: config.donations.processing_delay(),
            busy: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently processing
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Submits the form.
    ///
    /// A reminder for a future Mass comes back as
    /// `PendingScheduled { timer_armed: false }`; its timer is armed once
    /// permission is granted, see [`ReminderScheduler::state`].
    ///
    /// # Errors
    /// Returns [`Error::SubmissionInProgress`] if another submit has not
    /// finished yet. Every other problem is reported through the outcome.
    pub async fn submit(&self, form: &mut DonationForm) -> Result<SubmitOutcome> {
        if self.busy.swap(true, Ordering::AcqRel) {
            warn!("Rejected donation submit while another is processing");
            return Err(Error::SubmissionInProgress);
        }
        let _busy = BusyGuard(&self.busy);

        let now = Utc::now();
        let record = match build_record(form, self.ids.next_id(now), now) {
            Ok(record) => record,
            Err(errors) => {
                form.set_errors(errors.clone());
                return Ok(SubmitOutcome::Invalid(errors));
            }
        };
        form.set_errors(FieldErrors::new());

        tokio::time::sleep(self.processing_delay).await;

        if let Err(e) = self.ledger.lock().await.append(record.clone()).await {
            warn!("Failed to store donation {}: {}", record.id, e);
            form.set_general_error(FAILURE_MESSAGE);
            return Ok(SubmitOutcome::Failed {
                message: FAILURE_MESSAGE.to_string(),
            });
        }

        let reminder = self.reminders.schedule(&record, Local::now()).await;
        info!(
            "Recorded donation {} ({}) for {:.2}",
            record.id, record.purpose, record.amount
        );

        form.reset();
        Ok(SubmitOutcome::Recorded { record, reminder })
    }

    /// Records scheduled within `from..=to` plus their totals
    pub async fn report(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> DonationReport {
        let ledger = self.ledger.lock().await;
        let view = ledger.filter_by_date_range(from, to);
        DonationReport {
            total: report::total_all(view.iter().copied()),
            by_purpose: report::summary_by_purpose(view.iter().copied()),
            records: view.into_iter().cloned().collect(),
        }
    }

    /// Records with a listed reminder, in list order
    pub async fn upcoming_reminders(&self) -> Vec<DonationRecord> {
        let ids = self.reminders.upcoming().await;
        let ledger = self.ledger.lock().await;
        ids.iter()
            .filter_map(|id| ledger.get(id).cloned())
            .collect()
    }

    /// Removes a reminder by hand
    pub async fn clear_reminder(&self, id: &RecordId) -> bool {
        self.reminders.clear(id).await
    }

    /// The reminder scheduler
    #[must_use]
    pub const fn reminders(&self) -> &ReminderScheduler {
        &self.reminders
    }

    /// Cancels armed reminder timers; call when the screen goes away.
    pub async fn shutdown(&self) {
        self.reminders.shutdown().await;
    }
}
