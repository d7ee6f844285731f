//! Mass intention reminders.
//!
//! A completed donation for Mass Intentions that names someone gets an entry in
//! the persisted reminder list. When the Mass is still ahead, a background task
//! asks the platform for notification permission and, if allowed, waits until
//! the Mass time; then the donor-facing notification is shown and the entry is
//! dropped. Entries whose time has passed, or that never got a timer, stay in
//! the list as "upcoming" until someone clears them.
//!
//! Nothing in here can fail or hold up a submission: the entry is listed
//! before [`ReminderScheduler::schedule`] returns, and permission, timer and
//! storage problems are logged and otherwise ignored.

use super::donation::{DonationRecord, RecordId};
use crate::{
    errors::Result,
    storage::{self, KeyValueStore, REMINDERS_KEY},
};
use async_trait::async_trait;
use chrono::{DateTime, Local, LocalResult, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Answer to a notification permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Notifications may be shown
    Granted,
    /// The user refused
    Denied,
    /// The platform has no notification support
    Unavailable,
}

/// Platform notification surface.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Asks (or re-checks) whether notifications may be shown.
    ///
    /// May wait on the user for as long as the platform prompt stays open.
    async fn request_permission(&self) -> Result<Permission>;

    /// Shows one notification.
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Persisted reminder: only the id of the donation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReminderEntry {
    /// Donation the reminder is for
    pub record_id: RecordId,
}

/// Where a donation stands with respect to reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    /// Not a named Mass intention; no reminder
    NotApplicable,
    /// Listed, but the time has passed or could not be resolved
    PendingUnscheduled,
    /// Listed for a future time
    PendingScheduled {
        /// Whether a timer is running in this session. False while permission
        /// is still being asked for, and stays false if it is not granted.
        timer_armed: bool,
    },
    /// The notification was shown and the entry removed
    Fired,
}

/// Text of the reminder notification for `record`
#[must_use]
pub fn notification_body(intention: &str, record: &DonationRecord) -> String {
    format!(
        "Mass for {intention} is scheduled now ({} {}).",
        record.scheduled_date.format("%Y-%m-%d"),
        record.scheduled_time.format("%H:%M")
    )
}

/// Time left until `target`, if it resolves to an instant strictly after
/// `now`. Ambiguous local times use the earlier instant.
fn delay_until<Tz: TimeZone>(
    target: LocalResult<DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> Option<Duration> {
    target
        .earliest()
        .and_then(|target| target.signed_duration_since(now).to_std().ok())
        .filter(|delay| !delay.is_zero())
}

struct Book {
    entries: Vec<ReminderEntry>,
    states: HashMap<RecordId, ReminderState>,
    // false until the persisted list has been read once
    synced: bool,
}

struct Shared {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    title: String,
    book: Mutex<Book>,
    timers: Mutex<HashMap<RecordId, JoinHandle<()>>>,
}

impl Shared {
    async fn persist(&self, book: &mut Book) {
        if !book.synced {
            let stored =
                storage::load_collection::<ReminderEntry>(self.store.as_ref(), REMINDERS_KEY).await;
            match stored {
                Ok(mut stored) => {
                    for entry in book.entries.drain(..) {
                        if !stored.contains(&entry) {
                            stored.push(entry);
                        }
                    }
                    book.entries = stored;
                    book.synced = true;
                }
                Err(e) => {
                    warn!("Reminder list still unreadable, not saving: {}", e);
                    return;
                }
            }
        }
        if let Err(e) =
            storage::save_collection(self.store.as_ref(), REMINDERS_KEY, &book.entries).await
        {
            warn!("Failed to save reminder list: {}", e);
        }
    }

    async fn remember(&self, id: &RecordId, state: ReminderState) {
        let mut book = self.book.lock().await;
        book.states.insert(id.clone(), state);
        if book.entries.iter().any(|e| &e.record_id == id) {
            debug!("Reminder for {} already listed", id);
            return;
        }
        book.entries.push(ReminderEntry {
            record_id: id.clone(),
        });
        self.persist(&mut book).await;
    }

    async fn set_armed(&self, id: &RecordId, timer_armed: bool) {
        let mut book = self.book.lock().await;
        if book.entries.iter().any(|e| &e.record_id == id) {
            book.states
                .insert(id.clone(), ReminderState::PendingScheduled { timer_armed });
        }
    }

    async fn fire(&self, id: &RecordId, body: &str) {
        let mut book = self.book.lock().await;
        let Some(position) = book.entries.iter().position(|e| &e.record_id == id) else {
            debug!("Reminder for {} was cleared before it fired", id);
            return;
        };
        if let Err(e) = self.notifier.notify(&self.title, body) {
            warn!("Failed to show reminder for {}: {}", id, e);
        }
        book.entries.remove(position);
        book.states.insert(id.clone(), ReminderState::Fired);
        self.persist(&mut book).await;
        info!("Reminder for {} fired", id);
    }

    /// Permission, wait, notify. Runs as the task stored in `timers`.
    async fn run(self: Arc<Self>, id: RecordId, body: String, deadline: Instant) {
        let permission = match self.notifier.request_permission().await {
            Ok(permission) => permission,
            Err(e) => {
                debug!("Notification permission request failed: {}", e);
                Permission::Unavailable
            }
        };
        let timer_armed = permission == Permission::Granted;
        self.set_armed(&id, timer_armed).await;

        if timer_armed {
            tokio::time::sleep_until(deadline).await;
            self.fire(&id, &body).await;
        } else {
            debug!("Notifications not allowed ({:?}), listing only", permission);
        }
        self.timers.lock().await.remove(&id);
    }
}

/// Owns the reminder list and the timers armed in this session.
///
/// Dropping the scheduler (or calling [`ReminderScheduler::shutdown`]) cancels
/// every armed timer; the entries stay listed.
pub struct ReminderScheduler {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ReminderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderScheduler")
            .field("title", &self.shared.title)
            .finish_non_exhaustive()
    }
}

impl ReminderScheduler {
    /// Reads the persisted reminder list.
    ///
    /// An undecodable list starts empty. An unreadable one also starts empty
    /// but is merged back in before the first write.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        title: impl Into<String>,
    ) -> Self {
        let (entries, synced) =
            match storage::load_collection::<ReminderEntry>(store.as_ref(), REMINDERS_KEY).await {
                Ok(entries) => {
                    info!("Loaded {} reminder(s)", entries.len());
                    (entries, true)
                }
                Err(e) => {
                    warn!("Failed to read reminder list, will retry before writing: {}", e);
                    (Vec::new(), false)
                }
            };
        Self {
            shared: Arc::new(Shared {
                store,
                notifier,
                title: title.into(),
                book: Mutex::new(Book {
                    entries,
                    states: HashMap::new(),
                    synced,
                }),
                timers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Registers the reminder for a freshly completed donation.
    ///
    /// `now` is the current local time; the Mass time is interpreted in the
    /// same zone. The entry is listed before this returns; the permission
    /// request and the timer run in a background task, so a future Mass
    /// comes back as `PendingScheduled { timer_armed: false }` and
    /// [`ReminderScheduler::state`] reports the timer once it is armed.
    pub async fn schedule(&self, record: &DonationRecord, now: DateTime<Local>) -> ReminderState {
        let Some(intention) = record.mass_intention() else {
            return ReminderState::NotApplicable;
        };

        let target = Local.from_local_datetime(&record.scheduled_at());
        let Some(delay) = delay_until(target, &now) else {
            debug!("Reminder for {} is not in the future", record.id);
            let state = ReminderState::PendingUnscheduled;
            self.shared.remember(&record.id, state).await;
            return state;
        };

        let state = ReminderState::PendingScheduled { timer_armed: false };
        self.shared.remember(&record.id, state).await;

        let body = notification_body(intention, record);
        let deadline = Instant::now() + delay;
        let mut timers = self.shared.timers.lock().await;
        let task = Arc::clone(&self.shared).run(record.id.clone(), body, deadline);
        if let Some(previous) = timers.insert(record.id.clone(), tokio::spawn(task)) {
            previous.abort();
        }
        debug!("Reminder for {} due in {:?}", record.id, delay);
        state
    }

    /// Ids currently listed, oldest first
    pub async fn upcoming(&self) -> Vec<RecordId> {
        let book = self.shared.book.lock().await;
        book.entries.iter().map(|e| e.record_id.clone()).collect()
    }

    /// State of `id` as known to this session.
    ///
    /// Entries loaded from storage and not scheduled since count as
    /// pending-unscheduled; ids never seen are not applicable.
    pub async fn state(&self, id: &RecordId) -> ReminderState {
        let book = self.shared.book.lock().await;
        if let Some(state) = book.states.get(id) {
            return *state;
        }
        if book.entries.iter().any(|e| &e.record_id == id) {
            ReminderState::PendingUnscheduled
        } else {
            ReminderState::NotApplicable
        }
    }

    /// Removes an entry by hand and cancels its timer.
    ///
    /// Returns whether an entry was listed.
    pub async fn clear(&self, id: &RecordId) -> bool {
        if let Some(handle) = self.shared.timers.lock().await.remove(id) {
            handle.abort();
        }
        let mut book = self.shared.book.lock().await;
        let before = book.entries.len();
        book.entries.retain(|e| &e.record_id != id);
        book.states.remove(id);
        let removed = book.entries.len() != before;
        if removed {
            self.shared.persist(&mut book).await;
        }
        removed
    }

    /// Cancels every armed timer and pending permission request. Entries stay
    /// listed.
    pub async fn shutdown(&self) {
        let mut timers = self.shared.timers.lock().await;
        for (id, handle) in timers.drain() {
            debug!("Cancelling reminder timer for {}", id);
            handle.abort();
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        if let Ok(mut timers) = self.shared.timers.try_lock() {
            for (_, handle) in timers.drain() {
                handle.abort();
            }
        }
    }
}
