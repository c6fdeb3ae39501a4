//! Reminder scheduling contract.
//!
//! Job generation and delivery live outside this crate; repositories and
//! services only emit scheduling requests, exactly once per mutation.

use chrono::NaiveDate;

/// External job-store key for one reminder occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReminderKey {
    pub entity_id: String,
    pub target_date: NaiveDate,
}

/// Request to schedule a reminder occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub key: ReminderKey,
    /// Local wall-clock time, "HH:MM".
    pub time: String,
}

/// Scheduling side-effect sink implemented by the hosting runtime.
pub trait ReminderScheduler: Send + Sync {
    fn schedule(&self, request: ReminderRequest);
    fn cancel(&self, key: &ReminderKey);
}

/// Default sink for hosts without reminder support.
pub struct NoOpReminderScheduler;

impl ReminderScheduler for NoOpReminderScheduler {
    fn schedule(&self, _request: ReminderRequest) {}
    fn cancel(&self, _key: &ReminderKey) {}
}
