//! In-memory publish queue with a single dispatch handler.
//!
//! Holds one target instant per item id. Scheduling the same id again
//! replaces its entry, so a rescheduled item is never published twice.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::storage::{ItemRecord, STATUS_FUTURE};

/// Delay before a failed publish is attempted again.
pub const RETRY_DELAY_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishEntry {
    pub item_id: String,
    pub title: String,
    pub due_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub attempts: u32,
}

/// Receives every due entry. Exactly one handler serves a queue.
pub trait PublishHandler {
    fn publish(&mut self, entry: &PublishEntry) -> Result<(), CoreError>;
}

impl<F> PublishHandler for F
where
    F: FnMut(&PublishEntry) -> Result<(), CoreError>,
{
    fn publish(&mut self, entry: &PublishEntry) -> Result<(), CoreError> {
        self(entry)
    }
}

/// What one dispatch pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub published: Vec<String>,
    /// Item id and error message; these entries were re-queued.
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct PublishQueue {
    pending: HashMap<String, PublishEntry>,
}

impl PublishQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue every `future` record that carries a publication instant.
    pub fn from_records(records: &[ItemRecord]) -> Self {
        let mut queue = Self::new();
        for record in records.iter().filter(|r| r.status == STATUS_FUTURE) {
            if let Some(due_at) = record.publish_at {
                queue.schedule(&record.id, &record.title, due_at);
            }
        }
        queue
    }

    /// Add or replace the entry for `item_id`.
    pub fn schedule(&mut self, item_id: &str, title: &str, due_at: DateTime<FixedOffset>) {
        self.pending.insert(
            item_id.to_string(),
            PublishEntry {
                item_id: item_id.to_string(),
                title: title.to_string(),
                due_at,
                attempts: 0,
            },
        );
    }

    pub fn cancel(&mut self, item_id: &str) -> Option<PublishEntry> {
        self.pending.remove(item_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest entry.
    pub fn next_due(&self) -> Option<&PublishEntry> {
        self.pending
            .values()
            .min_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.item_id.cmp(&b.item_id)))
    }

    /// Time until the earliest entry is due; zero when already overdue.
    pub fn time_until_next(&self, now: DateTime<FixedOffset>) -> Option<Duration> {
        self.next_due().map(|entry| {
            if entry.due_at > now {
                entry.due_at - now
            } else {
                Duration::zero()
            }
        })
    }

    /// Remove and return every entry due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: DateTime<FixedOffset>) -> Vec<PublishEntry> {
        let mut ready = Vec::new();
        self.pending.retain(|_, entry| {
            if entry.due_at <= now {
                ready.push(entry.clone());
                false
            } else {
                true
            }
        });
        ready.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.item_id.cmp(&b.item_id)));
        ready
    }

    /// Hand every due entry to `handler`. Failures are re-queued
    /// [`RETRY_DELAY_SECS`] after `now`.
    pub fn dispatch_due<H: PublishHandler + ?Sized>(
        &mut self,
        now: DateTime<FixedOffset>,
        handler: &mut H,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for mut entry in self.drain_due(now) {
            match handler.publish(&entry) {
                Ok(()) => {
                    debug!(item = %entry.item_id, due_at = %entry.due_at, "published");
                    summary.published.push(entry.item_id);
                }
                Err(e) => {
                    warn!(item = %entry.item_id, error = %e, "publish failed, re-queued");
                    summary.failed.push((entry.item_id.clone(), e.to_string()));
                    entry.attempts += 1;
                    entry.due_at = now + Duration::seconds(RETRY_DELAY_SECS);
                    // A newer schedule() for the same id wins over the retry.
                    self.pending.entry(entry.item_id.clone()).or_insert(entry);
                }
            }
        }
        summary
    }
}
