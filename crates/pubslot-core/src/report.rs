//! Per-run report: what happened to each day and each item.
//!
//! Everything the engine handles locally ends up here as a
//! [`ScheduleIssue`]; nothing in this module is ever returned as `Err`.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cutoff::CutoffReason;

/// Locally handled conditions recorded during a run.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleIssue {
    /// The window is too narrow for the configured daily capacity.
    #[error("configuration warning: {message}")]
    ConfigurationWarning { message: String },

    /// Day walking found no eligible weekday and fell back to the naive date.
    #[error("no eligible day within {horizon_days} days of {from}; falling back to {fallback}")]
    NoEligibleDayFound {
        from: NaiveDate,
        fallback: NaiveDate,
        horizon_days: u32,
    },

    /// The day's slot bucket ran out before its capacity was reached.
    #[error("no free slot left on {date}")]
    SlotUnavailable { date: NaiveDate },

    /// The composed instant was not strictly after the run's `now`.
    #[error("instant {at} is not after {now}")]
    PastInstantRejected {
        at: DateTime<FixedOffset>,
        now: DateTime<FixedOffset>,
    },

    /// The run was handed an empty queue.
    #[error("no items to schedule")]
    NoItemsToSchedule,

    /// Today could not take any assignment.
    #[error("today ({date}) skipped: {reason}")]
    TodaySkipped { date: NaiveDate, reason: CutoffReason },
}

/// Slot usage for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayReport {
    pub date: NaiveDate,
    /// Capacity requested from the slot generator for this date.
    pub capacity: u32,
    pub slots_generated: usize,
    pub assigned: usize,
    /// Set when the date is today and its window start was pulled forward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_start: Option<NaiveTime>,
}

/// Final state of one item after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Scheduled {
        at: DateTime<FixedOffset>,
        owner_id: String,
        owner_changed: bool,
    },
    Skipped {
        reason: ScheduleIssue,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub item_id: String,
    pub title: String,
    pub outcome: Outcome,
}

impl ItemOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self.outcome, Outcome::Scheduled { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub generated_at: DateTime<FixedOffset>,
    pub days: Vec<DayReport>,
    pub outcomes: Vec<ItemOutcome>,
    /// Run-level issues (configuration warnings, day-walk fallbacks,
    /// skipped today). Per-item skips live in `outcomes`.
    pub issues: Vec<ScheduleIssue>,
}

impl ScheduleReport {
    pub fn new(generated_at: DateTime<FixedOffset>) -> Self {
        Self {
            generated_at,
            days: Vec::new(),
            outcomes: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn scheduled_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_scheduled()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.scheduled_count()
    }

    /// One-line outcome suitable for a status message.
    pub fn summary(&self) -> String {
        if self.outcomes.is_empty() && self.issues.contains(&ScheduleIssue::NoItemsToSchedule) {
            return "No posts found to schedule.".to_string();
        }
        let mut line = format!("Successfully scheduled {} posts.", self.scheduled_count());
        let skipped = self.skipped_count();
        if skipped > 0 {
            line.push_str(&format!(" {skipped} skipped."));
        }
        line
    }

    pub(crate) fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DayReport> {
        self.days.iter_mut().rev().find(|d| d.date == date)
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  ! {issue}")?;
        }
        for day in &self.days {
            write!(
                f,
                "  {} {}/{} (slots generated: {})",
                day.date, day.assigned, day.capacity, day.slots_generated
            )?;
            if let Some(start) = day.effective_start {
                write!(f, " from {}", start.format("%H:%M"))?;
            }
            writeln!(f)?;
        }
        for item in &self.outcomes {
            match &item.outcome {
                Outcome::Scheduled { at, owner_id, owner_changed } => {
                    write!(f, "  + {} \"{}\" at {}", item.item_id, item.title, at.format("%Y-%m-%d %H:%M"))?;
                    if *owner_changed {
                        write!(f, " (owner -> {owner_id})")?;
                    }
                    writeln!(f)?;
                }
                Outcome::Skipped { reason } => {
                    writeln!(f, "  - {} \"{}\" skipped: {}", item.item_id, item.title, reason)?;
                }
            }
        }
        Ok(())
    }
}
