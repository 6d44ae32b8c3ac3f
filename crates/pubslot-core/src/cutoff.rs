//! Whether "today" can still take assignments, and from what time.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::time_of_day::{from_minutes, minutes_of_day};
use crate::window::SchedulingWindow;

/// Minutes added to `now` before the first usable slot, so an instant
/// cannot slip into the past while the caller is persisting it.
pub const DEFAULT_SAFETY_BUFFER_MINUTES: u32 = 5;

/// Why today was ruled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CutoffReason {
    IneligibleWeekday,
    PastEndOfDay,
    NotEnoughRoom { remaining_minutes: u32 },
}

impl fmt::Display for CutoffReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoffReason::IneligibleWeekday => write!(f, "not an active day"),
            CutoffReason::PastEndOfDay => write!(f, "publishing window already closed"),
            CutoffReason::NotEnoughRoom { remaining_minutes } => {
                write!(f, "only {remaining_minutes} min left, less than one interval")
            }
        }
    }
}

/// Verdict for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodayCutoff {
    pub usable: bool,
    /// Narrowed window start; the configured start when unusable.
    pub effective_start: NaiveTime,
    /// Slots to request for today; zero when unusable.
    pub capacity_today: u32,
    pub reason: Option<CutoffReason>,
}

impl TodayCutoff {
    fn unusable(window: &SchedulingWindow, reason: CutoffReason) -> Self {
        Self {
            usable: false,
            effective_start: window.start_of_day,
            capacity_today: 0,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CutoffEvaluator {
    safety_buffer_minutes: u32,
}

impl Default for CutoffEvaluator {
    fn default() -> Self {
        Self {
            safety_buffer_minutes: DEFAULT_SAFETY_BUFFER_MINUTES,
        }
    }
}

impl CutoffEvaluator {
    pub fn new(safety_buffer_minutes: u32) -> Self {
        Self {
            safety_buffer_minutes,
        }
    }

    pub fn safety_buffer_minutes(&self) -> u32 {
        self.safety_buffer_minutes
    }

    pub fn evaluate_today(
        &self,
        now: DateTime<FixedOffset>,
        window: &SchedulingWindow,
    ) -> TodayCutoff {
        if !window.eligible_weekdays.allows(now.weekday()) {
            return TodayCutoff::unusable(window, CutoffReason::IneligibleWeekday);
        }

        let now_time = now.time();
        if now_time >= window.end_of_day {
            return TodayCutoff::unusable(window, CutoffReason::PastEndOfDay);
        }

        // Round a partial minute up before adding the buffer. Slots are whole
        // minutes and must stay strictly after `now`, even with no buffer.
        let floor_min = minutes_of_day(now_time);
        let ceil_min = if now_time.second() > 0 || now_time.nanosecond() > 0 {
            floor_min + 1
        } else {
            floor_min
        };

        let start_min = minutes_of_day(window.start_of_day);
        let end_min = minutes_of_day(window.end_of_day);
        let effective = (ceil_min + self.safety_buffer_minutes)
            .max(floor_min + 1)
            .max(start_min);
        let remaining = end_min.saturating_sub(effective);

        if remaining < window.min_interval_minutes {
            return TodayCutoff::unusable(
                window,
                CutoffReason::NotEnoughRoom {
                    remaining_minutes: remaining,
                },
            );
        }

        let Some(effective_start) = from_minutes(effective) else {
            return TodayCutoff::unusable(window, CutoffReason::PastEndOfDay);
        };

        // Largest k with (k - 1) * interval < remaining, so the slot
        // generator never sees an infeasible request.
        let fits = (remaining - 1) / window.min_interval_minutes + 1;

        TodayCutoff {
            usable: true,
            effective_start,
            capacity_today: window.daily_capacity.min(fits),
            reason: None,
        }
    }
}
