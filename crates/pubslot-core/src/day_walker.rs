//! Calendar walking: from a base date and a day offset to the next date
//! whose weekday is eligible.

use chrono::{Datelike, Duration, NaiveDate};

use crate::window::WeekdaySet;

/// How far ahead to look for an eligible weekday before giving up.
pub const SEARCH_HORIZON_DAYS: u32 = 14;

/// A resolved target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDay {
    pub date: NaiveDate,
    /// No eligible weekday was found within the horizon; `date` is the naive
    /// `base + offset`.
    pub fell_back: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DayWalker {
    horizon_days: u32,
}

impl Default for DayWalker {
    fn default() -> Self {
        Self {
            horizon_days: SEARCH_HORIZON_DAYS,
        }
    }
}

impl DayWalker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// The first eligible date on or after `base + day_offset`.
    pub fn next_eligible_date(
        &self,
        base: NaiveDate,
        day_offset: u32,
        eligible: WeekdaySet,
    ) -> NaiveDate {
        self.resolve(base, day_offset, eligible).date
    }

    /// Like [`next_eligible_date`](Self::next_eligible_date) but reports
    /// whether the horizon guard was hit.
    pub fn resolve(&self, base: NaiveDate, day_offset: u32, eligible: WeekdaySet) -> ResolvedDay {
        let naive = base + Duration::days(i64::from(day_offset));

        if eligible.is_empty() {
            return ResolvedDay {
                date: naive,
                fell_back: false,
            };
        }

        (0..self.horizon_days)
            .map(|step| naive + Duration::days(i64::from(step)))
            .find(|date| eligible.contains(date.weekday()))
            .map(|date| ResolvedDay {
                date,
                fell_back: false,
            })
            .unwrap_or(ResolvedDay {
                date: naive,
                fell_back: true,
            })
    }
}
