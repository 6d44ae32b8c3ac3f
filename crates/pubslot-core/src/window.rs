//! The daily publishing window: when, how often, and on which days.

use chrono::{NaiveTime, Weekday};

use crate::error::ValidationError;
use crate::report::ScheduleIssue;
use crate::time_of_day::{format_24h, minutes_of_day, weekday_name};

pub const MIN_DAILY_CAPACITY: u32 = 1;
pub const MAX_DAILY_CAPACITY: u32 = 50;
pub const MIN_INTERVAL_MINUTES: u32 = 5;
pub const MAX_INTERVAL_MINUTES: u32 = 1440;

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A set of days of the week, stored as a 7-bit mask (bit 0 = Monday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b111_1111)
    }

    /// Monday through Friday.
    pub const fn work_week() -> Self {
        Self(0b001_1111)
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in Monday-first order.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        ALL_DAYS.into_iter().filter(move |d| self.contains(*d))
    }

    /// An empty set means "no filtering": every day is eligible.
    pub fn allows(self, day: Weekday) -> bool {
        self.is_empty() || self.contains(day)
    }

    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(weekday_name).collect()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

/// Scheduling constraints for one run.
///
/// Built once by the collaborator (usually via
/// [`Config::window`](crate::storage::Config::window)) and passed by
/// reference into every engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingWindow {
    pub start_of_day: NaiveTime,
    pub end_of_day: NaiveTime,
    pub min_interval_minutes: u32,
    pub eligible_weekdays: WeekdaySet,
    pub daily_capacity: u32,
}

impl SchedulingWindow {
    /// Build and validate a window.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if the range is empty or reversed, or a
    /// numeric setting is outside its accepted range.
    pub fn new(
        start_of_day: NaiveTime,
        end_of_day: NaiveTime,
        min_interval_minutes: u32,
        eligible_weekdays: WeekdaySet,
        daily_capacity: u32,
    ) -> Result<Self, ValidationError> {
        let window = Self {
            start_of_day,
            end_of_day,
            min_interval_minutes,
            eligible_weekdays,
            daily_capacity,
        };
        window.validate()?;
        Ok(window)
    }

    /// Reject configurations the engine cannot work with at all.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if minutes_of_day(self.end_of_day) <= minutes_of_day(self.start_of_day) {
            return Err(ValidationError::InvalidTimeRange {
                start: self.start_of_day,
                end: self.end_of_day,
            });
        }
        check_range(
            "posts_per_day",
            self.daily_capacity,
            MIN_DAILY_CAPACITY,
            MAX_DAILY_CAPACITY,
        )?;
        check_range(
            "min_interval",
            self.min_interval_minutes,
            MIN_INTERVAL_MINUTES,
            MAX_INTERVAL_MINUTES,
        )?;
        Ok(())
    }

    /// Length of the window in whole minutes.
    pub fn window_minutes(&self) -> u32 {
        minutes_of_day(self.end_of_day).saturating_sub(minutes_of_day(self.start_of_day))
    }

    /// Non-fatal: a full day cannot hold `daily_capacity` slots spaced
    /// `min_interval_minutes` apart.
    pub fn capacity_warning(&self) -> Option<ScheduleIssue> {
        let needed = self.daily_capacity.saturating_sub(1) * self.min_interval_minutes;
        if needed >= self.window_minutes() {
            Some(ScheduleIssue::ConfigurationWarning {
                message: format!(
                    "{}-{} ({} min) cannot fit {} posts {} min apart; days will be under-filled",
                    format_24h(self.start_of_day),
                    format_24h(self.end_of_day),
                    self.window_minutes(),
                    self.daily_capacity,
                    self.min_interval_minutes,
                ),
            })
        } else {
            None
        }
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn weekday_set_membership() {
        let set: WeekdaySet = [Weekday::Mon, Weekday::Wed].into_iter().collect();
        assert!(set.contains(Weekday::Mon));
        assert!(!set.contains(Weekday::Tue));
        assert_eq!(set.len(), 2);
        assert_eq!(set.names(), vec!["monday", "wednesday"]);
        assert_eq!(WeekdaySet::work_week().len(), 5);
        assert!(!WeekdaySet::work_week().contains(Weekday::Sat));
    }

    #[test]
    fn empty_set_allows_every_day() {
        assert!(WeekdaySet::empty().allows(Weekday::Sun));
        let set: WeekdaySet = [Weekday::Fri].into_iter().collect();
        assert!(!set.allows(Weekday::Sun));
    }

    #[test]
    fn rejects_reversed_or_empty_range() {
        let err = SchedulingWindow::new(t(18, 0), t(9, 0), 30, WeekdaySet::all(), 5).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimeRange { .. }));
        let err = SchedulingWindow::new(t(9, 0), t(9, 0), 30, WeekdaySet::all(), 5).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimeRange { .. }));
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert!(SchedulingWindow::new(t(9, 0), t(18, 0), 30, WeekdaySet::all(), 0).is_err());
        assert!(SchedulingWindow::new(t(9, 0), t(18, 0), 30, WeekdaySet::all(), 51).is_err());
        assert!(SchedulingWindow::new(t(9, 0), t(18, 0), 4, WeekdaySet::all(), 5).is_err());
        assert!(SchedulingWindow::new(t(9, 0), t(18, 0), 1441, WeekdaySet::all(), 5).is_err());
    }

    #[test]
    fn narrow_window_is_a_warning_not_an_error() {
        let window = SchedulingWindow::new(t(9, 0), t(10, 0), 30, WeekdaySet::all(), 3).unwrap();
        assert_eq!(window.window_minutes(), 60);
        assert!(matches!(
            window.capacity_warning(),
            Some(ScheduleIssue::ConfigurationWarning { .. })
        ));

        let roomy = SchedulingWindow::new(t(9, 0), t(12, 0), 30, WeekdaySet::all(), 3).unwrap();
        assert!(roomy.capacity_warning().is_none());
    }
}
