//! Wall-clock helpers: time-of-day parsing, minute arithmetic, UTC offsets.
//!
//! Slots are whole minutes, so everything here works in minutes since
//! midnight. Time input accepts the 24-hour `HH:MM` form used in the config
//! file as well as the 12-hour `h:MM AM` form people tend to type.

use chrono::{FixedOffset, NaiveTime, Timelike, Weekday};

use crate::error::ValidationError;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse a time of day from `HH:MM` (24-hour) or `h:MM AM` (12-hour).
pub fn parse_time_of_day(field: &str, input: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();
    let parsed = if upper.ends_with("AM") || upper.ends_with("PM") {
        NaiveTime::parse_from_str(&upper, "%I:%M %p")
            .or_else(|_| NaiveTime::parse_from_str(&upper, "%I:%M%p"))
    } else {
        NaiveTime::parse_from_str(trimmed, "%H:%M")
    };

    parsed.map_err(|_| ValidationError::InvalidValue {
        field: field.to_string(),
        message: format!("'{input}' is not a time of day (expected HH:MM or h:MM AM)"),
    })
}

/// Format as 24-hour `HH:MM`, the storage form.
pub fn format_24h(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Format as 12-hour `h:MM AM`, the display form.
pub fn format_12h(time: NaiveTime) -> String {
    let (is_pm, hour) = time.hour12();
    format!("{}:{:02} {}", hour, time.minute(), if is_pm { "PM" } else { "AM" })
}

/// Minutes since midnight, seconds discarded.
pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Inverse of [`minutes_of_day`]; `None` past 23:59.
pub fn from_minutes(minutes: u32) -> Option<NaiveTime> {
    if minutes >= MINUTES_PER_DAY {
        return None;
    }
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM`, `Z` or `UTC` into a fixed offset.
pub fn parse_utc_offset(input: &str) -> Result<FixedOffset, ValidationError> {
    let invalid = || ValidationError::InvalidValue {
        field: "utc_offset".to_string(),
        message: format!("'{input}' is not a UTC offset (expected +HH:MM)"),
    };

    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Format an offset as `+HH:MM`.
pub fn format_utc_offset(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

/// Parse a weekday name such as `monday` or `Mon`.
pub fn parse_weekday(input: &str) -> Result<Weekday, ValidationError> {
    input
        .trim()
        .parse::<Weekday>()
        .map_err(|_| ValidationError::InvalidValue {
            field: "days_active".to_string(),
            message: format!("'{input}' is not a day of the week"),
        })
}

/// Lowercase full weekday name, the config file form.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
