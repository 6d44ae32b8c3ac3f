//! Sources of "now" in the operating time zone.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time_of_day::{format_utc_offset, parse_utc_offset};

/// The site time zone: an IANA name that follows DST, or a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SiteZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl SiteZone {
    pub fn utc() -> Self {
        SiteZone::Named(Tz::UTC)
    }

    /// `instant` as wall time in this zone, carrying the offset in force at
    /// that instant.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            SiteZone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
            SiteZone::Fixed(offset) => instant.with_timezone(offset),
        }
    }

    /// The absolute instant for a civil date and time in this zone.
    ///
    /// A time repeated by a backward DST shift resolves to its first
    /// occurrence. A time skipped by a forward shift does not exist and
    /// yields `None`.
    pub fn resolve_local(&self, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            SiteZone::Named(tz) => earliest(tz.from_local_datetime(&local)),
            SiteZone::Fixed(offset) => earliest(offset.from_local_datetime(&local)),
        }
    }
}

fn earliest<T: TimeZone>(result: LocalResult<DateTime<T>>) -> Option<DateTime<FixedOffset>> {
    match result {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => Some(at.fixed_offset()),
        LocalResult::None => None,
    }
}

impl Default for SiteZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl FromStr for SiteZone {
    type Err = ValidationError;

    /// Accepts `Asia/Tokyo`-style names first, then `+HH:MM` offsets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(tz) = trimmed.parse::<Tz>() {
            return Ok(SiteZone::Named(tz));
        }
        parse_utc_offset(trimmed)
            .map(SiteZone::Fixed)
            .map_err(|_| ValidationError::InvalidValue {
                field: "timezone".to_string(),
                message: format!(
                    "'{s}' is neither a time zone name (e.g. Europe/Berlin) nor a UTC offset (+HH:MM)"
                ),
            })
    }
}

impl TryFrom<String> for SiteZone {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SiteZone> for String {
    fn from(zone: SiteZone) -> Self {
        zone.to_string()
    }
}

impl fmt::Display for SiteZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteZone::Named(tz) => f.write_str(tz.name()),
            SiteZone::Fixed(offset) => f.write_str(&format_utc_offset(*offset)),
        }
    }
}

/// Supplies the current instant, already expressed in the site zone.
///
/// The civil date and time-of-day the engine reasons about come from
/// `now().date_naive()` / `now().time()`.
pub trait ClockSource {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock converted to the site zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: SiteZone,
}

impl SystemClock {
    pub fn new(zone: SiteZone) -> Self {
        Self { zone }
    }
}

impl ClockSource for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.zone.localize(Utc::now())
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }

    /// Re-express `instant` in `zone` and freeze it.
    pub fn at(instant: DateTime<Utc>, zone: SiteZone) -> Self {
        Self {
            instant: zone.localize(instant),
        }
    }
}

impl ClockSource for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.instant
    }
}
