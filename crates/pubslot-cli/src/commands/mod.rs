pub mod config;
pub mod item;
pub mod publish;
pub mod schedule;

use chrono::{DateTime, FixedOffset, Utc};
use pubslot_core::time_of_day::format_12h;
use pubslot_core::{Config, FixedClock};

/// Clock for one command: `--now` when given, otherwise the wall clock,
/// expressed in the site time zone.
pub(crate) fn clock_for(
    config: &Config,
    now: Option<&str>,
) -> Result<FixedClock, Box<dyn std::error::Error>> {
    let zone = config.zone()?;
    let instant = match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| format!("invalid --now '{raw}': {e}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    Ok(FixedClock::at(instant, zone))
}

/// `Tue 2024-03-05 9:05 AM`
pub(crate) fn display_instant(at: &DateTime<FixedOffset>) -> String {
    format!("{} {}", at.format("%a %Y-%m-%d"), format_12h(at.time()))
}
