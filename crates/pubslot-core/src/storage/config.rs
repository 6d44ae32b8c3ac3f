//! TOML-based configuration.
//!
//! Stores the scheduler settings the host collaborator hands to the engine:
//! - Whether periodic runs are enabled and which item status is queued
//! - Daily capacity, publishing window, minimum spacing, active weekdays
//! - Site time zone and safety buffer
//! - Owner rotation pool, exclusions and strategy
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::clock::SiteZone;
use crate::engine::EngineConfig;
use crate::error::{ConfigError, ValidationError};
use crate::owner::{OwnerPolicy, OwnerStrategy, RotationState};
use crate::slots::SlotStrategy;
use crate::time_of_day::{format_24h, parse_time_of_day, parse_weekday};
use crate::window::{SchedulingWindow, WeekdaySet};

/// Scheduler section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Periodic runs do nothing while this is off; on-demand runs ignore it.
    #[serde(default)]
    pub enabled: bool,
    /// Status of items waiting to be scheduled.
    #[serde(default = "default_post_status")]
    pub post_status: String,
    #[serde(default = "default_posts_per_day")]
    pub posts_per_day: u32,
    #[serde(default = "default_start_time")]
    pub start_time: String, // HH:MM
    #[serde(default = "default_end_time")]
    pub end_time: String, // HH:MM
    #[serde(default = "default_days_active")]
    pub days_active: Vec<String>,
    /// Minimum minutes between two posts on the same day.
    #[serde(default = "default_min_interval")]
    pub min_interval: u32,
    /// IANA zone name (`Europe/Berlin`) or fixed offset (`+09:00`).
    #[serde(default = "default_timezone", alias = "utc_offset")]
    pub timezone: String,
    #[serde(default = "default_safety_buffer")]
    pub safety_buffer_minutes: u32,
    #[serde(default)]
    pub slot_strategy: SlotStrategy,
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
}

/// Owner rotation section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OwnerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub strategy: OwnerStrategy,
    /// Ids eligible to become the owner of a scheduled item.
    #[serde(default)]
    pub pool: Vec<String>,
    /// Ids never picked, even when present in `pool`.
    #[serde(default)]
    pub excluded: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub owner: OwnerConfig,
}

// Default functions
fn default_post_status() -> String {
    "draft".into()
}
fn default_posts_per_day() -> u32 {
    5
}
fn default_start_time() -> String {
    "09:00".into()
}
fn default_end_time() -> String {
    "18:00".into()
}
fn default_days_active() -> Vec<String> {
    ["monday", "tuesday", "wednesday", "thursday", "friday"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}
fn default_min_interval() -> u32 {
    30
}
fn default_timezone() -> String {
    "UTC".into()
}
fn default_safety_buffer() -> u32 {
    crate::cutoff::DEFAULT_SAFETY_BUFFER_MINUTES
}
fn default_run_timeout() -> u64 {
    30
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            post_status: default_post_status(),
            posts_per_day: default_posts_per_day(),
            start_time: default_start_time(),
            end_time: default_end_time(),
            days_active: default_days_active(),
            min_interval: default_min_interval(),
            timezone: default_timezone(),
            safety_buffer_minutes: default_safety_buffer(),
            slot_strategy: SlotStrategy::default(),
            run_timeout_secs: default_run_timeout(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Array(_) => {
                        let trimmed = value.trim();
                        if trimmed.starts_with('[') {
                            serde_json::from_str(trimmed).map_err(|e| invalid(e.to_string()))?
                        } else {
                            // Comma-separated shorthand: "monday,wednesday"
                            serde_json::Value::Array(
                                trimmed
                                    .split(',')
                                    .map(str::trim)
                                    .filter(|s| !s.is_empty())
                                    .map(|s| serde_json::Value::String(s.to_string()))
                                    .collect(),
                            )
                        }
                    }
                    serde_json::Value::Object(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    ///
    /// Times given in 12-hour form are stored as 24-hour `HH:MM`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// [`set`](Self::set) without touching the disk.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let mut updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.normalize().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Canonicalise free-form fields: times to `HH:MM`, weekday names to
    /// lowercase full names. Rejects values that do not parse at all.
    pub fn normalize(&mut self) -> Result<(), ValidationError> {
        let start = parse_time_of_day("start_time", &self.scheduler.start_time)?;
        let end = parse_time_of_day("end_time", &self.scheduler.end_time)?;
        let days = self.weekdays()?;
        let zone = self.zone()?;

        self.scheduler.timezone = zone.to_string();
        self.scheduler.start_time = format_24h(start);
        self.scheduler.end_time = format_24h(end);
        self.scheduler.days_active = days.names().into_iter().map(String::from).collect();
        Ok(())
    }

    pub fn weekdays(&self) -> Result<WeekdaySet, ValidationError> {
        self.scheduler
            .days_active
            .iter()
            .map(|d| parse_weekday(d))
            .collect::<Result<Vec<_>, _>>()
            .map(|days| days.into_iter().collect())
    }

    pub fn zone(&self) -> Result<SiteZone, ValidationError> {
        self.scheduler.timezone.parse()
    }

    /// Build and validate the scheduling window.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for unparseable fields or values outside
    /// the accepted ranges.
    pub fn window(&self) -> Result<SchedulingWindow, ValidationError> {
        SchedulingWindow::new(
            parse_time_of_day("start_time", &self.scheduler.start_time)?,
            parse_time_of_day("end_time", &self.scheduler.end_time)?,
            self.scheduler.min_interval,
            self.weekdays()?,
            self.scheduler.posts_per_day,
        )
    }

    pub fn engine_config(&self, seed: Option<u64>) -> Result<EngineConfig, ValidationError> {
        Ok(EngineConfig {
            slot_strategy: self.scheduler.slot_strategy,
            safety_buffer_minutes: self.scheduler.safety_buffer_minutes,
            zone: self.zone()?,
            seed,
        })
    }

    pub fn owner_policy(&self, state: RotationState) -> OwnerPolicy {
        OwnerPolicy {
            enabled: self.owner.enabled,
            strategy: self.owner.strategy,
            pool: self.owner.pool.clone(),
            excluded: self.owner.excluded.clone(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(!parsed.scheduler.enabled);
        assert_eq!(parsed.scheduler.posts_per_day, 5);
        assert_eq!(parsed.scheduler.slot_strategy, SlotStrategy::Corrected);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [scheduler]
            posts_per_day = 3
            days_active = ["monday", "wednesday"]

            [owner]
            strategy = "round_robin"
            pool = ["2", "3"]
            "#,
        )
        .unwrap();
        assert_eq!(parsed.scheduler.posts_per_day, 3);
        assert_eq!(parsed.scheduler.start_time, "09:00");
        assert_eq!(parsed.owner.strategy, OwnerStrategy::RoundRobin);
        assert!(!parsed.owner.enabled);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.scheduler.post_status, "draft");
        assert_eq!(cfg.scheduler.start_time, "09:00");
        assert_eq!(cfg.scheduler.end_time, "18:00");
        assert_eq!(cfg.scheduler.min_interval, 30);
        assert_eq!(cfg.scheduler.days_active.len(), 5);
        assert_eq!(cfg.scheduler.safety_buffer_minutes, 5);
        assert!(!cfg.owner.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scheduler.enabled").as_deref(), Some("false"));
        assert_eq!(cfg.get("scheduler.posts_per_day").as_deref(), Some("5"));
        assert_eq!(cfg.get("scheduler.start_time").as_deref(), Some("09:00"));
        assert!(cfg.get("scheduler.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("scheduler.enabled", "true").unwrap();
        cfg.apply("scheduler.posts_per_day", "8").unwrap();
        cfg.apply("owner.strategy", "round_robin").unwrap();
        assert!(cfg.scheduler.enabled);
        assert_eq!(cfg.scheduler.posts_per_day, 8);
        assert_eq!(cfg.owner.strategy, OwnerStrategy::RoundRobin);
    }

    #[test]
    fn apply_converts_12_hour_times() {
        let mut cfg = Config::default();
        cfg.apply("scheduler.end_time", "5:30 PM").unwrap();
        assert_eq!(cfg.scheduler.end_time, "17:30");
    }

    #[test]
    fn apply_accepts_comma_separated_lists() {
        let mut cfg = Config::default();
        cfg.apply("scheduler.days_active", "Wed, monday").unwrap();
        assert_eq!(cfg.scheduler.days_active, vec!["monday", "wednesday"]);
        cfg.apply("owner.pool", r#"["7","9"]"#).unwrap();
        assert_eq!(cfg.owner.pool, vec!["7", "9"]);
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("scheduler.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.apply("scheduler.enabled", "not_a_bool").is_err());
        assert!(cfg.apply("scheduler.start_time", "breakfast").is_err());
        assert!(cfg.apply("scheduler.days_active", "funday").is_err());
        assert!(cfg.apply("owner.strategy", "lottery").is_err());
        // Failed updates leave the config untouched.
        assert_eq!(cfg.scheduler.start_time, "09:00");
    }

    #[test]
    fn window_from_defaults() {
        let window = Config::default().window().unwrap();
        assert_eq!(window.start_of_day, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(window.daily_capacity, 5);
        assert!(window.eligible_weekdays.contains(Weekday::Fri));
        assert!(!window.eligible_weekdays.contains(Weekday::Sat));
    }

    #[test]
    fn window_rejects_reversed_range() {
        let mut cfg = Config::default();
        cfg.scheduler.start_time = "18:00".into();
        cfg.scheduler.end_time = "09:00".into();
        assert!(matches!(
            cfg.window(),
            Err(ValidationError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn timezone_accepts_names_and_legacy_offset_key() {
        let mut cfg = Config::default();
        assert_eq!(cfg.zone().unwrap(), SiteZone::utc());

        cfg.apply("scheduler.timezone", "Asia/Tokyo").unwrap();
        assert_eq!(cfg.engine_config(None).unwrap().zone.to_string(), "Asia/Tokyo");
        assert!(cfg.apply("scheduler.timezone", "Nowhere/Special").is_err());
        assert_eq!(cfg.scheduler.timezone, "Asia/Tokyo");

        let parsed: Config = toml::from_str(
            r#"
            [scheduler]
            utc_offset = "+09:00"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.zone().unwrap().to_string(), "+09:00");
    }

    #[test]
    fn owner_policy_carries_state() {
        let mut cfg = Config::default();
        cfg.owner.enabled = true;
        cfg.owner.pool = vec!["2".into()];
        let policy = cfg.owner_policy(RotationState { current_index: 3 });
        assert!(policy.enabled);
        assert_eq!(policy.state.current_index, 3);
    }
}
