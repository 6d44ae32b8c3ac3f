//! # Pubslot Core Library
//!
//! This library spreads a queue of content items over future publishing days.
//! Each item gets a randomized, minimum-spaced time-of-day inside a daily
//! window, on an allowed weekday, never in the past, with at most a fixed
//! number of items per day. Optionally it also picks a new owner for each
//! item from a rotation pool.
//!
//! ## Architecture
//!
//! - **Engine**: pure scheduling over a caller-supplied clock instant, window
//!   and owner policy. Returns assignments plus a report; persists nothing.
//! - **Storage**: SQLite item store and TOML-based configuration
//! - **Trigger**: single-flight guard, cross-process run lock and deadline
//!   around each run
//! - **Publish queue**: one target instant per item, dispatched through a
//!   single handler
//!
//! ## Key Components
//!
//! - [`DistributionEngine`]: assigns publication instants to items
//! - [`SlotGenerator`]: randomized, spaced slots within one day
//! - [`DayWalker`]: offset-to-date resolution over eligible weekdays
//! - [`CutoffEvaluator`]: how much of today is still usable
//! - [`OwnerRotator`]: random or round-robin owner selection
//! - [`ScheduleRunner`]: one run against the [`ItemStore`]
//! - [`Config`]: application configuration management

pub mod clock;
pub mod cutoff;
pub mod day_walker;
pub mod engine;
pub mod error;
pub mod owner;
pub mod publish_queue;
pub mod report;
pub mod runner;
pub mod slots;
pub mod storage;
pub mod time_of_day;
pub mod trigger;
pub mod window;

pub use clock::{ClockSource, FixedClock, SiteZone, SystemClock};
pub use cutoff::{CutoffEvaluator, CutoffReason, TodayCutoff};
pub use day_walker::{DayWalker, ResolvedDay};
pub use engine::{Assignment, DistributionEngine, EngineConfig, Item, ScheduleOutcome};
pub use error::{ConfigError, CoreError, DatabaseError, TriggerError, ValidationError};
pub use owner::{OwnerPolicy, OwnerRotator, OwnerStrategy, RotationState};
pub use publish_queue::{DispatchSummary, PublishEntry, PublishHandler, PublishQueue};
pub use report::{DayReport, ItemOutcome, Outcome, ScheduleIssue, ScheduleReport};
pub use runner::{LastRun, RunGuard, RunRequest, RunResult, RunSkip, RunStatus, ScheduleRunner};
pub use slots::{SlotGenerator, SlotStrategy};
pub use storage::{Config, ItemRecord, ItemStore, RunLock, StatusCounts};
pub use trigger::{FlightPermit, SingleFlight, TriggerKind};
pub use window::{SchedulingWindow, WeekdaySet};
