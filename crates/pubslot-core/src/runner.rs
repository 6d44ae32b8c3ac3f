//! One scheduling run against the item store.
//!
//! [`ScheduleRunner`] is the collaborator side of the engine: it reads the
//! configuration and the pending queue, calls
//! [`DistributionEngine::schedule`], and writes the assignments, rotation
//! state and run summary back. [`RunGuard`] wraps it with the single-flight
//! guard, the cross-process lock and the run deadline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::ClockSource;
use crate::engine::{Assignment, DistributionEngine, Item};
use crate::error::{CoreError, TriggerError};
use crate::report::ScheduleReport;
use crate::storage::{Config, ItemStore, RunLock};
use crate::time_of_day::weekday_name;
use crate::trigger::{run_with_deadline, SingleFlight, TriggerKind};

/// Lock scope shared by every scheduling run.
pub const SCHEDULE_SCOPE: &str = "schedule";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub kind: TriggerKind,
    /// Fixed RNG seed for reproducible placement.
    pub seed: Option<u64>,
    /// Compute the schedule but persist nothing.
    pub dry_run: bool,
}

impl RunRequest {
    pub fn new(kind: TriggerKind) -> Self {
        Self {
            kind,
            seed: None,
            dry_run: false,
        }
    }
}

/// Why a periodic run did nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RunSkip {
    Disabled,
    InactiveDay { weekday: String },
}

impl fmt::Display for RunSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSkip::Disabled => write!(f, "scheduler is disabled"),
            RunSkip::InactiveDay { weekday } => write!(f, "{weekday} is not an active day"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Skipped {
        reason: RunSkip,
    },
    Completed {
        report: ScheduleReport,
        assignments: Vec<Assignment>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub kind: TriggerKind,
    pub dry_run: bool,
    pub started_at: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub status: RunStatus,
}

impl RunResult {
    pub fn summary(&self) -> String {
        match &self.status {
            RunStatus::Skipped { reason } => format!("Nothing to do: {reason}."),
            RunStatus::Completed { report, .. } => report.summary(),
        }
    }
}

/// Persisted after every non-dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRun {
    pub at: DateTime<FixedOffset>,
    pub kind: TriggerKind,
    pub scheduled: usize,
    pub skipped: usize,
}

pub struct ScheduleRunner<'a> {
    config: &'a Config,
    store: &'a ItemStore,
}

impl<'a> ScheduleRunner<'a> {
    pub fn new(config: &'a Config, store: &'a ItemStore) -> Self {
        Self { config, store }
    }

    /// Run once with no deadline.
    pub fn run(
        &self,
        request: &RunRequest,
        clock: &impl ClockSource,
    ) -> Result<RunResult, CoreError> {
        self.run_until(request, clock, None)
    }

    /// Run once; nothing is written if `deadline` has passed by the time the
    /// schedule is computed.
    ///
    /// # Errors
    /// Invalid configuration, store failures, or
    /// [`TriggerError::DeadlineExceeded`].
    pub fn run_until(
        &self,
        request: &RunRequest,
        clock: &impl ClockSource,
        deadline: Option<(Instant, Duration)>,
    ) -> Result<RunResult, CoreError> {
        let now = clock.now();
        let window = self.config.window()?;
        let scheduler = &self.config.scheduler;

        let finish = |status| RunResult {
            kind: request.kind,
            dry_run: request.dry_run,
            started_at: now,
            status,
        };

        if request.kind == TriggerKind::Periodic {
            if !scheduler.enabled {
                info!(trigger = %request.kind, "scheduler disabled, skipping run");
                return Ok(finish(RunStatus::Skipped {
                    reason: RunSkip::Disabled,
                }));
            }
            // Unlike slot placement, an empty active-day list never matches.
            if !window.eligible_weekdays.contains(now.weekday()) {
                let weekday = weekday_name(now.weekday()).to_string();
                info!(trigger = %request.kind, %weekday, "inactive day, skipping run");
                return Ok(finish(RunStatus::Skipped {
                    reason: RunSkip::InactiveDay { weekday },
                }));
            }
        }

        let limit = request.kind.batch_size(scheduler.posts_per_day);
        let items: Vec<Item> = self
            .store
            .pending_items(&scheduler.post_status, limit)?
            .iter()
            .map(|record| record.to_item())
            .collect();

        let policy = self.config.owner_policy(self.store.rotation_state()?);
        let engine = DistributionEngine::with_config(self.config.engine_config(request.seed)?);
        let outcome = engine.schedule(&items, &window, &policy, now)?;

        if !request.dry_run {
            if let Some((at, timeout)) = deadline {
                if Instant::now() >= at {
                    warn!("run deadline passed before persisting, discarding schedule");
                    return Err(TriggerError::DeadlineExceeded {
                        timeout_secs: timeout.as_secs(),
                    }
                    .into());
                }
            }

            self.store
                .apply_assignments(&outcome.assignments, &scheduler.post_status)?;
            if policy.enabled {
                self.store.set_rotation_state(outcome.rotation)?;
            }
            self.store.set_last_run(&LastRun {
                at: now,
                kind: request.kind,
                scheduled: outcome.report.scheduled_count(),
                skipped: outcome.report.skipped_count(),
            })?;
        }

        info!(
            trigger = %request.kind,
            dry_run = request.dry_run,
            scheduled = outcome.report.scheduled_count(),
            skipped = outcome.report.skipped_count(),
            "scheduling run finished"
        );

        Ok(finish(RunStatus::Completed {
            report: outcome.report,
            assignments: outcome.assignments,
        }))
    }
}

/// Exclusive, deadline-bounded runs against the store in one data directory.
#[derive(Debug, Clone)]
pub struct RunGuard {
    flights: SingleFlight,
    data_dir: PathBuf,
}

impl RunGuard {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            flights: SingleFlight::new(),
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Acquire both locks, then run on the blocking pool under the configured
    /// timeout.
    ///
    /// # Errors
    /// [`TriggerError::RunInProgress`] if another run holds either lock, plus
    /// everything [`ScheduleRunner::run_until`] can return.
    pub async fn run<C>(
        &self,
        config: Config,
        request: RunRequest,
        clock: C,
    ) -> Result<RunResult, CoreError>
    where
        C: ClockSource + Send + 'static,
    {
        let timeout = Duration::from_secs(config.scheduler.run_timeout_secs);
        let permit = self.flights.try_acquire(SCHEDULE_SCOPE)?;
        let lock = RunLock::acquire(&self.data_dir, SCHEDULE_SCOPE, timeout * 2)?;

        let db_path = self.data_dir.join("pubslot.db");
        let deadline = (Instant::now() + timeout, timeout);
        // Both guards live on the worker: a timed-out run keeps the scope
        // until it has actually stopped touching the store.
        run_with_deadline(timeout, move || -> Result<RunResult, CoreError> {
            let _held = (permit, lock);
            let store = ItemStore::open_at(&db_path)?;
            ScheduleRunner::new(&config, &store).run_until(&request, &clock, Some(deadline))
        })
        .await?
    }
}
