//! Trigger boundary: what asked for a run, and the guards around it.
//!
//! At most one scheduling run per scope may be in flight. Inside a process
//! that is [`SingleFlight`]; across processes it is the
//! [`RunLock`](crate::storage::RunLock) file. Every run is also bounded by a
//! deadline through [`run_with_deadline`].

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TriggerError, ValidationError};

/// Days of work requested by an on-demand run.
pub const ON_DEMAND_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    /// Recurring run (cron). Respects the enabled flag and active days.
    Periodic,
    /// Manual "schedule now" request. Always runs.
    OnDemand,
}

impl TriggerKind {
    /// Number of queued items one run picks up.
    pub fn batch_size(self, posts_per_day: u32) -> usize {
        let per_day = posts_per_day as usize;
        match self {
            TriggerKind::Periodic => per_day,
            TriggerKind::OnDemand => per_day * ON_DEMAND_DAYS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::Periodic => "periodic",
            TriggerKind::OnDemand => "on-demand",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "periodic" | "cron" => Ok(TriggerKind::Periodic),
            "on-demand" | "ondemand" | "manual" => Ok(TriggerKind::OnDemand),
            other => Err(ValidationError::InvalidValue {
                field: "trigger".to_string(),
                message: format!("'{other}' is not one of: periodic, on-demand"),
            }),
        }
    }
}

/// In-process keyed mutual exclusion.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    active: Arc<Mutex<HashSet<String>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `scope`, or fail immediately if it is already claimed.
    ///
    /// # Errors
    /// [`TriggerError::RunInProgress`] while another permit for `scope` lives.
    pub fn try_acquire(&self, scope: &str) -> Result<FlightPermit, TriggerError> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(scope.to_string()) {
            return Err(TriggerError::RunInProgress {
                scope: scope.to_string(),
            });
        }
        Ok(FlightPermit {
            scope: scope.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, scope: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(scope)
    }
}

/// Releases its scope on drop.
#[derive(Debug)]
pub struct FlightPermit {
    scope: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl FlightPermit {
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.scope);
    }
}

/// Run blocking `job` on the blocking pool, giving up after `timeout`.
///
/// The worker is not cancelled when the deadline passes; jobs that persist
/// results should check their own deadline before writing.
///
/// # Errors
/// [`TriggerError::DeadlineExceeded`] on timeout,
/// [`TriggerError::WorkerFailed`] if the job panicked.
pub async fn run_with_deadline<T, F>(timeout: Duration, job: F) -> Result<T, TriggerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);
    match tokio::time::timeout(timeout, handle).await {
        Ok(joined) => Ok(joined?),
        Err(_) => Err(TriggerError::DeadlineExceeded {
            timeout_secs: timeout.as_secs(),
        }),
    }
}
