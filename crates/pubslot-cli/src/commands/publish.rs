use std::time::Duration;

use clap::Subcommand;
use tracing::debug;

use pubslot_core::{ClockSource, Config, CoreError, ItemStore, PublishEntry, PublishQueue, SystemClock};

use super::clock_for;

#[derive(Subcommand)]
pub enum PublishAction {
    /// Publish every item whose time has passed, then exit
    Due {
        /// Treat this RFC 3339 instant as "now"
        #[arg(long)]
        now: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep running and publish items as they come due
    Watch {
        /// Re-read the store at least this often (seconds)
        #[arg(long, default_value = "60")]
        poll_secs: u64,
    },
}

pub fn run(action: PublishAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PublishAction::Due { now, json } => {
            let config = Config::load()?;
            let clock = clock_for(&config, now.as_deref())?;
            let store = ItemStore::open()?;

            let mut queue = PublishQueue::from_records(&store.future_items()?);
            let mut handler =
                |entry: &PublishEntry| store.mark_published(&entry.item_id).map_err(CoreError::from);
            let summary = queue.dispatch_due(clock.now(), &mut handler);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Published {} posts.", summary.published.len());
                for (id, error) in &summary.failed {
                    println!("  failed {id}: {error}");
                }
            }
        }
        PublishAction::Watch { poll_secs } => {
            let config = Config::load()?;
            let clock = SystemClock::new(config.zone()?);
            let poll = Duration::from_secs(poll_secs.max(1));
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            runtime.block_on(watch(clock, poll))?;
        }
    }
    Ok(())
}

async fn watch(clock: SystemClock, poll: Duration) -> Result<(), CoreError> {
    let store = ItemStore::open()?;
    loop {
        // The store is the source of truth: runs from other processes add
        // or move items between polls.
        let mut queue = PublishQueue::from_records(&store.future_items()?);
        let mut handler =
            |entry: &PublishEntry| store.mark_published(&entry.item_id).map_err(CoreError::from);
        let summary = queue.dispatch_due(clock.now(), &mut handler);
        for id in &summary.published {
            println!("published {id}");
        }

        let wait = queue
            .time_until_next(clock.now())
            .and_then(|d| d.to_std().ok())
            .map_or(poll, |d| d.min(poll));
        debug!(pending = queue.len(), wait_secs = wait.as_secs(), "waiting for next due item");
        tokio::time::sleep(wait).await;
    }
}
