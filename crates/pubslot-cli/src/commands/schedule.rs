use clap::{Args, Subcommand};
use pubslot_core::storage::data_dir;
use pubslot_core::{
    Config, ItemStore, LastRun, RunGuard, RunRequest, RunResult, RunStatus, ScheduleRunner,
    TriggerKind,
};
use serde_json::json;

use super::{clock_for, display_instant};

/// Upcoming posts shown by `schedule status`.
const UPCOMING_LIMIT: usize = 10;

#[derive(Args)]
pub struct RunArgs {
    /// What asked for the run: periodic (cron) or on-demand
    #[arg(long, default_value = "on-demand")]
    trigger: TriggerKind,
    /// Treat this RFC 3339 instant as "now"
    #[arg(long)]
    now: Option<String>,
    /// Fixed random seed for reproducible placement
    #[arg(long)]
    seed: Option<u64>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Schedule queued items and persist the result
    Run(RunArgs),
    /// Compute a schedule without persisting anything
    Preview(RunArgs),
    /// Show the scheduler state and upcoming posts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ScheduleAction::Run(args) => {
            let config = Config::load()?;
            let clock = clock_for(&config, args.now.as_deref())?;
            let request = RunRequest {
                kind: args.trigger,
                seed: args.seed,
                dry_run: false,
            };
            let guard = RunGuard::new(data_dir()?);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(guard.run(config, request, clock))?;
            print_result(&result, args.json)?;
        }
        ScheduleAction::Preview(args) => {
            let config = Config::load()?;
            let clock = clock_for(&config, args.now.as_deref())?;
            let store = ItemStore::open()?;
            let request = RunRequest {
                kind: args.trigger,
                seed: args.seed,
                dry_run: true,
            };
            let result = ScheduleRunner::new(&config, &store).run(&request, &clock)?;
            print_result(&result, args.json)?;
        }
        ScheduleAction::Status { json } => {
            let config = Config::load()?;
            let store = ItemStore::open()?;
            let counts = store.status_counts(&config.scheduler.post_status)?;
            let upcoming = store.upcoming(UPCOMING_LIMIT)?;
            let last_run: Option<LastRun> = store.last_run()?;

            if json {
                let status = json!({
                    "enabled": config.scheduler.enabled,
                    "post_status": config.scheduler.post_status,
                    "counts": counts,
                    "upcoming": upcoming,
                    "last_run": last_run,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Ok(());
            }

            println!(
                "Scheduler: {}",
                if config.scheduler.enabled { "enabled" } else { "disabled" }
            );
            println!(
                "Waiting ({}): {}  Scheduled: {}  Published: {}",
                config.scheduler.post_status, counts.pending, counts.future, counts.published
            );
            match &last_run {
                Some(last) => println!(
                    "Last run: {} ({}, {} scheduled, {} skipped)",
                    display_instant(&last.at),
                    last.kind,
                    last.scheduled,
                    last.skipped
                ),
                None => println!("Last run: never"),
            }
            if upcoming.is_empty() {
                println!("No upcoming posts.");
            } else {
                println!("Upcoming:");
                for item in &upcoming {
                    let when = item
                        .publish_at
                        .as_ref()
                        .map(display_instant)
                        .unwrap_or_default();
                    println!("  {when}  {}  (owner {})", item.title, item.owner_id);
                }
            }
        }
    }
    Ok(())
}

fn print_result(result: &RunResult, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    match &result.status {
        RunStatus::Skipped { .. } => println!("{}", result.summary()),
        RunStatus::Completed { report, .. } => {
            if result.dry_run {
                println!("Preview only, nothing was saved.");
            }
            print!("{report}");
        }
    }
    Ok(())
}
