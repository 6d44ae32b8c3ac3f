//! Queued item commands for CLI.

use clap::Subcommand;
use pubslot_core::{Config, ItemStore};

use super::display_instant;

#[derive(Subcommand)]
pub enum ItemAction {
    /// Queue a new item
    Add {
        /// Item title
        title: String,
        /// Owner id
        #[arg(long, default_value = "1")]
        owner: String,
        /// Status (default: scheduler.post_status)
        #[arg(long)]
        status: Option<String>,
        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,
    },
    /// List items
    List {
        /// Filter by status (e.g. "draft", "future", "publish")
        #[arg(long)]
        status: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an item
    Remove {
        /// Item ID
        id: String,
    },
}

pub fn run(action: ItemAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = ItemStore::open()?;

    match action {
        ItemAction::Add {
            title,
            owner,
            status,
            json,
        } => {
            let status = match status {
                Some(s) => s,
                None => Config::load()?.scheduler.post_status,
            };
            let record = store.add_item(&title, &owner, &status)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("Item queued: {}", record.id);
            }
        }
        ItemAction::List { status, json } => {
            let items = store.list_items(status.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("no items");
            } else {
                for item in &items {
                    let when = item
                        .publish_at
                        .as_ref()
                        .map(display_instant)
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{}  {:<8} {:<24} owner={:<6} {}",
                        item.id, item.status, when, item.owner_id, item.title
                    );
                }
            }
        }
        ItemAction::Remove { id } => {
            store.remove_item(&id)?;
            println!("Item removed: {id}");
        }
    }
    Ok(())
}
