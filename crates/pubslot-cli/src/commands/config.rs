use clap::Subcommand;
use pubslot_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "scheduler.posts_per_day", "owner.strategy")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value (lists accept "a,b,c" or a JSON array)
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Validate the configuration and print warnings
    Check,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Check => {
            let config = Config::load()?;
            let window = config.window()?;
            config.zone()?;

            let mut warnings = Vec::new();
            if let Some(warning) = window.capacity_warning() {
                warnings.push(warning.to_string());
            }
            if config.owner.enabled {
                let usable = config
                    .owner
                    .pool
                    .iter()
                    .filter(|id| !config.owner.excluded.contains(id))
                    .count();
                if usable == 0 {
                    warnings.push(
                        "owner rotation is enabled but every pool member is excluded; \
                         items keep their original owner"
                            .to_string(),
                    );
                }
            }

            if warnings.is_empty() {
                println!("ok");
            } else {
                for warning in warnings {
                    println!("warning: {warning}");
                }
            }
        }
    }
    Ok(())
}
