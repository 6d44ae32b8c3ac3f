use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "pubslot", version, about = "Spread queued posts over future publishing slots")]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Queued item management
    Item {
        #[command(subcommand)]
        action: commands::item::ItemAction,
    },
    /// Run, preview and inspect scheduling
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Publish items whose time has come
    Publish {
        #[command(subcommand)]
        action: commands::publish::PublishAction,
    },
}

fn setup_tracing(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("pubslot_core=debug,pubslot=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Item { action } => commands::item::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Publish { action } => commands::publish::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
