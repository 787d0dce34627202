//! listsync - mailing-list synchronization engine
//!
//! Applies subscribe and unsubscribe requests to the remote list service and
//! drains the local queue of requests that could not be applied earlier.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

/// listsync - queue-backed mailing-list synchronization
#[derive(Parser, Debug)]
#[command(name = "listsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON). Without it the environment and the
    /// standard locations are tried.
    #[arg(short, long, env = "LISTSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive; `RUST_LOG` takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drain the local queue into the remote list
    Reconcile {
        /// Show the pending work without calling the remote service
        #[arg(long)]
        dry_run: bool,

        /// Print the pass report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Subscribe an address (queued when the remote list is unavailable)
    Subscribe(commands::subscription::SubscribeArgs),

    /// Unsubscribe an address (queued when the remote list is unavailable)
    Unsubscribe {
        email: String,
    },

    /// Show the remote member record of an address
    Member {
        email: String,
    },

    /// Show the local queue depth
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Run reconciliation on the configured cron schedule until Ctrl-C
    Schedule {
        /// Override `reconcile.cron_expression`
        #[arg(long)]
        cron: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    let config = context::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Reconcile { dry_run, json } => {
            commands::reconcile::run(&config, dry_run, json).await
        }
        Commands::Subscribe(args) => commands::subscription::subscribe(&config, &args).await,
        Commands::Unsubscribe { email } => {
            commands::subscription::unsubscribe(&config, &email).await
        }
        Commands::Member { email } => commands::subscription::member(&config, &email).await,
        Commands::Status { json } => commands::status::run(&config, json).await,
        Commands::Schedule { cron } => commands::reconcile::schedule(&config, cron).await,
    }
}

/// Logs go to stderr so command output on stdout stays machine readable.
fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
