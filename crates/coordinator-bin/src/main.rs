//! Worklens Coordinator - Background process for extension authentication state.

mod app;
mod external;
mod ipc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use coordinator_config_and_utils::{init_logging, Config, Paths};

/// Worklens coordinator command-line interface.
#[derive(Parser)]
#[command(name = "worklens-coordinator")]
#[command(about = "Worklens background coordinator for extension sign-in state")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Base directory for runtime files (socket, logs, config). Defaults to ~/.worklens
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the coordinator
    Start,
    /// Stop the coordinator
    Stop,
    /// Check coordinator status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    // Load configuration
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    match cli.command {
        Some(Commands::Start) | None => {
            app::run_coordinator(config, paths).await?;
        }
        Some(Commands::Stop) => {
            app::stop_coordinator(&paths).await?;
        }
        Some(Commands::Status) => {
            app::check_status(&paths).await?;
        }
    }

    Ok(())
}
