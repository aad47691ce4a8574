//! photogrid CLI - Command-line interface
//!
//! Fills a photo grid through the keyed fetch queue and manages the
//! configuration file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;

#[derive(Parser)]
#[command(name = "photogrid")]
#[command(version)]
#[command(about = "Fetch a grid of photos with bounded, deduplicated downloads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reload the grid and fetch every photo
    Fetch {
        /// Number of photos to load (default: grid.reload_count from config)
        #[arg(long)]
        count: Option<usize>,

        /// Image URL every photo is fetched from (default: grid.source_url)
        #[arg(long)]
        url: Option<String>,

        /// Maximum simultaneous fetches (default: fetch.max_concurrent)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-request timeout in seconds (default: fetch.timeout)
        #[arg(long)]
        timeout: Option<u64>,

        /// Rounds of retries for failed photos
        #[arg(long, default_value = "0")]
        retries: u32,

        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch {
            count,
            url,
            concurrency,
            timeout,
            retries,
            debug,
        } => commands::fetch::run(FetchArgs {
            count,
            url,
            concurrency,
            timeout,
            retries,
            debug,
        }),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
