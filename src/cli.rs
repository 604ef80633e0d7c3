use clap::{Parser, Subcommand};
use std::path::PathBuf;

use scroll_guard::limits::Difficulty;

/// Scroll Guard
///
/// Enforces a daily time budget on distracting apps. Going over the budget
/// takes an arithmetic challenge, then a challenge plus a written reason,
/// then locks you out until tomorrow. Every bypass is logged.
#[derive(Parser, Debug)]
#[command(name = "scroll-guard")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding persisted state (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare today's usage to the limit, escalating when it is reached
    Check,
    /// Start a usage session, or end the running one
    Track,
    /// Show today's usage, limit and bypasses
    Status,
    /// Show the accountability report
    Report,
    /// Show bypasses over the last 7 days
    Trends,
    /// Write the accountability report to a file
    Export {
        /// Output file
        path: PathBuf,
    },
    /// Erase the bypass log and lifetime bypass counter
    Clear {
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Practice a challenge without affecting any counters
    Challenge {
        /// Challenge difficulty (easy, medium, hard); defaults to the configured standard
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },
    /// Create an example configuration file
    Init {
        /// Output path (defaults to the platform config location)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Show the active configuration
    Settings,
    /// Run checks periodically until interrupted
    Watch {
        /// Seconds between checks
        #[arg(long, default_value = "60")]
        interval: u64,
    },
}
