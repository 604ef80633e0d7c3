use anyhow::Result;
use std::path::{Path, PathBuf};

use scroll_guard::limits::config::{get_config_path, load_or_default};
use scroll_guard::limits::store::default_data_dir;
use scroll_guard::limits::{DesktopNotifier, FileStore, LimitEngine};

/// Engine as used by the command line
pub type CliEngine = LimitEngine<FileStore, DesktopNotifier>;

/// Initialize logging
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

/// Config file to use: the explicit path or the platform default
pub fn resolve_config_path(config: Option<PathBuf>) -> Result<PathBuf> {
    match config {
        Some(path) => Ok(path),
        None => get_config_path(),
    }
}

/// Build the engine from the config file and state directory
pub fn open_engine(config_path: &Path, data_dir: Option<PathBuf>) -> Result<CliEngine> {
    let config = load_or_default(config_path)?;
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    tracing::debug!("Using state directory {}", data_dir.display());

    Ok(LimitEngine::new(FileStore::open(data_dir), DesktopNotifier, config))
}

/// Format a minute count for display
pub fn format_minutes(minutes: u32) -> String {
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    }
}

/// Fixed-width usage bar
pub fn progress_bar(percent: u32, width: usize) -> String {
    let filled = (percent.min(100) as usize * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
