use anyhow::{Context, Result};
use std::path::PathBuf;

use scroll_guard::limits::config::{EXAMPLE_CONFIG, load_or_default};
use scroll_guard::platform::atomic_write;

use super::utils::format_minutes;

/// Write the example configuration file
pub fn init(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists: {}\nUse --force to overwrite",
            output.display()
        );
    }

    atomic_write(&output, EXAMPLE_CONFIG.as_bytes())
        .with_context(|| format!("Failed to write config file: {}", output.display()))?;

    println!("✓ Created configuration file: {}", output.display());
    println!("\nEdit this file to change your daily limit and challenge difficulty.");
    println!("See the comments in the file for every option.");
    Ok(())
}

/// Print the active configuration
pub fn settings(config_path: PathBuf) -> Result<()> {
    let config = load_or_default(&config_path)?;
    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("defaults ({} not found)", config_path.display())
    };

    println!("Settings from {}", source);
    println!();
    println!("  Daily limit: {}", format_minutes(config.daily_limit_minutes));
    println!("  Extension: {} min", config.extension_minutes);
    println!("  Second bypass difficulty: {}", config.standard_difficulty);
    println!("  Session reminder: every {} min", config.reminder_minutes);
    println!("  Near-limit warning: {} min", config.near_limit_minutes);
    println!(
        "  Notifications: {}",
        if config.enable_notifications { "enabled" } else { "disabled" }
    );
    println!("  Minimum reason length: {} characters", config.min_reason_chars);
    println!();
    println!("Monitored apps:");
    for app in &config.monitored_apps {
        println!("  • {}", app);
    }
    Ok(())
}
