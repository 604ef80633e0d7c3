use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::limits::challenge::Difficulty;

/// Usage limit configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LimitsConfig {
    /// Daily budget in minutes
    #[serde(default = "default_daily_limit")]
    pub daily_limit_minutes: u32,

    /// Minutes granted by each successful bypass
    #[serde(default = "default_extension")]
    pub extension_minutes: u32,

    /// Challenge difficulty required for the second bypass of a day
    #[serde(default)]
    pub standard_difficulty: Difficulty,

    /// How long after a session starts the host should remind the user to end it
    #[serde(default = "default_reminder")]
    pub reminder_minutes: u32,

    /// Remaining minutes at or below which an automatic check warns
    #[serde(default = "default_near_limit")]
    pub near_limit_minutes: u32,

    #[serde(default = "default_true")]
    pub enable_notifications: bool,

    /// Minimum justification length after trimming
    #[serde(default = "default_min_reason_chars")]
    pub min_reason_chars: usize,

    /// Justification prompts per bypass attempt (first prompt plus re-prompts)
    #[serde(default = "default_reason_prompts")]
    pub reason_prompts: u32,

    /// Activity names being limited; descriptive only
    #[serde(default = "default_monitored_apps")]
    pub monitored_apps: Vec<String>,
}

fn default_daily_limit() -> u32 {
    30
}

fn default_extension() -> u32 {
    5
}

fn default_reminder() -> u32 {
    10
}

fn default_near_limit() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_min_reason_chars() -> usize {
    10
}

fn default_reason_prompts() -> u32 {
    2
}

fn default_monitored_apps() -> Vec<String> {
    [
        "Instagram", "TikTok", "Twitter", "X", "Reddit", "Facebook", "YouTube", "Snapchat",
        "Bluesky", "Mastodon",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            daily_limit_minutes: default_daily_limit(),
            extension_minutes: default_extension(),
            standard_difficulty: Difficulty::default(),
            reminder_minutes: default_reminder(),
            near_limit_minutes: default_near_limit(),
            enable_notifications: default_true(),
            min_reason_chars: default_min_reason_chars(),
            reason_prompts: default_reason_prompts(),
            monitored_apps: default_monitored_apps(),
        }
    }
}

/// Get the platform-specific config file path
pub fn get_config_path() -> Result<PathBuf> {
    directories::ProjectDirs::from("", "", "scroll-guard")
        .map(|dirs| dirs.config_dir().join("limits.yaml"))
        .context("Could not determine config file location")
}

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<LimitsConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: LimitsConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_or_default(path: &Path) -> Result<LimitsConfig> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(LimitsConfig::default());
    }

    load_config(path)
}

/// Save configuration to a YAML file
pub fn save_config(path: &Path, config: &LimitsConfig) -> Result<()> {
    validate_config(config)?;

    let content = serde_yaml::to_string(config)
        .context("Failed to serialize config to YAML")?;

    crate::platform::atomic_write(path, content.as_bytes())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &LimitsConfig) -> Result<()> {
    if config.daily_limit_minutes == 0 {
        anyhow::bail!("daily_limit_minutes must be greater than zero");
    }

    if config.extension_minutes == 0 {
        anyhow::bail!("extension_minutes must be greater than zero");
    }

    if config.min_reason_chars == 0 {
        anyhow::bail!("min_reason_chars must be greater than zero");
    }

    if config.reason_prompts == 0 {
        anyhow::bail!("reason_prompts must allow at least one prompt");
    }

    let mut seen = HashSet::new();
    for app in &config.monitored_apps {
        let name = app.trim();
        if name.is_empty() {
            anyhow::bail!("Monitored app names cannot be empty");
        }
        if !seen.insert(name.to_lowercase()) {
            anyhow::bail!("Duplicate monitored app: {}", name);
        }
    }

    Ok(())
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = include_str!("../../example-limits-config.yaml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = LimitsConfig::default();
        assert_eq!(config.daily_limit_minutes, 30);
        assert_eq!(config.extension_minutes, 5);
        assert_eq!(config.standard_difficulty, Difficulty::Medium);
        assert_eq!(config.near_limit_minutes, 5);
        assert_eq!(config.min_reason_chars, 10);
        assert_eq!(config.reason_prompts, 2);
        assert_eq!(config.monitored_apps.len(), 10);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: LimitsConfig = serde_yaml::from_str("daily_limit_minutes: 45\n").unwrap();
        assert_eq!(config.daily_limit_minutes, 45);
        assert_eq!(config.extension_minutes, 5);
        assert!(config.enable_notifications);
    }

    #[test]
    fn difficulty_parses_from_yaml() {
        let config: LimitsConfig = serde_yaml::from_str("standard_difficulty: hard\n").unwrap();
        assert_eq!(config.standard_difficulty, Difficulty::Hard);
    }

    #[test]
    fn example_config_is_valid() {
        let config: LimitsConfig = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config, LimitsConfig::default());
    }

    #[test]
    fn validate_rejects_zero_limit() {
        let config = LimitsConfig {
            daily_limit_minutes: 0,
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn validate_rejects_zero_extension() {
        let config = LimitsConfig {
            extension_minutes: 0,
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn validate_rejects_zero_reason_prompts() {
        let config = LimitsConfig {
            reason_prompts: 0,
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn validate_rejects_duplicate_apps() {
        let config = LimitsConfig {
            monitored_apps: vec!["Reddit".to_string(), "reddit".to_string()],
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn validate_rejects_blank_app() {
        let config = LimitsConfig {
            monitored_apps: vec!["  ".to_string()],
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("limits.yaml");
        let config = LimitsConfig {
            daily_limit_minutes: 20,
            standard_difficulty: Difficulty::Hard,
            ..Default::default()
        };

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn load_or_default_without_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&temp_dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config, LimitsConfig::default());
    }

    #[test]
    fn load_rejects_invalid_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("limits.yaml");
        std::fs::write(&path, "daily_limit_minutes: 0\n").unwrap();
        assert!(load_or_default(&path).is_err());
    }
}
