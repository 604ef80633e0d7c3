use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Something worth telling the user about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Counters were reset for a new day
    NewDay { limit: u32 },
    /// Usage is within the warning threshold of the limit
    NearLimit { remaining: u32 },
    ExtensionGranted { minutes: u32 },
    LockedOut,
    /// A manual session started at `at` is still running
    SessionReminder { at: DateTime<Utc> },
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::NewDay { .. } => "New Day, Fresh Start",
            Notice::NearLimit { .. } => "Almost at Limit",
            Notice::ExtensionGranted { .. } => "Extension Active",
            Notice::LockedOut => "Apps Locked",
            Notice::SessionReminder { .. } => "Still Scrolling?",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notice::NewDay { limit } => format!("Your {} minute limit has been reset.", limit),
            Notice::NearLimit { remaining } => {
                format!("Only {} minutes remaining today.", remaining)
            }
            Notice::ExtensionGranted { minutes } => {
                format!("{} minutes granted. Use wisely!", minutes)
            }
            Notice::LockedOut => "Locked until tomorrow. Take a break!".to_string(),
            Notice::SessionReminder { .. } => {
                "Don't forget to end your session when you're done.".to_string()
            }
        }
    }
}

/// Delivers notices to the user
pub trait Notifier {
    fn notify(&mut self, notice: &Notice) -> Result<()>;
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notice: &Notice) -> Result<()> {
        info!("{}: {}", notice.title(), notice.body());
        Ok(())
    }
}

/// Desktop notifications via the platform's notification tool
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&mut self, notice: &Notice) -> Result<()> {
        send_system_notification(notice.title(), &notice.body())
    }
}

#[cfg(target_os = "linux")]
fn send_system_notification(title: &str, message: &str) -> Result<()> {
    use anyhow::Context;
    use std::process::Command;

    let output = Command::new("notify-send")
        .arg(title)
        .arg(message)
        .arg("--icon=dialog-information")
        .output()
        .context("Failed to run notify-send")?;

    if !output.status.success() {
        anyhow::bail!(
            "notify-send exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn send_system_notification(title: &str, message: &str) -> Result<()> {
    use anyhow::Context;
    use std::process::Command;

    let script = format!(
        "display notification \"{}\" with title \"{}\" sound name \"Glass\"",
        applescript_escape(message),
        applescript_escape(title)
    );
    let output = Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .output()
        .context("Failed to run osascript")?;

    if !output.status.success() {
        anyhow::bail!("osascript exited with {}", output.status);
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn send_system_notification(title: &str, message: &str) -> Result<()> {
    warn!("Notification: {} - {}", title, message);
    Ok(())
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Deliver `notice` if enabled; failures are logged and swallowed
pub fn deliver<N: Notifier>(notifier: &mut N, enabled: bool, notice: Notice) {
    if !enabled {
        return;
    }
    if let Err(e) = notifier.notify(&notice) {
        warn!("Failed to deliver notification '{}': {:#}", notice.title(), e);
    }
}
