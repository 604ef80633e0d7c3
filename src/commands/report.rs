use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use scroll_guard::limits::log::DEFAULT_WINDOWS;
use scroll_guard::limits::state::DAY_FORMAT;
use scroll_guard::limits::{AccountabilityReport, DayCount, Trends};
use scroll_guard::platform::atomic_write;

use super::prompt::confirm;
use super::utils::open_engine;

const RULE: &str = "───────────────────────────────────";
const BANNER: &str = "═══════════════════════════════════";

/// Print the accountability report
pub fn report(config_path: PathBuf, data_dir: Option<PathBuf>) -> Result<()> {
    let engine = open_engine(&config_path, data_dir)?;
    let report = engine.report(Local::now(), &DEFAULT_WINDOWS);

    if report.is_empty() {
        println!("No bypasses recorded yet. Keep it up!");
        return Ok(());
    }

    print!("{}", render_report(&report));
    Ok(())
}

/// Print the last week of bypasses
pub fn trends(config_path: PathBuf, data_dir: Option<PathBuf>) -> Result<()> {
    let engine = open_engine(&config_path, data_dir)?;
    print!("{}", render_trends(&engine.trends(Local::now())));
    Ok(())
}

/// Write the report to `path`
pub fn export(config_path: PathBuf, data_dir: Option<PathBuf>, path: &Path) -> Result<()> {
    let engine = open_engine(&config_path, data_dir)?;
    let now = Local::now();
    let report = engine.report(now, &DEFAULT_WINDOWS);

    let mut content = render_report(&report);
    let _ = writeln!(content, "\n{}", RULE);
    let _ = writeln!(content, "Generated by scroll-guard");
    let _ = writeln!(content, "{}", now.format("%Y-%m-%d %H:%M:%S"));

    atomic_write(path, content.as_bytes())
        .with_context(|| format!("Failed to export report to {}", path.display()))?;

    println!("✓ Report saved to {}", path.display());
    Ok(())
}

/// Erase the bypass history after confirmation
pub fn clear(config_path: PathBuf, data_dir: Option<PathBuf>, yes: bool) -> Result<()> {
    let mut engine = open_engine(&config_path, data_dir)?;

    if !yes && !confirm("Permanently delete all bypass history?")? {
        println!("Cancelled.");
        return Ok(());
    }

    engine.clear_history()?;
    println!("✓ Bypass history cleared");
    Ok(())
}

/// Plain-text accountability report
pub fn render_report(report: &AccountabilityReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "ACCOUNTABILITY REPORT");
    let _ = writeln!(out, "{}\n", BANNER);

    let _ = writeln!(out, "OVERALL STATISTICS");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Total Bypasses: {}", report.total);
    let _ = writeln!(out, "Days Tracked: {}", report.days_tracked);
    let _ = writeln!(out, "Average/Day: {:.1}", report.average_per_day);
    for window in &report.windows {
        let _ = writeln!(out, "Last {} Days: {}", window.days, window.count);
    }

    let _ = writeln!(out, "\nRECENT BYPASSES");
    let _ = writeln!(out, "{}", RULE);
    for entry in &report.recent {
        let when = entry.timestamp.with_timezone(&Local).format("%b %-d %H:%M");
        let _ = writeln!(out, "\n{}", when);
        let _ = writeln!(
            out,
            "Bypass #{} | {}/{} min",
            entry.bypass_number, entry.usage, entry.limit
        );
        if let Some(reason) = &entry.reason {
            let _ = writeln!(out, "Reason: \"{}\"", reason);
        }
    }

    out
}

/// Plain-text trend view with one bar per day
pub fn render_trends(trends: &Trends) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", BANNER);
    let _ = writeln!(out, "USAGE TRENDS");
    let _ = writeln!(out, "{}\n", BANNER);
    let _ = writeln!(out, "LAST 7 DAYS:");
    let _ = writeln!(out, "{}", RULE);

    for (date, count) in &trends.days {
        let _ = writeln!(
            out,
            "{}: {} {}",
            date.format("%a %b %-d"),
            trend_bar(*count),
            count
        );
    }

    if let (Some(best), Some(worst)) = (&trends.best_day, &trends.worst_day) {
        let _ = writeln!(out, "\nBEST DAY:\n{}", describe_day(best));
        let _ = writeln!(out, "\nWORST DAY:\n{}", describe_day(worst));
    }

    out
}

fn trend_bar(count: usize) -> String {
    format!("{}{}", "█".repeat(count), "░".repeat(5usize.saturating_sub(count)))
}

fn describe_day(day: &DayCount) -> String {
    let label = NaiveDate::parse_from_str(&day.day, DAY_FORMAT)
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| day.day.clone());
    format!("{} - {} bypass(es)", label, day.count)
}
