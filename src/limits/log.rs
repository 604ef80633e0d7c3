use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::limits::state::DAY_FORMAT;
use crate::limits::store::{StateStore, keys};

/// Report windows, in days
pub const DEFAULT_WINDOWS: [u32; 2] = [7, 30];

/// Number of entries listed under "recent" in a report
pub const RECENT_ENTRIES: usize = 15;

/// Days covered by the trend view
pub const TREND_DAYS: u32 = 7;

/// Display format for `date_string`
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One granted bypass; never modified after it is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BypassLogEntry {
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    /// Local time of the grant, for display
    pub date_string: String,
    /// 1-based bypass count for `day` at the time of the grant
    pub bypass_number: u32,
    pub reason: Option<String>,
    /// Calendar day the bypass counted against (YYYY-MM-DD)
    pub day: String,
    /// Usage in minutes when the limit was hit
    pub usage: u32,
    /// Base daily limit in force at the time
    pub limit: u32,
}

impl BypassLogEntry {
    pub fn new(
        now: DateTime<Local>,
        bypass_number: u32,
        reason: Option<String>,
        usage: u32,
        limit: u32,
    ) -> Self {
        Self {
            timestamp: now.with_timezone(&Utc),
            date_string: now.format(DISPLAY_FORMAT).to_string(),
            bypass_number,
            reason,
            day: now.format(DAY_FORMAT).to_string(),
            usage,
            limit,
        }
    }
}

/// Entries within the last `days` days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowCount {
    pub days: u32,
    pub count: usize,
}

/// Bypass count for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub day: String,
    pub count: usize,
}

/// Aggregated view of the whole log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountabilityReport {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    /// Distinct days with at least one bypass
    pub days_tracked: usize,
    pub average_per_day: f64,
    pub windows: Vec<WindowCount>,
    /// Day key to count, in calendar order
    pub per_day: BTreeMap<String, usize>,
    /// Fewest bypasses among tracked days; ties go to the earliest day
    pub best_day: Option<DayCount>,
    /// Most bypasses among tracked days; ties go to the earliest day
    pub worst_day: Option<DayCount>,
    /// Newest first
    pub recent: Vec<BypassLogEntry>,
}

impl AccountabilityReport {
    /// Count for a window requested when the report was built
    pub fn window(&self, days: u32) -> Option<usize> {
        self.windows.iter().find(|w| w.days == days).map(|w| w.count)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Last few calendar days, oldest first, zero-filled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trends {
    pub days: Vec<(NaiveDate, usize)>,
    pub best_day: Option<DayCount>,
    pub worst_day: Option<DayCount>,
}

/// Decoded contents of the log
///
/// Entries that fail to decode are skipped on read but stay on disk.
#[derive(Debug, Clone, Default)]
pub struct AccountabilityLog {
    entries: Vec<BypassLogEntry>,
}

impl AccountabilityLog {
    pub fn from_entries(entries: Vec<BypassLogEntry>) -> Self {
        Self { entries }
    }

    /// Read the log; a missing or corrupt log reads as empty
    pub fn load<S: StateStore>(store: &S) -> Self {
        let entries: Vec<BypassLogEntry> = load_raw(store)
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable bypass log entry #{}: {}", index, e);
                    None
                }
            })
            .collect();

        Self { entries }
    }

    /// Add `entry` at the end of the stored log
    pub fn append<S: StateStore>(store: &mut S, entry: &BypassLogEntry) -> Result<()> {
        let mut raw = load_raw(store);
        raw.push(serde_json::to_value(entry).context("Failed to serialize bypass log entry")?);
        store
            .set(keys::BYPASS_LOG, &raw)
            .context("Failed to append to bypass log")?;

        info!(
            "Logged bypass #{} for {} ({} entries total)",
            entry.bypass_number,
            entry.day,
            raw.len()
        );
        Ok(())
    }

    /// Drop every entry
    pub fn clear<S: StateStore>(store: &mut S) -> Result<()> {
        store.remove(keys::BYPASS_LOG).context("Failed to clear bypass log")?;
        info!("Bypass log cleared");
        Ok(())
    }

    pub fn entries(&self) -> &[BypassLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bypasses per calendar day over every retained entry
    pub fn per_day(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.day.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of entries stamped within `days` days before `now`
    pub fn count_within(&self, now: DateTime<Utc>, days: u32) -> usize {
        let cutoff = now - Duration::days(i64::from(days));
        self.entries
            .iter()
            .filter(|e| e.timestamp >= cutoff && e.timestamp <= now)
            .count()
    }

    /// Build the full report at `now` for each window in `windows`
    pub fn report(&self, now: DateTime<Utc>, windows: &[u32]) -> AccountabilityReport {
        let per_day = self.per_day();
        let total = self.entries.len();
        let days_tracked = per_day.len();
        let average_per_day = if days_tracked > 0 {
            total as f64 / days_tracked as f64
        } else {
            0.0
        };

        AccountabilityReport {
            generated_at: now,
            total,
            days_tracked,
            average_per_day,
            windows: windows
                .iter()
                .map(|&days| WindowCount {
                    days,
                    count: self.count_within(now, days),
                })
                .collect(),
            best_day: best_day(&per_day),
            worst_day: worst_day(&per_day),
            per_day,
            recent: self.entries.iter().rev().take(RECENT_ENTRIES).cloned().collect(),
        }
    }

    /// Daily counts for the week ending on `today`
    pub fn trends(&self, today: NaiveDate) -> Trends {
        let per_day = self.per_day();
        let days = (0..TREND_DAYS)
            .rev()
            .filter_map(|back| today.checked_sub_signed(Duration::days(i64::from(back))))
            .map(|date| {
                let key = date.format(DAY_FORMAT).to_string();
                (date, per_day.get(&key).copied().unwrap_or(0))
            })
            .collect();

        Trends {
            days,
            best_day: best_day(&per_day),
            worst_day: worst_day(&per_day),
        }
    }
}

fn load_raw<S: StateStore>(store: &S) -> Vec<serde_json::Value> {
    store
        .get::<Vec<serde_json::Value>>(keys::BYPASS_LOG)
        .unwrap_or_default()
}

/// First day with the lowest count
fn best_day(per_day: &BTreeMap<String, usize>) -> Option<DayCount> {
    let mut best: Option<(&String, usize)> = None;
    for (day, &count) in per_day {
        if best.is_none_or(|(_, lowest)| count < lowest) {
            best = Some((day, count));
        }
    }
    best.map(|(day, count)| DayCount { day: day.clone(), count })
}

/// First day with the highest count
fn worst_day(per_day: &BTreeMap<String, usize>) -> Option<DayCount> {
    let mut worst: Option<(&String, usize)> = None;
    for (day, &count) in per_day {
        if worst.is_none_or(|(_, highest)| count > highest) {
            worst = Some((day, count));
        }
    }
    worst.map(|(day, count)| DayCount { day: day.clone(), count })
}
