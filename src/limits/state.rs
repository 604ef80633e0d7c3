use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::limits::store::{StateStore, keys};

/// Format used for calendar-day keys (device-local date)
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Calendar-day key for `now` in the device's local time zone
pub fn day_key(now: &DateTime<Local>) -> String {
    now.format(DAY_FORMAT).to_string()
}

/// Encode an optional timestamp as epoch millis, `0` meaning none
pub fn to_millis(at: Option<DateTime<Utc>>) -> i64 {
    at.map(|t| t.timestamp_millis()).unwrap_or(0)
}

/// Decode epoch millis, treating `0` and negative values as none
pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

/// Per-day counters; exactly one is current at any time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyState {
    /// Day these counters belong to (YYYY-MM-DD)
    pub date: String,
    pub usage_minutes: u32,
    pub bypass_count: u32,
    pub extension_until: Option<DateTime<Utc>>,
    /// Terminal lockout for the rest of `date`
    pub locked: bool,
}

impl DailyState {
    /// Zeroed counters for `date`
    pub fn fresh(date: &str) -> Self {
        Self {
            date: date.to_string(),
            usage_minutes: 0,
            bypass_count: 0,
            extension_until: None,
            locked: false,
        }
    }

    /// Read the day-scoped records; missing or corrupt records read as zero
    pub fn load<S: StateStore>(store: &S) -> Self {
        Self {
            date: store.get::<String>(keys::LAST_RESET).unwrap_or_default(),
            usage_minutes: store.get::<u32>(keys::USAGE_TODAY).unwrap_or(0),
            bypass_count: store.get::<u32>(keys::BYPASS_COUNT).unwrap_or(0),
            extension_until: store
                .get::<i64>(keys::EXTENSION_UNTIL)
                .and_then(from_millis),
            locked: store.get::<bool>(keys::LOCKED_OUT).unwrap_or(false),
        }
    }

    /// Write every day-scoped record
    pub fn save<S: StateStore>(&self, store: &mut S) -> Result<()> {
        store.set(keys::USAGE_TODAY, &self.usage_minutes)?;
        store.set(keys::BYPASS_COUNT, &self.bypass_count)?;
        store.set(keys::EXTENSION_UNTIL, &to_millis(self.extension_until))?;
        store.set(keys::LOCKED_OUT, &self.locked)?;
        store.set(keys::LAST_RESET, &self.date)?;
        Ok(())
    }

    /// Whether these counters belong to a day other than `today`
    pub fn is_stale(&self, today: &str) -> bool {
        self.date != today
    }

    /// Reset counters for a new day
    pub fn reset_for_new_day(&mut self, today: &str) {
        *self = Self::fresh(today);
    }

    /// Enter the terminal lockout for the rest of the day
    pub fn lock(&mut self) {
        self.locked = true;
    }
}

/// In-progress manual tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionMarker {
    pub started_at: DateTime<Utc>,
}

impl SessionMarker {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }

    pub fn load<S: StateStore>(store: &S) -> Option<Self> {
        store
            .get::<i64>(keys::SESSION_START)
            .and_then(from_millis)
            .map(Self::new)
    }

    /// Persist `marker`, or clear the record when there is no session
    pub fn store<S: StateStore>(marker: Option<&Self>, store: &mut S) -> Result<()> {
        match marker {
            Some(marker) => store.set(keys::SESSION_START, &marker.started_at.timestamp_millis()),
            None => store.remove(keys::SESSION_START),
        }
    }
}
