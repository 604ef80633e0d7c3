use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::limits::day::Today;
use crate::limits::state::SessionMarker;

/// Result of asking to start a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStart {
    Started { at: DateTime<Utc> },
    /// A session was already running; its start time is kept
    AlreadyActive { since: DateTime<Utc> },
}

/// Result of ending a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnd {
    /// When the ended session began, `None` if no session was active
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_minutes: u32,
    /// Usage for today after folding in the session
    pub total_minutes: u32,
}

impl SessionEnd {
    pub fn was_active(&self) -> bool {
        self.started_at.is_some()
    }
}

/// Begin a session at the gate's timestamp
pub fn start_session(today: &mut Today) -> SessionStart {
    if let Some(session) = today.session() {
        let since = session.started_at;
        debug!("Session already active since {}, keeping it", since);
        return SessionStart::AlreadyActive { since };
    }

    let at = today.now_utc();
    today.set_session(Some(SessionMarker::new(at)));
    info!("Usage session started at {}", at);
    SessionStart::Started { at }
}

/// End the active session and add its duration to today's usage
///
/// Ending with no active session changes nothing and reports zero minutes.
pub fn end_session(today: &mut Today) -> SessionEnd {
    let Some(session) = today.session().copied() else {
        debug!("No active session to end");
        return SessionEnd {
            started_at: None,
            elapsed_minutes: 0,
            total_minutes: today.state().usage_minutes,
        };
    };

    let elapsed = elapsed_minutes(session.started_at, today.now_utc());
    let state = today.state_mut();
    state.usage_minutes = state.usage_minutes.saturating_add(elapsed);
    let total = state.usage_minutes;
    today.set_session(None);

    info!("Usage session ended: {} min (total today: {} min)", elapsed, total);
    SessionEnd {
        started_at: Some(session.started_at),
        elapsed_minutes: elapsed,
        total_minutes: total,
    }
}

/// Whole minutes between `start` and `now`, rounded half up
///
/// A `now` earlier than `start` (clock skew) yields zero.
pub fn elapsed_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let millis = (now - start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    u32::try_from((millis + 30_000) / 60_000).unwrap_or(u32::MAX)
}

/// Figures shown to the user when a session ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_minutes: u32,
    pub total_minutes: u32,
    /// Effective limit at the time the session ended
    pub limit_minutes: u32,
    pub remaining_minutes: u32,
    /// Share of the limit used, capped at 100
    pub percent_used: u32,
}

impl SessionSummary {
    pub fn new(end: &SessionEnd, limit_minutes: u32) -> Self {
        Self {
            session_minutes: end.elapsed_minutes,
            total_minutes: end.total_minutes,
            limit_minutes,
            remaining_minutes: limit_minutes.saturating_sub(end.total_minutes),
            percent_used: percent_of(end.total_minutes, limit_minutes),
        }
    }

    pub fn limit_reached(&self) -> bool {
        self.total_minutes >= self.limit_minutes
    }
}

/// `used` as a percentage of `limit`, rounded and capped at 100
pub fn percent_of(used: u32, limit: u32) -> u32 {
    if limit == 0 {
        return 100;
    }
    let percent = (u64::from(used) * 100 + u64::from(limit) / 2) / u64::from(limit);
    percent.min(100) as u32
}
