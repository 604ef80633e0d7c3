use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, info};

use crate::limits::state::{DailyState, SessionMarker, day_key};
use crate::limits::store::{StateStore, keys};

/// What the gate did when it was opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayTransition {
    /// Counters already belonged to today
    SameDay,
    /// Counters were reset; `previous` is the day they belonged to, if any
    NewDay { previous: Option<String> },
}

/// Snapshot of all mutable records for the current day
///
/// Read once when the gate opens, mutated in memory, and written back with
/// [`Today::commit`].
#[derive(Debug, Clone)]
pub struct Today {
    now: DateTime<Local>,
    state: DailyState,
    session: Option<SessionMarker>,
    lifetime_bypasses: u64,
    transition: DayTransition,
}

/// Normalize stored state for the calendar day of `now`
///
/// On the first call of a new day the per-day counters are zeroed and the
/// reset is persisted immediately, so repeated calls on the same day are
/// no-ops.
pub fn ensure_current_day<S: StateStore>(store: &mut S, now: DateTime<Local>) -> Result<Today> {
    let today = day_key(&now);
    let mut state = DailyState::load(store);

    let transition = if state.is_stale(&today) {
        let previous = (!state.date.is_empty()).then(|| state.date.clone());
        info!(
            "New day {} (previous: {}), resetting daily counters",
            today,
            previous.as_deref().unwrap_or("none")
        );
        state.reset_for_new_day(&today);
        state.save(store)?;
        DayTransition::NewDay { previous }
    } else {
        debug!("Counters already current for {}", today);
        DayTransition::SameDay
    };

    Ok(Today {
        now,
        state,
        session: SessionMarker::load(store),
        lifetime_bypasses: store.get::<u64>(keys::TOTAL_BYPASSES).unwrap_or(0),
        transition,
    })
}

impl Today {
    pub fn day(&self) -> &str {
        &self.state.date
    }

    pub fn now(&self) -> DateTime<Local> {
        self.now
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }

    pub fn state(&self) -> &DailyState {
        &self.state
    }

    pub fn session(&self) -> Option<&SessionMarker> {
        self.session.as_ref()
    }

    pub fn lifetime_bypasses(&self) -> u64 {
        self.lifetime_bypasses
    }

    pub fn transition(&self) -> &DayTransition {
        &self.transition
    }

    pub fn is_new_day(&self) -> bool {
        matches!(self.transition, DayTransition::NewDay { .. })
    }

    pub(crate) fn state_mut(&mut self) -> &mut DailyState {
        &mut self.state
    }

    pub(crate) fn set_session(&mut self, session: Option<SessionMarker>) {
        self.session = session;
    }

    /// Count one successful bypass, returning its 1-based number for today
    pub(crate) fn record_bypass(&mut self) -> u32 {
        self.state.bypass_count += 1;
        self.lifetime_bypasses += 1;
        self.state.bypass_count
    }

    /// Write the snapshot back to the store
    pub fn commit<S: StateStore>(&self, store: &mut S) -> Result<()> {
        self.state.save(store)?;
        SessionMarker::store(self.session.as_ref(), store)?;
        store.set(keys::TOTAL_BYPASSES, &self.lifetime_bypasses)?;
        debug!(
            "Committed state for {}: usage={} bypasses={} locked={}",
            self.state.date, self.state.usage_minutes, self.state.bypass_count, self.state.locked
        );
        Ok(())
    }
}
