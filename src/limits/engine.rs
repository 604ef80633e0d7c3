use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::limits::config::LimitsConfig;
use crate::limits::day::{Today, ensure_current_day};
use crate::limits::escalation::{self, BypassOutcome, LimitChoice, LockReason, Prompter};
use crate::limits::extension;
use crate::limits::log::{AccountabilityLog, AccountabilityReport, Trends};
use crate::limits::notify::{self, Notice, Notifier};
use crate::limits::state::{from_millis, to_millis};
use crate::limits::store::{StateStore, keys};
use crate::limits::tracker::{self, SessionEnd, SessionStart, SessionSummary, percent_of};

/// How today's usage compares to the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LimitStatus {
    OnTrack,
    /// Within the warning threshold of the limit
    Approaching,
    Exceeded,
    Locked,
}

/// Read-only view of today's counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub day: String,
    pub usage_minutes: u32,
    pub base_limit_minutes: u32,
    pub effective_limit_minutes: u32,
    pub remaining_minutes: u32,
    pub percent_used: u32,
    pub bypasses_today: u32,
    pub lifetime_bypasses: u64,
    /// Minutes left on an active extension, rounded up
    pub extension_minutes_left: Option<u32>,
    pub session_started_at: Option<DateTime<Utc>>,
    pub last_check: Option<DateTime<Utc>>,
    pub locked: bool,
    pub status: LimitStatus,
}

/// Result of an automatic check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    WithinLimit { remaining: u32 },
    /// Within limit but close enough to warn
    NearLimit { remaining: u32 },
    /// Limit reached; escalation ran
    Exceeded(BypassOutcome),
}

/// Result of ending a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub end: SessionEnd,
    pub summary: SessionSummary,
    /// Set when the session pushed usage to the limit and the user chose what to do
    pub bypass: Option<BypassOutcome>,
}

/// Result of toggling a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    Started(SessionStart),
    Ended(SessionOutcome),
}

/// Usage limit engine
///
/// Every operation opens today's records through the daily reset gate,
/// works on them in memory, and writes them back once.
pub struct LimitEngine<S: StateStore, N: Notifier> {
    store: S,
    notifier: N,
    config: LimitsConfig,
    /// Session start already reminded about in this process
    reminded_session: Option<DateTime<Utc>>,
}

impl<S: StateStore, N: Notifier> LimitEngine<S, N> {
    pub fn new(store: S, notifier: N, config: LimitsConfig) -> Self {
        Self {
            store,
            notifier,
            config,
            reminded_session: None,
        }
    }

    pub fn config(&self) -> &LimitsConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn notify(&mut self, notice: Notice) {
        notify::deliver(&mut self.notifier, self.config.enable_notifications, notice);
    }

    /// Pass the daily reset gate, announcing a new day
    fn open_day(&mut self, now: DateTime<Local>) -> Result<Today> {
        let today = ensure_current_day(&mut self.store, now)?;
        if today.is_new_day() {
            self.notify(Notice::NewDay {
                limit: self.config.daily_limit_minutes,
            });
        }
        Ok(today)
    }

    fn effective_limit(&self, today: &Today) -> u32 {
        extension::effective_limit_now(
            today.state().extension_until,
            today.now_utc(),
            self.config.daily_limit_minutes,
            self.config.extension_minutes,
        )
    }

    /// Log a grant, then commit `today` and notify
    ///
    /// The log entry goes first: if it cannot be written the grant is not
    /// persisted either, so the counters never run ahead of the log.
    fn finish(&mut self, today: &Today, outcome: BypassOutcome) -> Result<BypassOutcome> {
        if let BypassOutcome::Granted(grant) = &outcome {
            AccountabilityLog::append(&mut self.store, &grant.entry)?;
        }
        today.commit(&mut self.store)?;

        match &outcome {
            BypassOutcome::Granted(_) => self.notify(Notice::ExtensionGranted {
                minutes: self.config.extension_minutes,
            }),
            BypassOutcome::Locked(LockReason::AlreadyLocked) | BypassOutcome::Failed(_) => {}
            BypassOutcome::Locked(_) => self.notify(Notice::LockedOut),
        }

        Ok(outcome)
    }

    /// Periodic check: escalate when the limit is reached, warn when close
    pub fn automatic_check<P: Prompter, R: Rng>(
        &mut self,
        now: DateTime<Local>,
        prompter: &mut P,
        rng: &mut R,
    ) -> Result<CheckOutcome> {
        let mut today = self.open_day(now)?;
        self.store
            .set(keys::LAST_CHECK, &to_millis(Some(today.now_utc())))
            .context("Failed to record check time")?;

        let usage = today.state().usage_minutes;
        let limit = self.effective_limit(&today);
        debug!("Check: {} of {} minutes used", usage, limit);

        if today.state().locked || usage >= limit {
            let outcome = escalation::escalate(&mut today, &self.config, prompter, rng)?;
            return Ok(CheckOutcome::Exceeded(self.finish(&today, outcome)?));
        }

        let remaining = limit - usage;
        if remaining <= self.config.near_limit_minutes {
            self.notify(Notice::NearLimit { remaining });
            return Ok(CheckOutcome::NearLimit { remaining });
        }
        Ok(CheckOutcome::WithinLimit { remaining })
    }

    /// Start a session if idle, otherwise end the running one
    pub fn track<P: Prompter, R: Rng>(
        &mut self,
        now: DateTime<Local>,
        prompter: &mut P,
        rng: &mut R,
    ) -> Result<TrackOutcome> {
        let today = self.open_day(now)?;
        if today.session().is_some() {
            Ok(TrackOutcome::Ended(self.close_session(today, prompter, rng)?))
        } else {
            Ok(TrackOutcome::Started(self.begin_session(today)?))
        }
    }

    pub fn start_session(&mut self, now: DateTime<Local>) -> Result<SessionStart> {
        let today = self.open_day(now)?;
        self.begin_session(today)
    }

    /// End the running session; at the limit, let the user extend or lock out
    pub fn end_session<P: Prompter, R: Rng>(
        &mut self,
        now: DateTime<Local>,
        prompter: &mut P,
        rng: &mut R,
    ) -> Result<SessionOutcome> {
        let today = self.open_day(now)?;
        self.close_session(today, prompter, rng)
    }

    fn begin_session(&mut self, mut today: Today) -> Result<SessionStart> {
        let started = tracker::start_session(&mut today);
        if matches!(started, SessionStart::Started { .. }) {
            today.commit(&mut self.store)?;
        }
        Ok(started)
    }

    fn close_session<P: Prompter, R: Rng>(
        &mut self,
        mut today: Today,
        prompter: &mut P,
        rng: &mut R,
    ) -> Result<SessionOutcome> {
        let end = tracker::end_session(&mut today);
        let summary = SessionSummary::new(&end, self.effective_limit(&today));

        if !end.was_active() || !summary.limit_reached() {
            today.commit(&mut self.store)?;
            return Ok(SessionOutcome {
                end,
                summary,
                bypass: None,
            });
        }

        let outcome = if today.state().locked {
            BypassOutcome::Locked(LockReason::AlreadyLocked)
        } else {
            match prompter.session_limit_reached(&summary)? {
                LimitChoice::RequestExtension => {
                    escalation::escalate(&mut today, &self.config, prompter, rng)?
                }
                LimitChoice::LockOut => escalation::lock_out(&mut today, LockReason::Chosen),
            }
        };

        Ok(SessionOutcome {
            end,
            summary,
            bypass: Some(self.finish(&today, outcome)?),
        })
    }

    pub fn status(&mut self, now: DateTime<Local>) -> Result<StatusSnapshot> {
        let today = self.open_day(now)?;
        let state = today.state();
        let effective = self.effective_limit(&today);
        let remaining = effective.saturating_sub(state.usage_minutes);

        let status = if state.locked {
            LimitStatus::Locked
        } else if state.usage_minutes >= effective {
            LimitStatus::Exceeded
        } else if remaining <= self.config.near_limit_minutes {
            LimitStatus::Approaching
        } else {
            LimitStatus::OnTrack
        };

        Ok(StatusSnapshot {
            day: today.day().to_string(),
            usage_minutes: state.usage_minutes,
            base_limit_minutes: self.config.daily_limit_minutes,
            effective_limit_minutes: effective,
            remaining_minutes: remaining,
            percent_used: percent_of(state.usage_minutes, effective),
            bypasses_today: state.bypass_count,
            lifetime_bypasses: today.lifetime_bypasses(),
            extension_minutes_left: extension::minutes_left(state.extension_until, today.now_utc()),
            session_started_at: today.session().map(|s| s.started_at),
            last_check: self.store.get::<i64>(keys::LAST_CHECK).and_then(from_millis),
            locked: state.locked,
            status,
        })
    }

    pub fn report(&self, now: DateTime<Local>, windows: &[u32]) -> AccountabilityReport {
        AccountabilityLog::load(&self.store).report(now.with_timezone(&Utc), windows)
    }

    pub fn trends(&self, now: DateTime<Local>) -> Trends {
        AccountabilityLog::load(&self.store).trends(now.date_naive())
    }

    /// Erase the log and the lifetime counter; today's counters are kept
    pub fn clear_history(&mut self) -> Result<()> {
        AccountabilityLog::clear(&mut self.store)?;
        self.store
            .set(keys::TOTAL_BYPASSES, &0u64)
            .context("Failed to reset lifetime bypass counter")?;
        info!("Accountability history cleared");
        Ok(())
    }

    /// Send a reminder once per session after `reminder_minutes`
    ///
    /// Returns whether a reminder was sent.
    pub fn session_reminder(&mut self, now: DateTime<Local>) -> Result<bool> {
        let today = self.open_day(now)?;
        let Some(session) = today.session() else {
            return Ok(false);
        };

        let started = session.started_at;
        let due = started + Duration::minutes(i64::from(self.config.reminder_minutes));
        if self.reminded_session == Some(started) || today.now_utc() < due {
            return Ok(false);
        }

        self.reminded_session = Some(started);
        self.notify(Notice::SessionReminder { at: started });
        Ok(true)
    }
}
