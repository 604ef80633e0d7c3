/// Daily usage limit enforcement
///
/// This module provides functionality to:
/// - Reset per-day counters exactly once per calendar day; [`day::Today`]
///   can only be obtained through the reset gate
/// - Accumulate usage from manual sessions, idle or active
/// - Escalate bypass attempts through arithmetic challenges and justifications,
///   locking the day once both bypasses are spent
/// - Grant time-bounded limit extensions
/// - Keep an append-only accountability log and report on it

pub mod challenge;
pub mod config;
pub mod day;
pub mod engine;
pub mod escalation;
pub mod extension;
pub mod log;
pub mod notify;
pub mod state;
pub mod store;
pub mod tracker;

pub use challenge::{Challenge, ChallengeGenerator, Difficulty, Operator};
pub use config::LimitsConfig;
pub use day::{DayTransition, Today, ensure_current_day};
pub use engine::{
    CheckOutcome, LimitEngine, LimitStatus, SessionOutcome, StatusSnapshot, TrackOutcome,
};
pub use escalation::{
    BypassFailure, BypassOffer, BypassOutcome, BypassTier, Grant, LimitChoice, LockReason,
    Prompter, Requirement,
};
pub use log::{AccountabilityLog, AccountabilityReport, BypassLogEntry, DayCount, Trends};
pub use notify::{DesktopNotifier, LogNotifier, Notice, Notifier};
pub use state::{DailyState, SessionMarker};
pub use store::{FileStore, MemoryStore, StateStore};
pub use tracker::{SessionEnd, SessionStart, SessionSummary};
