use chrono::{DateTime, Duration, Utc};

use crate::limits::state::DailyState;

/// Open an extension window of `minutes` starting at `now`
pub fn grant(state: &mut DailyState, now: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    let until = now + Duration::minutes(i64::from(minutes));
    state.extension_until = Some(until);
    until
}

/// Whether an extension window is still open at `now`
pub fn is_active(extension_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    extension_until.is_some_and(|until| until > now)
}

/// Limit in force at `now`; always recomputed, an expired window never counts
pub fn effective_limit_now(
    extension_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    base_limit: u32,
    extension_minutes: u32,
) -> u32 {
    if is_active(extension_until, now) {
        base_limit.saturating_add(extension_minutes)
    } else {
        base_limit
    }
}

/// Whole minutes left in an open window, rounded up
pub fn minutes_left(extension_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<u32> {
    let until = extension_until.filter(|until| *until > now)?;
    let millis = (until - now).num_milliseconds();
    let minutes = (millis + 59_999) / 60_000;
    Some(u32::try_from(minutes).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn grant_sets_window_end() {
        let mut state = DailyState::fresh("2026-10-18");
        let until = grant(&mut state, noon(), 5);
        assert_eq!(until, noon() + Duration::minutes(5));
        assert_eq!(state.extension_until, Some(until));
    }

    #[test]
    fn effective_limit_includes_extension_while_active() {
        let until = Some(noon() + Duration::minutes(5));
        assert_eq!(effective_limit_now(until, noon(), 30, 5), 35);
        assert_eq!(effective_limit_now(until, noon() + Duration::minutes(4), 30, 5), 35);
    }

    #[test]
    fn effective_limit_is_base_once_expired() {
        let until = Some(noon() + Duration::minutes(5));
        assert_eq!(effective_limit_now(until, noon() + Duration::minutes(5), 30, 5), 30);
        assert_eq!(effective_limit_now(until, noon() + Duration::hours(3), 30, 5), 30);
    }

    #[test]
    fn effective_limit_without_extension_is_base() {
        assert_eq!(effective_limit_now(None, noon(), 30, 5), 30);
    }

    #[test]
    fn effective_limit_saturates() {
        let until = Some(noon() + Duration::minutes(5));
        assert_eq!(effective_limit_now(until, noon(), u32::MAX - 1, 5), u32::MAX);
    }

    #[test]
    fn minutes_left_rounds_up() {
        let until = Some(noon() + Duration::seconds(61));
        assert_eq!(minutes_left(until, noon()), Some(2));
        assert_eq!(minutes_left(until, noon() + Duration::seconds(61)), None);
        assert_eq!(minutes_left(None, noon()), None);
    }
}
