mod common;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use chrono::Duration;
use predicates::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use common::{Recorder, Reply, Script, at};
use scroll_guard::limits::store::StateStore;
use scroll_guard::limits::{
    AccountabilityLog, BypassLogEntry, FileStore, LimitEngine, LimitsConfig,
};

#[test]
fn report_counts_recent_windows() {
    let temp = TempDir::new().unwrap();
    let mut store = FileStore::open(temp.path());

    let now = at(18, 20, 0);
    for entry in [
        BypassLogEntry::new(now - Duration::days(40), 1, None, 30, 30),
        BypassLogEntry::new(at(13, 10, 0), 1, None, 31, 30),
        BypassLogEntry::new(at(15, 10, 0), 1, None, 30, 30),
        BypassLogEntry::new(at(18, 10, 0), 1, None, 32, 30),
    ] {
        AccountabilityLog::append(&mut store, &entry).unwrap();
    }

    let engine = LimitEngine::new(store, Recorder::default(), LimitsConfig::default());
    let report = engine.report(now, &[7, 30]);

    assert_eq!(report.window(7), Some(3));
    assert_eq!(report.window(30), Some(3));
    assert_eq!(report.total, 4);
    assert_eq!(report.recent[0].day, "2026-10-18");
}

#[test]
fn log_file_uses_documented_field_names() {
    let temp = TempDir::new().unwrap();
    let mut store = FileStore::open(temp.path());
    let entry = BypassLogEntry::new(at(18, 9, 15), 2, Some("urgent work message".to_string()), 35, 30);
    AccountabilityLog::append(&mut store, &entry).unwrap();

    let log = temp.child("bypass_log.json");
    log.assert(predicate::str::contains("\"dateString\":\"2026-10-18 09:15:00\""));
    log.assert(predicate::str::contains("\"bypassNumber\":2"));
    log.assert(predicate::str::contains("\"day\":\"2026-10-18\""));
    log.assert(predicate::str::contains("\"usage\":35"));
    log.assert(predicate::str::contains("\"limit\":30"));
}

#[test]
fn clearing_history_keeps_todays_counters() {
    let temp = TempDir::new().unwrap();
    let mut engine = LimitEngine::new(
        FileStore::open(temp.path()),
        Recorder::default(),
        LimitsConfig::default(),
    );
    let mut rng = StdRng::seed_from_u64(9);

    engine.status(at(18, 8, 0)).unwrap();
    temp.child("usage_today.json").write_str("30").unwrap();
    let mut script = Script::new().accept(Reply::Correct);
    engine.automatic_check(at(18, 9, 0), &mut script, &mut rng).unwrap();
    temp.child("total_bypasses.json").assert("1");

    engine.clear_history().unwrap();

    temp.child("bypass_log.json").assert(predicate::path::missing());
    temp.child("total_bypasses.json").assert("0");
    temp.child("usage_today.json").assert("30");
    temp.child("bypass_count.json").assert("1");
    assert!(engine.report(at(18, 9, 1), &[7, 30]).is_empty());
}

#[test]
fn trends_follow_stored_log() {
    let temp = TempDir::new().unwrap();
    let mut store = FileStore::open(temp.path());
    AccountabilityLog::append(&mut store, &BypassLogEntry::new(at(17, 9, 0), 1, None, 30, 30)).unwrap();
    AccountabilityLog::append(&mut store, &BypassLogEntry::new(at(17, 11, 0), 2, None, 35, 30)).unwrap();
    assert!(store.get_raw("bypass_log").unwrap().is_some());

    let engine = LimitEngine::new(store, Recorder::default(), LimitsConfig::default());
    let trends = engine.trends(at(18, 12, 0));

    let counts: Vec<_> = trends.days.iter().map(|(_, count)| *count).collect();
    assert_eq!(counts, vec![0, 0, 0, 0, 0, 2, 0]);
    assert_eq!(trends.worst_day.map(|d| d.count), Some(2));
}
