use anyhow::Result;
use chrono::Local;
use dialoguer::Input;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use scroll_guard::limits::challenge;
use scroll_guard::limits::{
    BypassFailure, BypassOutcome, CheckOutcome, Difficulty, LimitStatus, LockReason,
    SessionOutcome, SessionStart, TrackOutcome,
};

use super::prompt::TerminalPrompter;
use super::utils::{CliEngine, format_minutes, open_engine, progress_bar};

/// Run one automatic check
pub fn check(config_path: PathBuf, data_dir: Option<PathBuf>) -> Result<()> {
    let mut engine = open_engine(&config_path, data_dir)?;
    let outcome = engine.automatic_check(Local::now(), &mut TerminalPrompter, &mut rand::thread_rng())?;
    print_check(&outcome);
    Ok(())
}

/// Start or end a session
pub fn track(config_path: PathBuf, data_dir: Option<PathBuf>) -> Result<()> {
    let mut engine = open_engine(&config_path, data_dir)?;
    let outcome = engine.track(Local::now(), &mut TerminalPrompter, &mut rand::thread_rng())?;

    match outcome {
        TrackOutcome::Started(SessionStart::Started { at }) => {
            println!("▶ Session started at {}", at.with_timezone(&Local).format("%H:%M"));
            println!(
                "  Run 'scroll-guard track' again when you're done ({} min reminder).",
                engine.config().reminder_minutes
            );
        }
        TrackOutcome::Started(SessionStart::AlreadyActive { since }) => {
            println!("Session already running since {}", since.with_timezone(&Local).format("%H:%M"));
        }
        TrackOutcome::Ended(outcome) => {
            print_session_end(&outcome, engine.config().near_limit_minutes)
        }
    }
    Ok(())
}

/// Show today's status
pub fn status(config_path: PathBuf, data_dir: Option<PathBuf>) -> Result<()> {
    let mut engine = open_engine(&config_path, data_dir)?;
    let status = engine.status(Local::now())?;

    println!("Usage for {}", status.day);
    println!();
    println!(
        "  {} {}%",
        progress_bar(status.percent_used, 20),
        status.percent_used
    );
    println!(
        "  Used: {} of {}",
        format_minutes(status.usage_minutes),
        format_minutes(status.effective_limit_minutes)
    );
    println!("  Remaining: {}", format_minutes(status.remaining_minutes));
    println!("  Bypasses today: {}", status.bypasses_today);
    println!("  Total bypasses: {}", status.lifetime_bypasses);

    if let Some(left) = status.extension_minutes_left {
        println!(
            "  Extension: +{} min active ({} min left)",
            status.effective_limit_minutes - status.base_limit_minutes,
            left
        );
    }
    if let Some(started) = status.session_started_at {
        println!("  Session running since {}", started.with_timezone(&Local).format("%H:%M"));
    }

    println!();
    match status.status {
        LimitStatus::OnTrack => println!("✓ On track"),
        LimitStatus::Approaching => println!("⚠ Almost at limit"),
        LimitStatus::Exceeded => println!("⚠ Limit exceeded"),
        LimitStatus::Locked => println!("🔒 Locked until tomorrow"),
    }
    Ok(())
}

/// Practice one challenge; no counters change
pub fn practice(config_path: PathBuf, difficulty: Option<Difficulty>) -> Result<()> {
    let config = scroll_guard::limits::config::load_or_default(&config_path)?;
    let difficulty = difficulty.unwrap_or(config.standard_difficulty);
    let challenge = challenge::generate(&mut rand::thread_rng(), difficulty);

    println!("🧮 {} challenge", difficulty);
    let answer: String = Input::<String>::new()
        .with_prompt(challenge.question())
        .allow_empty(true)
        .interact_text()?;

    if challenge.verify(&answer) {
        println!("✓ Correct!");
    } else {
        println!("✗ Incorrect. The answer was {}.", challenge.expected_answer);
    }
    Ok(())
}

/// Run checks on an interval until Ctrl+C
pub async fn watch(mut engine: CliEngine, interval_secs: u64) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    info!("Watching usage every {}s (Ctrl+C to stop)", interval_secs.max(1));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Local::now();
                if let Err(e) = engine.session_reminder(now) {
                    warn!("Reminder check failed: {:#}", e);
                }
                match engine.automatic_check(now, &mut TerminalPrompter, &mut rand::thread_rng()) {
                    Ok(CheckOutcome::WithinLimit { .. }) => {}
                    Ok(outcome) => print_check(&outcome),
                    Err(e) => warn!("Check failed: {:#}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping watch");
                break;
            }
        }
    }
    Ok(())
}

fn print_check(outcome: &CheckOutcome) {
    match outcome {
        CheckOutcome::WithinLimit { remaining } => {
            println!("✓ Within limit: {} remaining", format_minutes(*remaining));
        }
        CheckOutcome::NearLimit { remaining } => {
            println!("⚠ Almost at limit: only {} remaining", format_minutes(*remaining));
        }
        CheckOutcome::Exceeded(outcome) => print_bypass(outcome),
    }
}

fn print_session_end(outcome: &SessionOutcome, near_limit_minutes: u32) {
    let summary = &outcome.summary;
    if !outcome.end.was_active() {
        println!("No session was running.");
        return;
    }

    println!("⏹ Session ended");
    println!("  Session: {} min", summary.session_minutes);
    println!("  Today's total: {} min", summary.total_minutes);
    println!("  Daily limit: {} min", summary.limit_minutes);
    println!("  Remaining: {} min", summary.remaining_minutes);
    println!("  Usage: {}%", summary.percent_used);

    match &outcome.bypass {
        Some(bypass) => print_bypass(bypass),
        None if summary.remaining_minutes <= near_limit_minutes => println!("\n⚠ Almost at limit!"),
        None => println!("\n✓ Still on track"),
    }
}

fn print_bypass(outcome: &BypassOutcome) {
    println!();
    match outcome {
        BypassOutcome::Granted(grant) => {
            let minutes = (grant.extension_until - grant.entry.timestamp).num_minutes();
            println!("✓ Extension granted: {} more minutes", minutes);
            println!("  This is bypass #{} today.", grant.bypass_number);
            match grant.bypass_number {
                1 => println!("  Next bypass requires a harder challenge and a reason."),
                2 => println!("  FINAL WARNING: one more bypass locks you out until tomorrow."),
                _ => {}
            }
        }
        BypassOutcome::Failed(failure) => {
            match failure {
                BypassFailure::WrongAnswer { expected } => {
                    println!("✗ Incorrect. The correct answer was {}.", expected)
                }
                BypassFailure::ChallengeAbandoned => println!("✗ Challenge abandoned."),
                BypassFailure::JustificationMissing => println!("✗ No valid reason given."),
            }
            println!("Extension denied. Try again or lock yourself out until tomorrow.");
        }
        BypassOutcome::Locked(reason) => {
            if *reason == LockReason::Exhausted {
                println!("No more extensions today.");
            }
            println!("🔒 Locked out until tomorrow. Take a break!");
        }
    }
}
