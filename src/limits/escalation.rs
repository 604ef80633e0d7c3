use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::limits::challenge::{self, Challenge, Difficulty};
use crate::limits::config::LimitsConfig;
use crate::limits::day::Today;
use crate::limits::extension;
use crate::limits::log::BypassLogEntry;
use crate::limits::tracker::SessionSummary;

/// Escalation tier derived from today's bypass count
///
/// The first bypass costs an easy challenge, the second a standard one plus
/// a written justification. After two the day is locked until tomorrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassTier {
    First,
    Second,
    Exhausted,
}

impl BypassTier {
    pub fn for_count(bypass_count: u32) -> Self {
        match bypass_count {
            0 => BypassTier::First,
            1 => BypassTier::Second,
            _ => BypassTier::Exhausted,
        }
    }

    /// What must be done to pass this tier, `None` when nothing is offered
    pub fn requirement(self, standard: Difficulty) -> Option<Requirement> {
        match self {
            BypassTier::First => Some(Requirement {
                difficulty: Difficulty::Easy,
                justification: false,
            }),
            BypassTier::Second => Some(Requirement {
                difficulty: standard,
                justification: true,
            }),
            BypassTier::Exhausted => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub difficulty: Difficulty,
    /// A written reason must follow a correct answer
    pub justification: bool,
}

/// Shown to the user before a challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassOffer {
    pub usage_minutes: u32,
    pub limit_minutes: u32,
    pub bypass_count: u32,
    pub extension_minutes: u32,
    pub requirement: Requirement,
}

/// Result of one escalation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BypassOutcome {
    Granted(Grant),
    /// Nothing changed; the same tier applies on the next attempt
    Failed(BypassFailure),
    /// Locked for the rest of the day
    Locked(LockReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Today's bypass count after this grant
    pub bypass_number: u32,
    pub extension_until: DateTime<Utc>,
    pub entry: BypassLogEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassFailure {
    WrongAnswer { expected: i64 },
    /// The user gave up on the challenge
    ChallengeAbandoned,
    /// No justification of sufficient length was supplied
    JustificationMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    /// The day was already locked; nothing was asked
    AlreadyLocked,
    /// The user turned down the offered challenge
    Declined,
    /// Both bypasses for today have been used
    Exhausted,
    /// The user chose to lock themselves out
    Chosen,
}

/// Answer to "limit reached" at the end of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitChoice {
    RequestExtension,
    LockOut,
}

/// Synchronous exchange with whoever is at the keyboard
///
/// Errors are reserved for the interface itself failing; every user answer,
/// including cancelling, is expressed in the return value.
pub trait Prompter {
    /// Ask whether to attempt the challenge; `false` locks the day
    fn offer_bypass(&mut self, offer: &BypassOffer) -> Result<bool>;

    /// Collect an answer; `None` means the user gave up
    fn answer_challenge(&mut self, challenge: &Challenge) -> Result<Option<String>>;

    /// Collect a justification; `attempt` starts at 1. `None` cancels
    fn justification(&mut self, attempt: u32) -> Result<Option<String>>;

    /// A justification was too short; ask whether to try again
    fn retry_justification(&mut self, min_chars: usize) -> Result<bool>;

    /// A session ended at or past the limit
    fn session_limit_reached(&mut self, summary: &SessionSummary) -> Result<LimitChoice>;
}

/// Trimmed `text` if it has at least `min_chars` characters
pub fn qualifying_reason(text: &str, min_chars: usize) -> Option<String> {
    let trimmed = text.trim();
    (trimmed.chars().count() >= min_chars).then(|| trimmed.to_string())
}

/// Ask for a justification, re-prompting at most `config.reason_prompts - 1` times
fn collect_justification<P: Prompter>(
    prompter: &mut P,
    config: &LimitsConfig,
) -> Result<Option<String>> {
    for attempt in 1..=config.reason_prompts {
        let Some(text) = prompter.justification(attempt)? else {
            debug!("Justification cancelled");
            return Ok(None);
        };

        if let Some(reason) = qualifying_reason(&text, config.min_reason_chars) {
            return Ok(Some(reason));
        }

        if attempt == config.reason_prompts
            || !prompter.retry_justification(config.min_reason_chars)?
        {
            break;
        }
    }
    Ok(None)
}

/// Enter the lockout for the rest of today
pub fn lock_out(today: &mut Today, reason: LockReason) -> BypassOutcome {
    if !today.state().locked {
        today.state_mut().lock();
        info!("Locked out for {} ({:?})", today.day(), reason);
    }
    BypassOutcome::Locked(reason)
}

/// Run one escalation attempt against today's counters
///
/// Only called once usage has reached the effective limit. On a grant the
/// bypass counters and extension window are updated in `today`; the caller
/// appends the returned log entry, then commits `today`. Declining locks the
/// day. Any other failure leaves every counter untouched.
pub fn escalate<P: Prompter, R: Rng>(
    today: &mut Today,
    config: &LimitsConfig,
    prompter: &mut P,
    rng: &mut R,
) -> Result<BypassOutcome> {
    if today.state().locked {
        debug!("{} is already locked", today.day());
        return Ok(BypassOutcome::Locked(LockReason::AlreadyLocked));
    }

    let bypass_count = today.state().bypass_count;
    let tier = BypassTier::for_count(bypass_count);
    let Some(requirement) = tier.requirement(config.standard_difficulty) else {
        info!("Bypass limit reached ({} today)", bypass_count);
        return Ok(lock_out(today, LockReason::Exhausted));
    };

    let offer = BypassOffer {
        usage_minutes: today.state().usage_minutes,
        limit_minutes: config.daily_limit_minutes,
        bypass_count,
        extension_minutes: config.extension_minutes,
        requirement,
    };
    if !prompter.offer_bypass(&offer)? {
        return Ok(lock_out(today, LockReason::Declined));
    }

    let challenge = challenge::generate(rng, requirement.difficulty);
    debug!("Issued {} challenge", challenge.difficulty);
    let Some(answer) = prompter.answer_challenge(&challenge)? else {
        info!("Challenge abandoned");
        return Ok(BypassOutcome::Failed(BypassFailure::ChallengeAbandoned));
    };
    if !challenge.verify(&answer) {
        warn!("Challenge answered incorrectly");
        return Ok(BypassOutcome::Failed(BypassFailure::WrongAnswer {
            expected: challenge.expected_answer,
        }));
    }

    let reason = if requirement.justification {
        match collect_justification(prompter, config)? {
            Some(reason) => Some(reason),
            None => {
                info!("Bypass denied: no justification");
                return Ok(BypassOutcome::Failed(BypassFailure::JustificationMissing));
            }
        }
    } else {
        None
    };

    let usage = today.state().usage_minutes;
    let bypass_number = today.record_bypass();
    let now = today.now_utc();
    let extension_until = extension::grant(today.state_mut(), now, config.extension_minutes);
    let entry = BypassLogEntry::new(
        today.now(),
        bypass_number,
        reason,
        usage,
        config.daily_limit_minutes,
    );

    info!(
        "Bypass #{} granted: {} extra minutes until {}",
        bypass_number, config.extension_minutes, extension_until
    );
    Ok(BypassOutcome::Granted(Grant {
        bypass_number,
        extension_until,
        entry,
    }))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Prompter replaying canned answers
    ///
    /// A correct challenge answer is produced with `Answer::Correct`, since the
    /// operands are only known once the challenge is generated.
    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        pub accept_offer: VecDeque<bool>,
        pub answers: VecDeque<Answer>,
        pub reasons: VecDeque<Option<String>>,
        pub retries: VecDeque<bool>,
        pub limit_choices: VecDeque<LimitChoice>,
        pub offers: Vec<BypassOffer>,
        pub challenges: Vec<Challenge>,
    }

    #[derive(Debug, Clone)]
    pub enum Answer {
        Correct,
        Wrong,
        GiveUp,
        Text(String),
    }

    impl ScriptedPrompter {
        pub fn accepting() -> Self {
            Self::default()
        }

        pub fn answer(mut self, answer: Answer) -> Self {
            self.answers.push_back(answer);
            self
        }

        pub fn reason(mut self, reason: Option<&str>) -> Self {
            self.reasons.push_back(reason.map(str::to_string));
            self
        }

        pub fn decline(mut self) -> Self {
            self.accept_offer.push_back(false);
            self
        }

        pub fn retry(mut self, again: bool) -> Self {
            self.retries.push_back(again);
            self
        }

        pub fn at_limit(mut self, choice: LimitChoice) -> Self {
            self.limit_choices.push_back(choice);
            self
        }
    }

    impl Prompter for ScriptedPrompter {
        fn offer_bypass(&mut self, offer: &BypassOffer) -> Result<bool> {
            self.offers.push(offer.clone());
            Ok(self.accept_offer.pop_front().unwrap_or(true))
        }

        fn answer_challenge(&mut self, challenge: &Challenge) -> Result<Option<String>> {
            self.challenges.push(challenge.clone());
            Ok(match self.answers.pop_front().unwrap_or(Answer::GiveUp) {
                Answer::Correct => Some(challenge.expected_answer.to_string()),
                Answer::Wrong => Some((challenge.expected_answer + 1).to_string()),
                Answer::GiveUp => None,
                Answer::Text(text) => Some(text),
            })
        }

        fn justification(&mut self, _attempt: u32) -> Result<Option<String>> {
            Ok(self.reasons.pop_front().flatten())
        }

        fn retry_justification(&mut self, _min_chars: usize) -> Result<bool> {
            Ok(self.retries.pop_front().unwrap_or(false))
        }

        fn session_limit_reached(&mut self, _summary: &SessionSummary) -> Result<LimitChoice> {
            Ok(self
                .limit_choices
                .pop_front()
                .unwrap_or(LimitChoice::RequestExtension))
        }
    }
}
