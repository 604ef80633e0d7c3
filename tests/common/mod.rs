#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use std::collections::VecDeque;

use scroll_guard::limits::{
    BypassOffer, Challenge, LimitChoice, Notice, Notifier, Prompter, SessionSummary,
};

/// Local time on 2026-10-`day`
pub fn at(day: u32, hour: u32, min: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, day, hour, min, 0).unwrap()
}

/// How to answer the next challenge
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Correct,
    Wrong,
    GiveUp,
}

/// Prompter replaying queued answers; anything unscripted declines
#[derive(Debug, Default)]
pub struct Script {
    pub offers: VecDeque<bool>,
    pub replies: VecDeque<Reply>,
    pub reasons: VecDeque<String>,
    pub at_limit: VecDeque<LimitChoice>,
    pub offers_seen: Vec<BypassOffer>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(mut self, reply: Reply) -> Self {
        self.offers.push_back(true);
        self.replies.push_back(reply);
        self
    }

    pub fn decline(mut self) -> Self {
        self.offers.push_back(false);
        self
    }

    pub fn reason(mut self, reason: &str) -> Self {
        self.reasons.push_back(reason.to_string());
        self
    }

    pub fn at_limit(mut self, choice: LimitChoice) -> Self {
        self.at_limit.push_back(choice);
        self
    }
}

impl Prompter for Script {
    fn offer_bypass(&mut self, offer: &BypassOffer) -> Result<bool> {
        self.offers_seen.push(offer.clone());
        Ok(self.offers.pop_front().unwrap_or(false))
    }

    fn answer_challenge(&mut self, challenge: &Challenge) -> Result<Option<String>> {
        Ok(match self.replies.pop_front().unwrap_or(Reply::GiveUp) {
            Reply::Correct => Some(challenge.expected_answer.to_string()),
            Reply::Wrong => Some((challenge.expected_answer - 1).to_string()),
            Reply::GiveUp => None,
        })
    }

    fn justification(&mut self, _attempt: u32) -> Result<Option<String>> {
        Ok(self.reasons.pop_front())
    }

    fn retry_justification(&mut self, _min_chars: usize) -> Result<bool> {
        Ok(!self.reasons.is_empty())
    }

    fn session_limit_reached(&mut self, _summary: &SessionSummary) -> Result<LimitChoice> {
        Ok(self.at_limit.pop_front().unwrap_or(LimitChoice::LockOut))
    }
}

/// Notifier keeping every notice
#[derive(Debug, Default)]
pub struct Recorder {
    pub notices: Vec<Notice>,
}

impl Notifier for Recorder {
    fn notify(&mut self, notice: &Notice) -> Result<()> {
        self.notices.push(notice.clone());
        Ok(())
    }
}
