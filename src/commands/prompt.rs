use anyhow::Result;
use dialoguer::{Confirm, Input, Select};

use scroll_guard::limits::{
    BypassOffer, Challenge, LimitChoice, Prompter, SessionSummary,
};

/// Prompter asking questions on the terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn offer_bypass(&mut self, offer: &BypassOffer) -> Result<bool> {
        println!();
        println!("⏰ Time limit exceeded");
        println!("  Used today: {} min", offer.usage_minutes);
        println!("  Limit: {} min", offer.limit_minutes);
        println!("  Bypasses today: {}", offer.bypass_count);
        println!();

        let action = if offer.requirement.justification {
            format!(
                "Complete a {} challenge and explain why ({} min)",
                offer.requirement.difficulty, offer.extension_minutes
            )
        } else {
            format!(
                "Solve a {} challenge for {} more minutes",
                offer.requirement.difficulty, offer.extension_minutes
            )
        };

        let choice = Select::new()
            .with_prompt("What now?")
            .items(&[action.as_str(), "Lock me out until tomorrow"])
            .default(0)
            .interact_opt()?;

        Ok(choice == Some(0))
    }

    fn answer_challenge(&mut self, challenge: &Challenge) -> Result<Option<String>> {
        println!();
        println!("🧮 Solve this to continue (leave empty to give up):");
        let answer: String = Input::<String>::new()
            .with_prompt(challenge.question())
            .allow_empty(true)
            .interact_text()?;

        let answer = answer.trim().to_string();
        if answer.is_empty() {
            return Ok(None);
        }
        if challenge.verify(&answer) {
            println!("✓ Correct!");
        }
        Ok(Some(answer))
    }

    fn justification(&mut self, attempt: u32) -> Result<Option<String>> {
        if attempt == 1 {
            println!();
            println!("✍️  Why do you need more time? This will be logged for accountability.");
        }
        let reason: String = Input::<String>::new()
            .with_prompt("Your reason")
            .allow_empty(true)
            .interact_text()?;
        Ok(Some(reason))
    }

    fn retry_justification(&mut self, min_chars: usize) -> Result<bool> {
        println!("Please provide a meaningful reason (minimum {} characters).", min_chars);
        Ok(Confirm::new()
            .with_prompt("Try again?")
            .default(true)
            .interact()?)
    }

    fn session_limit_reached(&mut self, summary: &SessionSummary) -> Result<LimitChoice> {
        println!();
        println!("⚠ You've reached your limit! ({} of {} min)", summary.total_minutes, summary.limit_minutes);

        let choice = Select::new()
            .with_prompt("What now?")
            .items(&["Request extension", "Lock me out"])
            .default(0)
            .interact_opt()?;

        Ok(match choice {
            Some(0) => LimitChoice::RequestExtension,
            _ => LimitChoice::LockOut,
        })
    }
}

/// Ask a yes/no question, defaulting to no
pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}
