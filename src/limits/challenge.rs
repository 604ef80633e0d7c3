use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier of an arithmetic challenge
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// a + b with a, b in 1..=20
    Easy,
    /// a + b or a - b with a, b in 10..=59
    Medium,
    /// a × b with a in 2..=21 and b in 2..=13
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => anyhow::bail!("Unknown difficulty '{}' (expected easy, medium or hard)", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
}

impl Operator {
    pub fn apply(self, a: i64, b: i64) -> i64 {
        match self {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
            Operator::Multiply => a * b,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '−',
            Operator::Multiply => '×',
        }
    }
}

/// A single arithmetic problem; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub difficulty: Difficulty,
    pub operand_a: i64,
    pub operand_b: i64,
    pub operator: Operator,
    pub expected_answer: i64,
}

impl Challenge {
    pub fn new(difficulty: Difficulty, operand_a: i64, operand_b: i64, operator: Operator) -> Self {
        Self {
            difficulty,
            operand_a,
            operand_b,
            operator,
            expected_answer: operator.apply(operand_a, operand_b),
        }
    }

    /// Question text, e.g. `7 + 13 = ?`
    pub fn question(&self) -> String {
        format!("{} {} {} = ?", self.operand_a, self.operator.symbol(), self.operand_b)
    }

    /// Check a typed answer; anything that is not an integer is simply wrong
    pub fn verify(&self, candidate: &str) -> bool {
        candidate
            .trim()
            .parse::<i64>()
            .map(|answer| self.verify_answer(answer))
            .unwrap_or(false)
    }

    pub fn verify_answer(&self, answer: i64) -> bool {
        answer == self.expected_answer
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.operand_a, self.operator.symbol(), self.operand_b)
    }
}

/// Produces challenges from an injected random source
pub struct ChallengeGenerator<R> {
    rng: R,
}

impl<R: Rng> ChallengeGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self, difficulty: Difficulty) -> Challenge {
        generate(&mut self.rng, difficulty)
    }
}

/// Draw one challenge at `difficulty` from `rng`
pub fn generate<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Challenge {
    match difficulty {
        Difficulty::Easy => {
            let a = rng.gen_range(1..=20);
            let b = rng.gen_range(1..=20);
            Challenge::new(difficulty, a, b, Operator::Add)
        }
        Difficulty::Medium => {
            let a = rng.gen_range(10..=59);
            let b = rng.gen_range(10..=59);
            let operator = if rng.gen_bool(0.5) {
                Operator::Add
            } else {
                Operator::Subtract
            };
            Challenge::new(difficulty, a, b, operator)
        }
        Difficulty::Hard => {
            let a = rng.gen_range(2..=21);
            let b = rng.gen_range(2..=13);
            Challenge::new(difficulty, a, b, Operator::Multiply)
        }
    }
}
