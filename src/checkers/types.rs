//! Core types for checker results.

use serde::{Deserialize, Serialize};

/// Outcome of one checker run against one matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    NotApplicable,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::NotApplicable => "not_applicable",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict produced by a checker.
///
/// A failed verdict always carries a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub checker_id: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Verdict {
    pub fn passed(checker_id: &str) -> Self {
        Self {
            checker_id: checker_id.to_string(),
            outcome: Outcome::Passed,
            message: None,
        }
    }

    /// A passing verdict with an informational message.
    pub fn passed_with(checker_id: &str, message: impl Into<String>) -> Self {
        Self {
            checker_id: checker_id.to_string(),
            outcome: Outcome::Passed,
            message: Some(message.into()),
        }
    }

    pub fn failed(checker_id: &str, message: impl Into<String>) -> Self {
        Self {
            checker_id: checker_id.to_string(),
            outcome: Outcome::Failed,
            message: Some(message.into()),
        }
    }

    pub fn not_applicable(checker_id: &str, reason: impl Into<String>) -> Self {
        Self {
            checker_id: checker_id.to_string(),
            outcome: Outcome::NotApplicable,
            message: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }

    pub fn is_passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    /// Message text, or an empty string.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

/// Join violation lines, keeping at most `limit` of them.
pub(crate) fn bounded_lines(lines: &[String], limit: usize) -> String {
    let mut shown: Vec<String> = lines.iter().take(limit).cloned().collect();
    if lines.len() > limit {
        shown.push(format!("... and {} more", lines.len() - limit));
    }
    shown.join("\n")
}
