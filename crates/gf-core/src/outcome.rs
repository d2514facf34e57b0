//! Session outcome states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Final state of a formalisation session.
///
/// `Start` is only ever observed before the first attempt concludes.
/// The remaining three variants are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormalizationOutcome {
    /// No attempt has concluded yet
    Start,
    /// Validated on the first attempt
    Correct,
    /// Validated after at least one correction
    Fixed,
    /// Attempt budget exhausted without a valid artifact
    Faulty,
}

impl FormalizationOutcome {
    /// All outcomes in display order.
    pub const ALL: [FormalizationOutcome; 4] = [
        FormalizationOutcome::Start,
        FormalizationOutcome::Correct,
        FormalizationOutcome::Fixed,
        FormalizationOutcome::Faulty,
    ];

    /// Tag used in log file names and reports.
    pub fn name(&self) -> &'static str {
        match self {
            FormalizationOutcome::Start => "START",
            FormalizationOutcome::Correct => "CORRECT",
            FormalizationOutcome::Fixed => "FIXED",
            FormalizationOutcome::Faulty => "FAULTY",
        }
    }

    /// Whether the session produced a valid artifact.
    pub fn is_success(&self) -> bool {
        matches!(self, FormalizationOutcome::Correct | FormalizationOutcome::Fixed)
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FormalizationOutcome::Start)
    }

    /// Outcome of a valid attempt with the given 0-based index.
    pub fn on_valid(attempt_index: u32) -> Self {
        if attempt_index == 0 {
            FormalizationOutcome::Correct
        } else {
            FormalizationOutcome::Fixed
        }
    }
}

impl fmt::Display for FormalizationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown outcome tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown formalisation outcome: {0}")]
pub struct ParseOutcomeError(pub String);

impl FromStr for FormalizationOutcome {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormalizationOutcome::ALL
            .into_iter()
            .find(|outcome| outcome.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseOutcomeError(s.to_string()))
    }
}
