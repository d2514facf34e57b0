//! Attempt records and validation results.
//!
//! Every attempt made by the formalisation loop is recorded exactly once,
//! after validation has produced a verdict. Records are never mutated.

use serde::{Deserialize, Serialize};

/// Verdict returned by a solver gateway for one candidate artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether both loads succeeded and no critical diagnostic was captured
    pub valid: bool,

    /// Raised error text or captured diagnostics (empty when valid)
    pub trace: String,
}

impl ValidationResult {
    /// Create a passing result.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            valid: true,
            trace: String::new(),
        }
    }

    /// Create a failing result carrying the solver trace.
    ///
    /// The trace may be empty when the solver rejected the artifact
    /// without saying why.
    #[must_use]
    pub fn fail(trace: impl Into<String>) -> Self {
        Self {
            valid: false,
            trace: trace.into(),
        }
    }

    /// Format as a single-line status for logging.
    #[must_use]
    pub fn format_status(&self) -> String {
        if self.valid {
            "[PASS]".to_string()
        } else {
            let first_line = self.trace.lines().next().unwrap_or("no trace");
            format!("[FAIL] {}", first_line)
        }
    }
}

/// Record of a single generate → extract → validate cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormalizationAttempt {
    /// Attempt number (0-indexed)
    pub attempt_index: u32,

    /// Raw generator output
    pub generated_text: String,

    /// Artifact extracted from the output, if a delimited region was found
    pub extracted_artifact: Option<String>,

    /// Solver verdict (or the extraction failure, expressed as one)
    pub validation_result: ValidationResult,
}

impl FormalizationAttempt {
    /// Create an attempt record.
    #[must_use]
    pub fn new(
        attempt_index: u32,
        generated_text: String,
        extracted_artifact: Option<String>,
        validation_result: ValidationResult,
    ) -> Self {
        debug_assert!(
            extracted_artifact.is_some() || !validation_result.valid,
            "An attempt without an artifact cannot be valid"
        );

        Self {
            attempt_index,
            generated_text,
            extracted_artifact,
            validation_result,
        }
    }

    /// Whether this attempt produced a valid artifact.
    pub fn is_valid(&self) -> bool {
        self.validation_result.valid
    }

    /// Solver trace for this attempt.
    pub fn trace(&self) -> &str {
        &self.validation_result.trace
    }
}
