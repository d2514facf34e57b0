//! Prompt construction.
//!
//! Two prompts drive a session: the instruction prompt, rendered once from a
//! template, and the feedback prompt, composed from the solver trace after
//! every failed attempt.

use std::path::{Path, PathBuf};

/// Placeholder replaced by the game description.
pub const GAME_DESCRIPTION_SLOT: &str = "{game_description}";

/// Instruction template with a single substitution point.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: PathBuf,
    text: String,
}

/// Template could not be loaded.
#[derive(Debug, thiserror::Error)]
#[error("Failed to read prompt template {}: {source}", .path.display())]
pub struct TemplateError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl PromptTemplate {
    /// Load a template file.
    pub async fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TemplateError {
                path: path.to_path_buf(),
                source,
            })?;

        if !text.contains(GAME_DESCRIPTION_SLOT) {
            tracing::warn!(
                template = %path.display(),
                "Prompt template has no {GAME_DESCRIPTION_SLOT} placeholder"
            );
        }

        Ok(Self {
            source: path.to_path_buf(),
            text,
        })
    }

    /// Build a template from an in-memory string.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: PathBuf::from("<inline>"),
            text: text.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Fill in the game description.
    pub fn render(&self, game_description: &str) -> String {
        self.text.replace(GAME_DESCRIPTION_SLOT, game_description)
    }
}

/// Diagnostic categories appended to every feedback prompt.
const CHECKLIST: &[(&str, &[&str])] = &[
    (
        "Error Location",
        &[
            "Use the line numbers and predicate names mentioned in the error trace to pinpoint the exact location of the error in your code.",
            "Examine the surrounding context of the error to understand how it might be affecting or be affected by other parts of your code.",
        ],
    ),
    (
        "Error Type",
        &[
            "Identify the specific type of error indicated in the trace (e.g., syntax error, undefined predicate, argument mismatch, etc.).",
            "Research this error type if you're unfamiliar with it to understand its common causes and solutions.",
        ],
    ),
    (
        "Syntax Conformity",
        &[
            "In light of the error trace, double-check that all predicates are correctly defined with proper arity, especially near the error location.",
            "Ensure all clauses end with a period (.), paying extra attention to the area indicated by the error.",
            "Verify the correct use of Prolog punctuation, including commas, semicolons, and parentheses.",
        ],
    ),
    (
        "Logical Consistency",
        &[
            "Review the logical structure of your predicates, focusing on the area highlighted in the error trace.",
            "Check for proper use of logical operators such as AND (,), OR (;), and NOT (\\+), ensuring they align with your intended logic.",
        ],
    ),
    (
        "Variable Handling",
        &[
            "Examine variable names and scopes, particularly those mentioned in the error trace.",
            "Look for potential issues with variable instantiation or unification.",
        ],
    ),
    (
        "Predicate Definitions and Calls",
        &[
            "Verify that all predicates used in the program, especially those mentioned in the error trace, are properly defined or imported.",
            "Check for consistency in predicate names and arities across the entire program.",
        ],
    ),
    (
        "Module-Related Issues",
        &["If the error involves modules, check module declarations, imports, and exports."],
    ),
    (
        "Data Type Mismatches",
        &["Look for any type mismatches or improper type handling, particularly if the error suggests type-related issues."],
    ),
    (
        "Cut (!) Usage",
        &["If the error trace suggests issues with choice points or backtracking, review any use of the cut operator (!)."],
    ),
    (
        "I/O and File Operations",
        &["For errors related to file operations, verify file paths and the correct usage of I/O predicates."],
    ),
    (
        "Built-in Predicate Usage",
        &["Confirm that built-in predicates are used correctly and with the right arity, especially those flagged in the error trace."],
    ),
    (
        "Character Encoding",
        &["Check for any non-ASCII or special characters that might be causing issues, particularly if the error suggests encoding problems."],
    ),
];

/// Turns a solver trace into a correction prompt.
pub struct FeedbackComposer;

impl FeedbackComposer {
    /// Compose the feedback prompt for a failed attempt.
    ///
    /// The trace is embedded verbatim. Works for an empty trace too.
    pub fn compose(trace: &str) -> String {
        let mut prompt = format!(
            "Your Prolog code produced the following error(s):\n{trace}\n\
             Your faulty code requires careful review and debugging. \
             An error trace has been provided, which is a crucial tool in identifying and resolving issues in your code. \
             Fix your code based on the trace and the suggestions below.\n"
        );

        for (index, (category, checks)) in CHECKLIST.iter().enumerate() {
            prompt.push_str(&format!("{}. {}:\n", index + 1, category));
            for check in checks.iter() {
                prompt.push_str(check);
                prompt.push('\n');
            }
        }

        prompt
    }

    /// Number of checklist categories.
    pub fn category_count() -> usize {
        CHECKLIST.len()
    }
}
