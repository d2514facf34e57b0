//! Scoped capture of solver diagnostics.
//!
//! SWI-Prolog reports most load problems (syntax errors, discontiguous
//! clauses, redefined procedures) on stderr and keeps going. A
//! [`DiagnosticCapture`] is installed for exactly one validation call and
//! consumed when the verdict is built, so captured text can never leak into
//! a later call.

use serde::{Deserialize, Serialize};

/// Severity of a solver diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Plain output without a severity prefix
    Info = 0,
    /// `Warning:` lines
    Warning = 1,
    /// `ERROR:` lines
    Error = 2,
}

impl Severity {
    /// Severity announced by a line prefix, if any.
    pub fn from_prefix(line: &str) -> Option<Severity> {
        if line.starts_with("ERROR:") {
            Some(Severity::Error)
        } else if line.starts_with("Warning:") {
            Some(Severity::Warning)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Collects diagnostic lines at or above a threshold for one validation call.
#[derive(Debug)]
pub struct DiagnosticCapture {
    threshold: Severity,
    current: Severity,
    lines: Vec<String>,
}

impl DiagnosticCapture {
    /// Install a fresh, empty capture sink.
    #[must_use]
    pub fn install(threshold: Severity) -> Self {
        Self {
            threshold,
            current: Severity::Info,
            lines: Vec::new(),
        }
    }

    /// Feed one line of solver diagnostic output.
    ///
    /// Lines without a prefix continue the previous message and inherit its
    /// severity.
    pub fn observe(&mut self, line: &str) {
        if let Some(severity) = Severity::from_prefix(line) {
            self.current = severity;
        } else if line.trim().is_empty() {
            self.current = Severity::Info;
            return;
        }

        if self.current >= self.threshold {
            self.lines.push(line.to_string());
        }
    }

    /// Feed a whole block of output.
    pub fn observe_all(&mut self, output: &str) {
        for line in output.lines() {
            self.observe(line);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// Remove the sink and return everything it captured.
    #[must_use]
    pub fn release(self) -> String {
        self.lines.join("\n").trim().to_string()
    }
}
