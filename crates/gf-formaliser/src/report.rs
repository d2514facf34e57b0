//! Session and batch reports.

use std::collections::BTreeMap;
use std::time::Duration;

use gf_core::{FormalizationAttempt, FormalizationOutcome};

use crate::store::SessionId;

/// Result of one formalisation session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Which session this was
    pub session: SessionId,
    /// Final outcome
    pub outcome: FormalizationOutcome,
    /// Every attempt made, in order
    pub attempts: Vec<FormalizationAttempt>,
    /// Total duration
    pub duration: Duration,
}

impl SessionReport {
    /// The valid artifact, if the session produced one.
    pub fn artifact(&self) -> Option<&str> {
        self.attempts
            .iter()
            .find(|attempt| attempt.is_valid())
            .and_then(|attempt| attempt.extracted_artifact.as_deref())
    }

    /// Number of corrections requested.
    pub fn corrections(&self) -> usize {
        self.attempts.iter().filter(|attempt| !attempt.is_valid()).count()
    }

    /// Format as a summary string.
    pub fn format_summary(&self) -> String {
        let mut summary = format!(
            "[{}] {} in {:.2}s ({} attempt(s))\n",
            self.outcome,
            self.session,
            self.duration.as_secs_f64(),
            self.attempts.len(),
        );

        for attempt in &self.attempts {
            summary.push_str(&format!(
                "  #{}: {}\n",
                attempt.attempt_index,
                attempt.validation_result.format_status()
            ));
        }

        if let Some(artifact) = self.artifact() {
            summary.push_str(&format!(
                "  Valid program: {} line(s)\n",
                artifact.lines().count()
            ));
        }

        summary
    }
}

/// Tally of outcomes over a batch of sessions.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    counts: BTreeMap<&'static str, u32>,
    errors: u32,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a concluded session.
    pub fn record(&mut self, outcome: FormalizationOutcome) {
        *self.counts.entry(outcome.name()).or_insert(0) += 1;
    }

    /// Record a session that ended in error.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn count(&self, outcome: FormalizationOutcome) -> u32 {
        self.counts.get(outcome.name()).copied().unwrap_or(0)
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Concluded plus errored sessions.
    pub fn total(&self) -> u32 {
        self.counts.values().sum::<u32>() + self.errors
    }

    /// Fraction of all sessions that produced a valid program.
    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let successes =
            self.count(FormalizationOutcome::Correct) + self.count(FormalizationOutcome::Fixed);
        f64::from(successes) / f64::from(total)
    }

    pub fn format_report(&self) -> String {
        let mut report = format!("Sessions: {}\n", self.total());
        for outcome in [
            FormalizationOutcome::Correct,
            FormalizationOutcome::Fixed,
            FormalizationOutcome::Faulty,
        ] {
            report.push_str(&format!("  {:<8} {}\n", outcome.name(), self.count(outcome)));
        }
        report.push_str(&format!("  {:<8} {}\n", "ERROR", self.errors));
        report.push_str(&format!("Success rate: {:.1}%\n", self.success_rate() * 100.0));
        report
    }
}
