//! Append-only reasoning log for one formalisation session.
//!
//! Each entry ends with `~\n`. Attempts are tagged with their index so the
//! log can be split back into prompt / response / trace triples:
//!
//! ```text
//! ###PROMPT##
//! <instruction prompt>~
//!
//! ###ATTEMPT##0~
//! RESPONSE##
//! <generator output>~
//! TRACE##
//! <solver trace>~
//! CORRECTING PROMPT##
//! <feedback prompt>~
//! ```
//!
//! A log is created for one session and consumed by [`SessionLog::finish`];
//! it is never shared between sessions.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

const SEPARATOR: &str = "~\n";
const PROMPT_TAG: &str = "###PROMPT##\n";
const ATTEMPT_TAG: &str = "###ATTEMPT##";
const RESPONSE_TAG: &str = "RESPONSE##\n";
const TRACE_TAG: &str = "TRACE##\n";
const CORRECTION_TAG: &str = "CORRECTING PROMPT##\n";

/// Per-session log sink.
///
/// Write failures never interrupt the session; the first one is kept and
/// returned by [`SessionLog::finish`].
pub struct SessionLog<W: Write> {
    sink: W,
    entries: usize,
    error: Option<io::Error>,
}

impl SessionLog<BufWriter<File>> {
    /// Open (or append to) a log file.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl SessionLog<Vec<u8>> {
    /// Log kept in memory.
    pub fn in_memory() -> Self {
        Self::new(Vec::new())
    }

    /// Log contents so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.sink).into_owned()
    }
}

impl<W: Write> SessionLog<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            entries: 0,
            error: None,
        }
    }

    /// Number of entries written.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn record_prompt(&mut self, prompt: &str) {
        self.entry(&format!("{PROMPT_TAG}{prompt}"));
    }

    pub fn record_response(&mut self, attempt_index: u32, response: &str) {
        self.entry(&format!("\n{ATTEMPT_TAG}{attempt_index}"));
        self.entry(&format!("{RESPONSE_TAG}{response}"));
    }

    pub fn record_trace(&mut self, trace: &str) {
        self.entry(&format!("{TRACE_TAG}{trace}"));
    }

    pub fn record_correction(&mut self, feedback: &str) {
        self.entry(&format!("{CORRECTION_TAG}{feedback}"));
    }

    /// Flush and release the sink.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.sink.flush()?;
        Ok(self.sink)
    }

    fn entry(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        match write!(self.sink, "{text}{SEPARATOR}") {
            Ok(()) => self.entries += 1,
            Err(e) => {
                tracing::warn!("Session log write failed: {e}");
                self.error = Some(e);
            }
        }
    }
}

/// One parsed log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Prompt(String),
    Attempt(u32),
    Response(String),
    Trace(String),
    Correction(String),
}

/// Split a session log back into entries.
///
/// Unrecognised fragments are skipped.
pub fn parse_log(text: &str) -> Vec<LogEntry> {
    text.split(SEPARATOR)
        .filter_map(|raw| {
            let entry = raw.trim_start_matches('\n');
            if let Some(rest) = entry.strip_prefix(PROMPT_TAG) {
                Some(LogEntry::Prompt(rest.to_string()))
            } else if let Some(rest) = entry.strip_prefix(ATTEMPT_TAG) {
                rest.trim().parse().ok().map(LogEntry::Attempt)
            } else if let Some(rest) = entry.strip_prefix(RESPONSE_TAG) {
                Some(LogEntry::Response(rest.to_string()))
            } else if let Some(rest) = entry.strip_prefix(TRACE_TAG) {
                Some(LogEntry::Trace(rest.to_string()))
            } else {
                entry
                    .strip_prefix(CORRECTION_TAG)
                    .map(|rest| LogEntry::Correction(rest.to_string()))
            }
        })
        .collect()
}
