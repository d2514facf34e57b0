//! SWI-Prolog gateway.
//!
//! Runs `swipl -q -g <goal> -t halt` once per validation call. The goal
//! consults the base program and then the artifact inside `catch/3`; a raised
//! exception is printed on stdout behind [`RAISED_MARKER`] and the process
//! halts with status 2.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use gf_core::{SolverQuery, ValidationResult};
use tokio::process::Command;

use crate::capture::DiagnosticCapture;
use crate::gateway::{GatewayConfig, SolverGateway};

/// Marker preceding the printed exception term on stdout.
pub const RAISED_MARKER: &str = "GF_RAISED:";

/// Gateway backed by a fresh `swipl` process per call.
pub struct SwiplGateway {
    config: GatewayConfig,
}

impl SwiplGateway {
    /// Create a new gateway with the given config.
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Create with default settings for the given base program.
    pub fn with_base_program(base_program: impl Into<PathBuf>) -> Self {
        Self::new(GatewayConfig::for_base_program(base_program))
    }

    /// Get the current config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl SolverGateway for SwiplGateway {
    fn name(&self) -> &str {
        "swipl"
    }

    fn base_program(&self) -> &Path {
        &self.config.base_program
    }

    async fn validate(&self, query: &SolverQuery) -> ValidationResult {
        let start = Instant::now();
        let goal = load_goal(query.base_program(), query.artifact());
        let mut capture = DiagnosticCapture::install(self.config.capture_threshold);

        let result = tokio::time::timeout(
            self.config.timeout,
            Command::new(&self.config.executable)
                .args(["-q", "-g", goal.as_str(), "-t", "halt"])
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!(executable = %self.config.executable.display(), "Failed to start solver: {e}");
                return ValidationResult::fail(format!(
                    "Failed to start solver {}: {}",
                    self.config.executable.display(),
                    e
                ));
            }
            Err(_) => {
                tracing::warn!(artifact = %query.artifact().display(), "Solver timed out");
                return ValidationResult::fail(format!(
                    "Solver timed out after {:?} while loading {}",
                    self.config.timeout,
                    query.artifact().display()
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        capture.observe_all(&stderr);
        let diagnostics = capture.release();

        let verdict = if !output.status.success() {
            let trace = extract_raised(&stdout)
                .or_else(|| (!diagnostics.is_empty()).then(|| diagnostics.clone()))
                .unwrap_or_else(|| format!("Solver exited with {}", output.status));
            tracing::error!("Prolog error trace: {trace}");
            ValidationResult::fail(trace)
        } else if !diagnostics.is_empty() {
            tracing::error!("Prolog error from logs: {diagnostics}");
            ValidationResult::fail(diagnostics)
        } else {
            ValidationResult::pass()
        };

        tracing::debug!(
            artifact = %query.artifact().display(),
            valid = verdict.valid,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Validation finished"
        );

        verdict
    }
}

/// Build the Prolog goal that loads both programs.
fn load_goal(base_program: &Path, artifact: &Path) -> String {
    format!(
        "catch((consult({base}), consult({artifact})), E, \
         (print_message(error, E), format(user_output, \"~n{marker} ~q~n\", [E]), halt(2)))",
        base = quote_atom(&base_program.to_string_lossy()),
        artifact = quote_atom(&artifact.to_string_lossy()),
        marker = RAISED_MARKER,
    )
}

/// Quote a string as a Prolog atom.
fn quote_atom(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Exception text printed after the raised marker, if any.
fn extract_raised(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(RAISED_MARKER))
        .map(|rest| rest.trim().to_string())
        .filter(|rest| !rest.is_empty())
}
