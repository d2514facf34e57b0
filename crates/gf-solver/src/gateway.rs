//! Gateway contract and configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use gf_core::{SolverQuery, ValidationResult};

use crate::capture::Severity;

/// Configuration for a solver gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Solver executable
    pub executable: PathBuf,
    /// Fixed definitions loaded before every artifact
    pub base_program: PathBuf,
    /// Wall-clock budget for one validation call
    pub timeout: Duration,
    /// Lowest diagnostic severity that invalidates an artifact
    pub capture_threshold: Severity,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("swipl"),
            base_program: PathBuf::from("DATA/solver.pl"),
            timeout: Duration::from_secs(30),
            capture_threshold: Severity::Warning,
        }
    }
}

impl GatewayConfig {
    /// Default config for the given base program.
    pub fn for_base_program(base_program: impl Into<PathBuf>) -> Self {
        Self {
            base_program: base_program.into(),
            ..Default::default()
        }
    }

    /// Every line the solver prints on stderr invalidates the artifact.
    pub fn strict(base_program: impl Into<PathBuf>) -> Self {
        Self {
            capture_threshold: Severity::Info,
            ..Self::for_base_program(base_program)
        }
    }

    /// Only `ERROR:` diagnostics invalidate the artifact.
    pub fn lenient(base_program: impl Into<PathBuf>) -> Self {
        Self {
            capture_threshold: Severity::Error,
            timeout: Duration::from_secs(60),
            ..Self::for_base_program(base_program)
        }
    }
}

/// Errors that prevent a gateway from validating anything at all.
///
/// Problems with a particular artifact are never errors; they are reported
/// as an invalid [`ValidationResult`].
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Base program not found: {}", .0.display())]
    MissingBaseProgram(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Validates candidate artifacts against a fixed base program.
#[async_trait]
pub trait SolverGateway: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Base definitions every query is checked against.
    fn base_program(&self) -> &Path;

    /// Check that the gateway can run at all (session setup).
    async fn ensure_ready(&self) -> Result<(), SolverError> {
        let base = self.base_program();
        match tokio::fs::metadata(base).await {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(SolverError::MissingBaseProgram(base.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SolverError::MissingBaseProgram(base.to_path_buf()))
            }
            Err(e) => Err(SolverError::IoError(e)),
        }
    }

    /// Build the query for a candidate artifact.
    fn query_for(&self, artifact: &Path) -> SolverQuery {
        SolverQuery::new(artifact, self.base_program())
    }

    /// Load the base program and the artifact in a fresh solver context.
    async fn validate(&self, query: &SolverQuery) -> ValidationResult;
}
