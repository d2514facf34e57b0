//! Solver queries.

use std::path::{Path, PathBuf};

/// One validation request: the base program plus the candidate artifact.
///
/// Built fresh for every attempt and dropped after the gateway answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverQuery {
    /// Candidate program written by the loop
    pub artifact_reference: PathBuf,
    /// Fixed solver definitions loaded before the artifact
    pub base_program_reference: PathBuf,
}

impl SolverQuery {
    pub fn new(artifact: impl Into<PathBuf>, base_program: impl Into<PathBuf>) -> Self {
        Self {
            artifact_reference: artifact.into(),
            base_program_reference: base_program.into(),
        }
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact_reference
    }

    pub fn base_program(&self) -> &Path {
        &self.base_program_reference
    }
}
