//! Experiment configuration.
//!
//! Loaded from a TOML file; every field has a default so a partial file (or
//! none at all) is fine:
//!
//! ```toml
//! [paths]
//! game_dir = "DATA/INPUT"
//! out_dir = "OUTPUT"
//! solver_path = "DATA/solver.pl"
//! template_path = "DATA/prompt_template.txt"
//!
//! [general]
//! repetitions = 1
//! max_attempts = 10
//! generation_timeout_secs = 300
//!
//! [generator]
//! model = "gpt-4o"
//!
//! [solver]
//! timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use gf_solver::{GatewayConfig, Severity};
use serde::{Deserialize, Serialize};

use crate::client::OpenAiConfig;
use crate::formaliser::LoopConfig;
use crate::generator::DEFAULT_MAX_TOKENS;

/// File and directory locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory of natural-language game descriptions
    pub game_dir: PathBuf,
    /// Root of prompts/, axioms/ and logs/
    pub out_dir: PathBuf,
    /// Base Prolog program loaded before every artifact
    pub solver_path: PathBuf,
    /// Instruction prompt template
    pub template_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            game_dir: PathBuf::from("DATA/INPUT"),
            out_dir: PathBuf::from("OUTPUT"),
            solver_path: PathBuf::from("DATA/solver.pl"),
            template_path: PathBuf::from("DATA/prompt_template.txt"),
        }
    }
}

/// Loop and batch parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Sessions per game file
    pub repetitions: u32,
    /// Attempt budget per session
    pub max_attempts: u32,
    /// Completion budget per prompt
    pub max_tokens: u32,
    /// Wall-clock budget for one generator call
    pub generation_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            repetitions: 1,
            max_attempts: 10,
            max_tokens: DEFAULT_MAX_TOKENS,
            generation_timeout_secs: 300,
        }
    }
}

/// Solver process parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub executable: PathBuf,
    pub timeout_secs: u64,
    pub capture_threshold: Severity,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("swipl"),
            timeout_secs: 30,
            capture_threshold: Severity::Warning,
        }
    }
}

/// Full experiment configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub paths: PathsConfig,
    pub general: GeneralConfig,
    pub generator: OpenAiConfig,
    pub solver: SolverConfig,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value: {0}")]
    Invalid(String),
}

impl ExperimentConfig {
    /// Quick config for smoke runs.
    pub fn quick() -> Self {
        Self {
            general: GeneralConfig {
                repetitions: 1,
                max_attempts: 3,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Thorough config for full experiments.
    pub fn thorough() -> Self {
        Self {
            general: GeneralConfig {
                repetitions: 5,
                max_attempts: 10,
                ..Default::default()
            },
            solver: SolverConfig {
                timeout_secs: 120,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from TOML text without validating.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reject values the loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.max_attempts == 0 {
            return Err(ConfigError::Invalid("general.max_attempts must be at least 1".into()));
        }
        if self.general.max_tokens == 0 {
            return Err(ConfigError::Invalid("general.max_tokens must be at least 1".into()));
        }
        if self.general.generation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "general.generation_timeout_secs must be at least 1".into(),
            ));
        }
        if self.solver.timeout_secs == 0 {
            return Err(ConfigError::Invalid("solver.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Loop parameters.
    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            max_attempts: self.general.max_attempts,
            max_tokens: self.general.max_tokens,
            generation_timeout: Duration::from_secs(self.general.generation_timeout_secs),
            ..Default::default()
        }
    }

    /// Gateway parameters.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            executable: self.solver.executable.clone(),
            base_program: self.paths.solver_path.clone(),
            timeout: Duration::from_secs(self.solver.timeout_secs),
            capture_threshold: self.solver.capture_threshold,
        }
    }
}
