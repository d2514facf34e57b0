//! The self-correcting formalisation loop.
//!
//! One session runs at most `max_attempts` generate → extract → validate
//! cycles. A failed attempt leaves the faulty reply in the conversation and
//! sends a feedback prompt built from the solver trace; the instruction
//! prompt is only ever sent once.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use gf_core::{FormalizationAttempt, FormalizationOutcome, ValidationResult};
use gf_solver::{SolverError, SolverGateway};

use crate::extract::{ArtifactExtractor, DEFAULT_DELIMITER};
use crate::generator::{Generator, GeneratorError, DEFAULT_MAX_TOKENS};
use crate::prompt::{FeedbackComposer, PromptTemplate, TemplateError};
use crate::report::SessionReport;
use crate::session_log::SessionLog;
use crate::store::{ArtifactStore, SessionId};

/// Loop configuration.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Attempt budget per session
    pub max_attempts: u32,
    /// Completion budget per prompt
    pub max_tokens: u32,
    /// Sentinel around the artifact in generator output
    pub delimiter: char,
    /// Wall-clock budget for one generator call
    pub generation_timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_tokens: DEFAULT_MAX_TOKENS,
            delimiter: DEFAULT_DELIMITER,
            generation_timeout: Duration::from_secs(300),
        }
    }
}

impl LoopConfig {
    /// Quick config for fast iteration.
    pub fn quick() -> Self {
        Self {
            max_attempts: 3,
            generation_timeout: Duration::from_secs(60),
            ..Default::default()
        }
    }

    /// Thorough config for full experiments.
    pub fn thorough() -> Self {
        Self {
            max_attempts: 20,
            max_tokens: 4096,
            ..Default::default()
        }
    }
}

/// Errors that end a session without an outcome.
///
/// Artifact defects never show up here; they are failed attempts.
#[derive(Debug, thiserror::Error)]
pub enum FormaliseError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Drives formalisation sessions for one generator and one solver.
pub struct FormalizationLoop<G, S> {
    generator: G,
    gateway: S,
    store: ArtifactStore,
    template_path: PathBuf,
    extractor: ArtifactExtractor,
    config: LoopConfig,
}

impl<G: Generator, S: SolverGateway> FormalizationLoop<G, S> {
    /// Create a new loop.
    pub fn new(
        generator: G,
        gateway: S,
        store: ArtifactStore,
        template_path: impl Into<PathBuf>,
        config: LoopConfig,
    ) -> Self {
        let extractor = ArtifactExtractor::new(config.delimiter);
        Self {
            generator,
            gateway,
            store,
            template_path: template_path.into(),
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn gateway(&self) -> &S {
        &self.gateway
    }

    /// Run one session with a file log, then tag the log with the outcome.
    ///
    /// The log is opened for this session only and closed before returning,
    /// whether the session concluded or not. A session that ends in error
    /// keeps the `START` tag.
    pub async fn run_session(
        &mut self,
        session: &SessionId,
        game_description: &str,
    ) -> Result<SessionReport, FormaliseError> {
        self.store.ensure_layout().await?;
        let mut log = SessionLog::create(&self.store.log_path(session))?;

        let result = self.formalise(session, game_description, &mut log).await;

        if let Err(e) = log.finish() {
            tracing::warn!(%session, "Failed to flush session log: {e}");
        }

        let outcome = result
            .as_ref()
            .map(|report| report.outcome)
            .unwrap_or(FormalizationOutcome::Start);
        match self.store.tag_log(session, outcome).await {
            Ok(path) => tracing::debug!(%session, log = %path.display(), "Session log tagged"),
            Err(e) => tracing::warn!(%session, "Failed to tag session log: {e}"),
        }

        result
    }

    /// The formalisation session itself.
    pub async fn formalise<W: Write>(
        &mut self,
        session: &SessionId,
        game_description: &str,
        log: &mut SessionLog<W>,
    ) -> Result<SessionReport, FormaliseError> {
        let start = Instant::now();

        // Sessions never share conversation history.
        self.generator.clear_context();

        self.gateway.ensure_ready().await?;
        let template = PromptTemplate::load(&self.template_path).await?;
        let mut prompt = template.render(game_description);
        self.store.write_prompt(session, &prompt).await?;
        log.record_prompt(&prompt);

        tracing::info!(
            %session,
            generator = self.generator.name(),
            solver = self.gateway.name(),
            max_attempts = self.config.max_attempts,
            "Formalisation started"
        );

        let mut outcome = FormalizationOutcome::Start;
        let mut attempts = Vec::new();

        for attempt_index in 0..self.config.max_attempts {
            let response = self.generate(&prompt).await?;
            log.record_response(attempt_index, &response);

            let (artifact, verdict) = match self.extractor.extract(&response) {
                Ok(artifact) => {
                    let path = self
                        .store
                        .write_artifact(session, attempt_index, &artifact)
                        .await?;
                    let query = self.gateway.query_for(&path);
                    let verdict = self.gateway.validate(&query).await;
                    (Some(artifact), verdict)
                }
                Err(e) => {
                    tracing::warn!(%session, attempt = attempt_index, "Extraction failed: {e}");
                    (None, ValidationResult::fail(e.to_string()))
                }
            };
            log.record_trace(&verdict.trace);

            tracing::info!(
                %session,
                attempt = attempt_index,
                status = %verdict.format_status(),
                "Attempt finished"
            );

            let valid = verdict.valid;
            let feedback = (!valid).then(|| FeedbackComposer::compose(&verdict.trace));
            attempts.push(FormalizationAttempt::new(
                attempt_index,
                response.clone(),
                artifact,
                verdict,
            ));

            match feedback {
                None => {
                    outcome = FormalizationOutcome::on_valid(attempt_index);
                    break;
                }
                Some(feedback) => {
                    outcome = FormalizationOutcome::Faulty;
                    self.generator.add_response(&response);
                    log.record_correction(&feedback);
                    prompt = feedback;
                }
            }
        }

        // Only reachable with a zero attempt budget.
        if outcome == FormalizationOutcome::Start {
            outcome = FormalizationOutcome::Faulty;
        }

        let report = SessionReport {
            session: session.clone(),
            outcome,
            attempts,
            duration: start.elapsed(),
        };

        tracing::info!(
            %session,
            outcome = %report.outcome,
            attempts = report.attempts.len(),
            "Formalisation finished"
        );

        Ok(report)
    }

    async fn generate(&mut self, prompt: &str) -> Result<String, GeneratorError> {
        let timeout = self.config.generation_timeout;
        match tokio::time::timeout(timeout, self.generator.prompt(prompt, self.config.max_tokens)).await
        {
            Ok(result) => result,
            Err(_) => Err(GeneratorError::Timeout(timeout)),
        }
    }
}
