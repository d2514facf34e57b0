//! # gf-formaliser
//!
//! Self-correcting translation of natural-language game descriptions into
//! Prolog, with a solver in the loop.
//!
//! # Usage
//!
//! ```bash
//! # Run every game in the configured directory
//! OPENAI_API_KEY=sk-... cargo run -p gf-formaliser --bin gf-experiment -- --config CONFIG/params.toml
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Game     │ ──> │   Prompt    │ ──> │  Generator  │
//! │ description │     │  Template   │     │    (LLM)    │
//! └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                │
//!                     ┌──────────────────────────┘
//!                     ▼
//!              ┌─────────────┐  no @...@  ┌─────────────┐
//!              │  Artifact   │ ─────────> │   failed    │
//!              │  Extractor  │            │   attempt   │
//!              └──────┬──────┘            └──────┬──────┘
//!                     ▼                          │
//!              ┌─────────────┐  invalid          │
//!              │   Solver    │ ──────────────────┤
//!              │   Gateway   │                   ▼
//!              └──────┬──────┘            ┌─────────────┐
//!                     │ valid             │  Feedback   │
//!                     ▼                   │  Composer   │ ──> next attempt
//!              CORRECT / FIXED            └─────────────┘
//! ```

pub mod client;
pub mod config;
pub mod extract;
pub mod formaliser;
pub mod generator;
pub mod prompt;
pub mod report;
pub mod session_log;
pub mod store;

pub use client::{OpenAiClient, OpenAiConfig};
pub use config::{ConfigError, ExperimentConfig};
pub use extract::{extract_artifact, ArtifactExtractor, ExtractionError};
pub use formaliser::{FormaliseError, FormalizationLoop, LoopConfig};
pub use generator::{Generator, GeneratorError};
pub use prompt::{FeedbackComposer, PromptTemplate};
pub use report::{BatchSummary, SessionReport};
pub use session_log::{parse_log, LogEntry, SessionLog};
pub use store::{ArtifactStore, SessionId};
