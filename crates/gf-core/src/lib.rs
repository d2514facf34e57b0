//! # gf-core
//!
//! Core types shared by the solver gateway and the formalisation loop.
//!
//! A formalisation *session* turns one natural-language game description
//! into a Prolog program. Every session produces a sequence of
//! [`FormalizationAttempt`]s and ends in exactly one
//! [`FormalizationOutcome`]:
//!
//! ```text
//!          ┌────────────┐  valid on attempt 0   ┌─────────┐
//!          │            │ ────────────────────> │ CORRECT │
//!          │   START    │                       └─────────┘
//!          │            │  valid on attempt k>0 ┌─────────┐
//!          │            │ ────────────────────> │  FIXED  │
//!          └────────────┘                       └─────────┘
//!                │        budget exhausted      ┌─────────┐
//!                └────────────────────────────> │ FAULTY  │
//!                                               └─────────┘
//! ```

pub mod attempt;
pub mod conversation;
pub mod outcome;
pub mod query;

pub use attempt::{FormalizationAttempt, ValidationResult};
pub use conversation::{Conversation, Message, Role};
pub use outcome::{FormalizationOutcome, ParseOutcomeError};
pub use query::SolverQuery;
