//! # gf-solver
//!
//! Validation of candidate Prolog programs against a fixed base program.
//!
//! A gateway answers one question per call: does the artifact load cleanly
//! on top of the base definitions? Two signals make it invalid:
//!
//! | Signal | Example | Trace |
//! |--------|---------|-------|
//! | raised | `existence_error(source_sink, ...)` | the exception term |
//! | logged | `Warning: Clauses of foo/1 are not together` | captured diagnostic lines |
//!
//! Every call runs in a fresh solver process, so definitions loaded while
//! checking one artifact never influence the next check.

pub mod capture;
pub mod gateway;
pub mod swipl;

pub use capture::{DiagnosticCapture, Severity};
pub use gateway::{GatewayConfig, SolverError, SolverGateway};
pub use swipl::SwiplGateway;
