//! toonmap-core: semantic mapping of industrial tags to ECLASS properties.
//!
//! A raw PLC tag or endpoint flows through four stages:
//!
//! 1. [`guardrail`] -- reject unsafe or non-industrial input
//! 2. [`generator`] -- ask an external model for a TOON-notation answer
//! 3. [`parser`] -- validate the notation and extract mappings
//! 4. [`eclass`] -- replace low-information answers with a heuristic code
//!
//! [`Pipeline`] runs them in order. [`export`] renders a resolved mapping as
//! an asset administration shell or a Node-RED flow.
//!
//! # Public API
//!
//! - [`Pipeline`], [`PipelineResult`], [`PipelineError`] -- orchestration
//! - [`parse()`], [`ParseOutput`], [`Mapping`] -- notation parsing
//! - [`classify()`], [`GuardrailInput`] -- input screening
//! - [`fallback()`], [`candidates()`], [`apply_fallback()`] -- resolver
//! - [`Generator`], [`MockGenerator`] -- generation seam

pub mod eclass;
pub mod error;
pub mod export;
pub mod generator;
pub mod guardrail;
pub mod lexer;
pub mod parser;
pub mod pipeline;

// ── Convenience re-exports: key types ────────────────────────────────

pub use eclass::{Candidate, FallbackResult, GENERIC_ECLASS_ID};
pub use error::{GenerationError, GrammarError, PipelineError};
pub use generator::{GenerationRequest, Generator, InputType, MockGenerator};
pub use guardrail::{GuardrailInput, GuardrailVerdict, RejectReason};
pub use parser::{Mapping, ParseOutput, Syntax};
pub use pipeline::{Pipeline, PipelineResult, PipelineState, Status, Step};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use eclass::{apply_fallback, candidates, fallback};
pub use guardrail::{classify, classify_text};
pub use parser::highlight::{highlight, render};
pub use parser::parse;
