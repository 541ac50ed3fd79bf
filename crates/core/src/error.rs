use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::guardrail::RejectReason;
use crate::pipeline::PipelineState;

/// A grammar diagnostic produced by either notation parser.
///
/// Diagnostics are collected, not thrown: a single parse may report several
/// of them (one per malformed field) and still return usable mappings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GrammarError {
    #[error("empty TOON string")]
    EmptyInput,

    #[error("no tokens found")]
    NoTokens,

    #[error("incomplete map block: SRC and TGT both required")]
    IncompleteMap,

    #[error("must start with MAP{{")]
    MissingMapOpen,

    #[error("must end with }}")]
    MissingMapClose,

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// A positional field did not match `KEY='value'`.
    #[error("invalid {field} field: '{found}', expected {field}='<value>'")]
    InvalidField { field: &'static str, found: String },

    #[error("{field} value must not be empty")]
    EmptyField { field: &'static str },

    #[error("unknown ACTION '{action}', allowed: {allowed}")]
    UnknownAction { action: String, allowed: String },
}

impl GrammarError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            GrammarError::EmptyInput => "empty_input",
            GrammarError::NoTokens => "no_tokens",
            GrammarError::IncompleteMap => "incomplete_map",
            GrammarError::MissingMapOpen => "missing_map_open",
            GrammarError::MissingMapClose => "missing_map_close",
            GrammarError::FieldCount { .. } => "field_count",
            GrammarError::InvalidField { .. } => "invalid_field",
            GrammarError::EmptyField { .. } => "empty_field",
            GrammarError::UnknownAction { .. } => "unknown_action",
        }
    }
}

impl Serialize for GrammarError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("GrammarError", 2)?;
        s.serialize_field("code", self.code())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

/// Failure reported by the external generation collaborator.
///
/// The class only affects user-facing messaging; the pipeline treats every
/// class as terminal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation quota exhausted: {0}")]
    Quota(String),

    #[error("generation service unreachable: {0}")]
    Network(String),

    #[error("generation failed: {0}")]
    Other(String),
}

impl GenerationError {
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Quota(_) => "quota",
            GenerationError::Network(_) => "network",
            GenerationError::Other(_) => "other",
        }
    }

    /// Short message suitable for an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::Quota(_) => {
                "the generation service quota or rate limit was reached; try again later"
            }
            GenerationError::Network(_) => {
                "the generation service could not be reached; check connectivity"
            }
            GenerationError::Other(_) => "the generation service returned an error",
        }
    }
}

/// Terminal failure of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("input rejected by guardrail: {reason}")]
    Rejected { reason: RejectReason },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Parsing produced zero usable mappings. `raw` is the generator text.
    #[error("no valid mapping returned")]
    NoMapping {
        raw: String,
        errors: Vec<GrammarError>,
    },
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Rejected { .. } => "guardrail_rejected",
            PipelineError::Generation(_) => "generation_failed",
            PipelineError::NoMapping { .. } => "no_mapping",
        }
    }

    /// Terminal state the pipeline stopped in.
    pub fn state(&self) -> PipelineState {
        match self {
            PipelineError::Rejected { .. } => PipelineState::Rejected,
            PipelineError::Generation(_) => PipelineState::AwaitingGeneration,
            PipelineError::NoMapping { .. } => PipelineState::ParseFailed,
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            PipelineError::Rejected { reason } => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
                "reason": reason.code(),
            }),
            PipelineError::Generation(e) => serde_json::json!({
                "error": e.user_message(),
                "code": self.code(),
                "class": e.code(),
                "detail": e.to_string(),
            }),
            PipelineError::NoMapping { raw, errors } => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
                "raw": raw,
                "errors": errors,
            }),
        }
    }
}
