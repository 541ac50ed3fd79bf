//! Pipeline orchestrator.
//!
//! One run walks guardrail → generation → parse → resolve. Each run is
//! independent; the pipeline holds nothing but its generator.

use serde::Serialize;

use crate::eclass::{self, Candidate};
use crate::error::{GrammarError, PipelineError};
use crate::generator::{GenerationRequest, Generator, InputType};
use crate::guardrail;
use crate::parser::{self, Mapping};

/// Below this confidence the alternative candidates are attached.
pub const CANDIDATES_THRESHOLD: f64 = 0.7;

/// At or above this confidence the result is a success, otherwise a warning.
pub const SUCCESS_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    AwaitingGeneration,
    Rejected,
    ParseFailed,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Warning,
    /// Output-shape value for failed runs; `Pipeline::run` reports those as `Err`.
    Error,
}

impl Status {
    pub fn for_confidence(confidence: f64) -> Status {
        if confidence >= SUCCESS_THRESHOLD {
            Status::Success
        } else {
            Status::Warning
        }
    }
}

/// One entry of the run trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub step: usize,
    pub action: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub status: Status,
    pub input_type: InputType,
    pub input_data: String,
    /// The first parsed mapping with resolver values applied.
    pub mapping: Mapping,
    pub confidence: f64,
    pub unit: String,
    pub fallback_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Candidate>>,
    pub actions: Vec<String>,
    /// False when the generator output carried grammar diagnostics, even
    /// though a mapping was still recovered.
    pub parse_valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GrammarError>,
    pub steps: Vec<Step>,
    pub raw_generation_text: String,
}

#[derive(Debug, Default)]
struct Trace(Vec<Step>);

impl Trace {
    fn push(&mut self, action: &str, detail: String) {
        let step = self.0.len() + 1;
        self.0.push(Step {
            step,
            action: action.to_string(),
            detail,
        });
    }
}

pub struct Pipeline<G> {
    generator: G,
}

impl<G: Generator> Pipeline<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Run one request through every stage.
    ///
    /// Returns the terminal error for rejected input, a failed generation
    /// call, or generator output without any usable mapping. A low final
    /// confidence is not an error; it yields [`Status::Warning`].
    pub async fn run(&self, request: &GenerationRequest) -> Result<PipelineResult, PipelineError> {
        let input = request.input_data.trim();
        let mut trace = Trace::default();

        let verdict = guardrail::classify_text(input);
        if let Some(reason) = verdict.reason.filter(|_| !verdict.valid) {
            tracing::warn!(input, reason = reason.code(), "input rejected by guardrail");
            return Err(PipelineError::Rejected { reason });
        }
        trace.push("guardrail", "industrial context confirmed".to_string());
        tracing::debug!(state = ?PipelineState::AwaitingGeneration, input, "guardrail passed");

        let request = GenerationRequest::new(input, request.input_type);
        let raw = match self.generator.generate(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(input, class = e.code(), error = %e, "generation failed");
                return Err(e.into());
            }
        };
        trace.push("generation", format!("received {} characters", raw.chars().count()));

        let parsed = parser::parse(&raw);
        let Some(first) = parsed.first_mapping().cloned() else {
            tracing::debug!(state = ?PipelineState::ParseFailed, errors = parsed.errors.len(), "no mapping parsed");
            return Err(PipelineError::NoMapping {
                raw,
                errors: parsed.errors,
            });
        };
        trace.push(
            "parse",
            format!(
                "SRC='{}' -> TGT='{}' (conf: {:.0}%)",
                first.source,
                first.target,
                first.confidence * 100.0
            ),
        );
        if !parsed.errors.is_empty() {
            let codes: Vec<&str> = parsed.errors.iter().map(GrammarError::code).collect();
            tracing::warn!(errors = ?codes, "mapping recovered from answer with grammar errors");
            trace.push("diagnostics", codes.join(", "));
        }

        let candidates = (first.confidence < CANDIDATES_THRESHOLD).then(|| eclass::candidates(&first.source));
        if let Some(list) = &candidates {
            trace.push("candidates", format!("{} alternatives for review", list.len()));
        }

        let resolved = eclass::apply_fallback(&first.source, &first.eclass_id, &first.target, first.confidence);
        if resolved.applied {
            trace.push(
                "fallback",
                format!("heuristic ECLASS {} ({})", resolved.eclass_id, resolved.target),
            );
        }

        let status = Status::for_confidence(resolved.confidence);
        tracing::debug!(
            state = ?PipelineState::Resolved,
            eclass_id = %resolved.eclass_id,
            confidence = resolved.confidence,
            ?status,
            "pipeline resolved"
        );

        Ok(PipelineResult {
            status,
            input_type: request.input_type,
            input_data: request.input_data,
            mapping: Mapping {
                source: first.source,
                target: resolved.target,
                eclass_id: resolved.eclass_id,
                confidence: resolved.confidence,
                action: first.action,
            },
            confidence: resolved.confidence,
            unit: resolved.unit,
            fallback_applied: resolved.applied,
            candidates,
            actions: parsed.actions,
            parse_valid: parsed.valid,
            errors: parsed.errors,
            steps: trace.0,
            raw_generation_text: raw,
        })
    }
}
