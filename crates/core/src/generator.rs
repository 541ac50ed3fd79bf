//! Generation collaborator seam.
//!
//! The pipeline talks to the external model through the [`Generator`] trait.
//! Concrete HTTP clients live outside this crate; [`MockGenerator`] is a
//! deterministic stand-in for offline use and tests.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::lexer::{CLOSE, OPEN};

/// Instruction sent alongside every request.
pub const SYSTEM_INSTRUCTION: &str = "You are an industrial semantic mapping agent. \
Map the requested tag or endpoint to an ECLASS property. \
Answer ONLY in TOON notation:\n\
\u{27E8}MAP_START\u{27E9}\u{27E8}SRC:<tag>\u{27E9}\u{27E8}TGT:ECLASS:<irdi>\u{27E9}\u{27E8}CONF:<0.0-1.0>\u{27E9}\u{27E8}MAP_END\u{27E9}\n\
If an integration flow is needed, append \u{27E8}ACTION:GENERATE_NODE_RED\u{27E9}.\n\
If the property is unknown, use TGT:UNKNOWN with a low CONF. Never explain or converse.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Legacy PLC tag (S7, Modbus, ...).
    #[default]
    Brownfield,
    /// REST or AAS endpoint of a cyber-physical system.
    Greenfield,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Brownfield => "brownfield",
            InputType::Greenfield => "greenfield",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub input_data: String,
    #[serde(default)]
    pub input_type: InputType,
}

impl GenerationRequest {
    pub fn new(input_data: impl Into<String>, input_type: InputType) -> Self {
        Self {
            input_data: input_data.into(),
            input_type,
        }
    }

    /// Compact request notation sent as the user message.
    pub fn to_toon(&self) -> String {
        format!(
            "{o}REQ{c}{o}TAG:{}{c}{o}TYPE:{}{c}{o}REQ_END{c}",
            self.input_data.trim(),
            self.input_type,
            o = OPEN,
            c = CLOSE,
        )
    }
}

/// External model that turns a request into raw TOON text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Box<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        (**self).generate(request).await
    }
}

// ── Mock generator ───────────────────────────────────────────────────────────

/// Known tags: (tag, ECLASS code, confidence).
const KNOWN_TAGS: &[(&str, &str, f64)] = &[
    ("DB10.W2", "0173-1#02-BAA123", 0.92),
    ("DB1.DBX0.1", "0173-1#02-BAF321#004", 0.95),
    ("/temp/v1", "0173-1#02-AAB713#005", 0.88),
    ("Mtr_Tmp_01", "0173-1#02-AAB713#005", 0.90),
];

const MOCK_DEFAULT: (&str, f64) = ("0173-1#02-AAA000", 0.72);

/// Deterministic generator answering from a fixed table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn respond(input: &str) -> String {
        let tag = input.trim();
        let (eclass_id, confidence) = KNOWN_TAGS
            .iter()
            .find(|(known, _, _)| *known == tag)
            .map(|&(_, id, conf)| (id, conf))
            .unwrap_or(MOCK_DEFAULT);
        format!(
            "{o}MAP_START{c}{o}SRC:{tag}{c}{o}TGT:ECLASS:{eclass_id}{c}{o}CONF:{confidence}{c}{o}MAP_END{c}\
             {o}ACTION:GENERATE_NODE_RED{c}",
            o = OPEN,
            c = CLOSE,
        )
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        Ok(Self::respond(&request.input_data))
    }
}
