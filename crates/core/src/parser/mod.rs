//! TOON notation parser.
//!
//! Two independent surface syntaxes share one entry point, [`parse`]:
//!
//! - the bracket stream `⟨MAP_START⟩⟨SRC:..⟩⟨TGT:..⟩⟨CONF:..⟩⟨MAP_END⟩`
//!   (ASCII `<..>` accepted), handled by [`stream`];
//! - the brace form `MAP{SRC='..'|TGT='..'|ACTION='..'}`, handled by
//!   [`brace`].
//!
//! The syntax is picked by sniffing for a bracket character. Both parsers
//! report diagnostics as data; neither fails fast.

pub mod brace;
pub mod highlight;
pub mod stream;

use serde::Serialize;

use crate::eclass::{GENERIC_ECLASS_ID, UNKNOWN_TARGET};
use crate::error::GrammarError;
use crate::lexer;

/// Confidence assigned when the notation carries none (or an unparsable one).
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const ECLASS_PREFIX: &str = "ECLASS:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Syntax {
    BracketStream,
    Brace,
}

impl Syntax {
    pub fn detect(text: &str) -> Syntax {
        if lexer::is_bracket_stream(text) {
            Syntax::BracketStream
        } else {
            Syntax::Brace
        }
    }
}

/// One resolved source → classification pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub source: String,
    pub target: String,
    pub eclass_id: String,
    pub confidence: f64,
    pub action: Option<String>,
}

impl Mapping {
    /// Build a mapping, or `None` when source or target is empty.
    pub fn new(
        source: &str,
        target: &str,
        confidence: f64,
        action: Option<String>,
    ) -> Option<Mapping> {
        if source.is_empty() || target.is_empty() {
            return None;
        }
        Some(Mapping {
            source: source.to_string(),
            target: target.to_string(),
            eclass_id: normalize_eclass_id(target),
            confidence,
            action,
        })
    }
}

/// Strip an `ECLASS:` prefix; the `UNKNOWN` literal becomes the generic code.
pub fn normalize_eclass_id(target: &str) -> String {
    let id = target.strip_prefix(ECLASS_PREFIX).unwrap_or(target);
    if id == UNKNOWN_TARGET {
        GENERIC_ECLASS_ID.to_string()
    } else {
        id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutput {
    pub syntax: Syntax,
    /// In first-seen order.
    pub mappings: Vec<Mapping>,
    pub actions: Vec<String>,
    pub raw: String,
    pub valid: bool,
    pub errors: Vec<GrammarError>,
}

impl ParseOutput {
    pub(crate) fn invalid(syntax: Syntax, raw: &str, errors: Vec<GrammarError>) -> Self {
        ParseOutput {
            syntax,
            mappings: Vec::new(),
            actions: Vec::new(),
            raw: raw.to_string(),
            valid: false,
            errors,
        }
    }

    pub fn first_mapping(&self) -> Option<&Mapping> {
        self.mappings.first()
    }
}

/// Parse generator output in either syntax.
///
/// Markdown code fences are removed before the syntax is detected. `raw`
/// always holds the untouched input.
pub fn parse(input: &str) -> ParseOutput {
    let body = lexer::strip_code_fences(input);
    let syntax = Syntax::detect(&body);
    if body.is_empty() {
        return ParseOutput::invalid(syntax, input, vec![GrammarError::EmptyInput]);
    }

    tracing::debug!(?syntax, "parsing TOON notation");
    match syntax {
        Syntax::BracketStream => stream::parse_stream(input, &body),
        Syntax::Brace => brace::parse_brace(input, &body),
    }
}
