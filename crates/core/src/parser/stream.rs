//! Bracket-stream parser: groups lexed tokens into mappings with a two-state
//! machine.

use std::sync::LazyLock;

use regex::Regex;

use super::{Mapping, ParseOutput, Syntax, DEFAULT_CONFIDENCE};
use crate::error::GrammarError;
use crate::lexer::{self, Token};

const MAP_START: &str = "MAP_START";
const MAP_END: &str = "MAP_END";
const SRC: &str = "SRC";
const TGT: &str = "TGT";
const CONF: &str = "CONF";
const ACTION: &str = "ACTION";

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid regex literal")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapState {
    OutsideMap,
    InsideMap,
}

/// Fields collected between `MAP_START` and `MAP_END`.
#[derive(Debug, Default)]
struct Accumulator {
    source: Option<String>,
    target: Option<String>,
    confidence: Option<f64>,
}

impl Accumulator {
    /// Consume the accumulator, yielding a mapping only if both source and
    /// target are present and non-empty.
    fn finish(self) -> Option<Mapping> {
        Mapping::new(
            self.source.as_deref()?,
            self.target.as_deref()?,
            self.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            None,
        )
    }
}

pub(crate) fn parse_stream(raw: &str, body: &str) -> ParseOutput {
    let tokens = lexer::lex(body);
    if tokens.is_empty() {
        return ParseOutput::invalid(Syntax::BracketStream, raw, vec![GrammarError::NoTokens]);
    }

    let mut mappings = Vec::new();
    let mut actions = Vec::new();
    let mut state = MapState::OutsideMap;
    let mut acc = Accumulator::default();

    for token in &tokens {
        match (token.key.as_str(), state) {
            (MAP_START, _) => {
                state = MapState::InsideMap;
                acc = Accumulator::default();
            }
            (MAP_END, _) => {
                let finished = std::mem::take(&mut acc);
                if state == MapState::InsideMap {
                    mappings.extend(finished.finish());
                }
                state = MapState::OutsideMap;
            }
            (SRC, MapState::InsideMap) => acc.source = Some(token.value_str().to_string()),
            (TGT, MapState::InsideMap) => acc.target = Some(token.value_str().to_string()),
            (CONF, MapState::InsideMap) => acc.confidence = Some(parse_confidence(token.value_str())),
            (ACTION, _) => actions.push(token.value_str().to_string()),
            _ => {}
        }
    }

    // The generator may omit the final MAP_END.
    if state == MapState::InsideMap {
        mappings.extend(acc.finish());
    }

    if mappings.is_empty() {
        mappings.extend(loose_mapping(&tokens));
    }

    let mut errors = Vec::new();
    if mappings.is_empty() && tokens.iter().any(|t| t.key == MAP_START) {
        errors.push(GrammarError::IncompleteMap);
    }

    let valid = !mappings.is_empty() || !actions.is_empty();
    ParseOutput {
        syntax: Syntax::BracketStream,
        mappings,
        actions,
        raw: raw.to_string(),
        valid,
        errors,
    }
}

/// Build one mapping from the first `SRC`, `TGT` and `CONF` tokens anywhere
/// in the stream, for generators that drop the `MAP_START`/`MAP_END` wrapper.
fn loose_mapping(tokens: &[Token]) -> Option<Mapping> {
    let first = |key: &str| tokens.iter().find(|t| t.key == key).map(Token::value_str);
    let confidence = match first(CONF) {
        Some(v) if !v.is_empty() => parse_confidence(v),
        _ => DEFAULT_CONFIDENCE,
    };
    Mapping::new(first(SRC)?, first(TGT)?, confidence, None)
}

/// Parse a confidence value, clamped to `[0, 1]`.
///
/// A leading number is accepted even with trailing text (`0.9 high`);
/// anything without one, including `inf` and `NaN`, yields
/// [`DEFAULT_CONFIDENCE`].
pub fn parse_confidence(value: &str) -> f64 {
    let value = value.trim();
    let parsed = value.parse::<f64>().ok().or_else(|| {
        LEADING_NUMBER
            .find(value)
            .and_then(|m| m.as_str().parse::<f64>().ok())
    });
    match parsed {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}
