//! Brace-form parser: `MAP{SRC='..'|TGT='..'|ACTION='..'}`.
//!
//! Fields are positional. Each malformed field yields its own diagnostic and
//! the remaining fields are still checked.

use std::sync::LazyLock;

use regex::Regex;

use super::{Mapping, ParseOutput, Syntax, DEFAULT_CONFIDENCE};
use crate::error::GrammarError;

pub const MAP_OPEN: &str = "MAP{";
pub const MAP_CLOSE: &str = "}";
pub const FIELD_SEPARATOR: char = '|';
const FIELD_COUNT: usize = 3;

/// Base action names accepted in the `ACTION` field. An argument in
/// parentheses (`Convert_Unit(F_to_C)`) is allowed after the base name.
pub const VALID_ACTIONS: [&str; 3] = ["DirectMap", "Convert_Unit", "Aggregate"];

static SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SRC='([^']*)'$").expect("valid regex literal"));
static TGT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TGT='([^']*)'$").expect("valid regex literal"));
static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ACTION='([^']*)'$").expect("valid regex literal"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Src,
    Tgt,
    Action,
}

impl FieldKind {
    /// Expected kind at each position.
    const ORDER: [FieldKind; FIELD_COUNT] = [FieldKind::Src, FieldKind::Tgt, FieldKind::Action];

    pub fn key(self) -> &'static str {
        match self {
            FieldKind::Src => "SRC",
            FieldKind::Tgt => "TGT",
            FieldKind::Action => "ACTION",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            FieldKind::Src => &SRC_RE,
            FieldKind::Tgt => &TGT_RE,
            FieldKind::Action => &ACTION_RE,
        }
    }
}

/// One positional field after matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub kind: FieldKind,
    /// The quoted value when the field matched, otherwise the raw part.
    pub value: String,
    pub error: Option<GrammarError>,
}

impl Field {
    fn check(kind: FieldKind, part: &str) -> Field {
        let Some(caps) = kind.pattern().captures(part) else {
            return Field {
                kind,
                value: part.to_string(),
                error: Some(GrammarError::InvalidField {
                    field: kind.key(),
                    found: part.to_string(),
                }),
            };
        };

        let value = caps[1].to_string();
        let error = match kind {
            FieldKind::Src | FieldKind::Tgt if value.is_empty() => {
                Some(GrammarError::EmptyField { field: kind.key() })
            }
            FieldKind::Action => {
                let base = base_action(&value);
                (!VALID_ACTIONS.contains(&base)).then(|| GrammarError::UnknownAction {
                    action: base.to_string(),
                    allowed: VALID_ACTIONS.join(", "),
                })
            }
            _ => None,
        };
        Field { kind, value, error }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// The action name without its parenthesized argument.
pub fn base_action(action: &str) -> &str {
    action.split('(').next().unwrap_or(action)
}

/// Check the `MAP{ .. }` frame and split it into positional fields.
///
/// Structural failures (missing frame, wrong field count) are returned as
/// `Err`; per-field problems are carried on each [`Field`].
pub(crate) fn parse_fields(body: &str) -> Result<Vec<Field>, Vec<GrammarError>> {
    let body = body.trim();
    let mut errors = Vec::new();
    if !body.starts_with(MAP_OPEN) {
        errors.push(GrammarError::MissingMapOpen);
    }
    if !body.ends_with(MAP_CLOSE) {
        errors.push(GrammarError::MissingMapClose);
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let inner = &body[MAP_OPEN.len()..body.len() - MAP_CLOSE.len()];
    let parts = split_unescaped(inner);
    if parts.len() != FIELD_COUNT {
        return Err(vec![GrammarError::FieldCount {
            expected: FIELD_COUNT,
            found: parts.len(),
        }]);
    }

    Ok(FieldKind::ORDER
        .iter()
        .zip(&parts)
        .map(|(&kind, part)| Field::check(kind, part))
        .collect())
}

/// Split on `|` not preceded by a backslash; `\|` becomes a literal `|`.
/// Parts are trimmed.
fn split_unescaped(inner: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&FIELD_SEPARATOR) => {
                current.push(FIELD_SEPARATOR);
                chars.next();
            }
            FIELD_SEPARATOR => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts.iter().map(|p| p.trim().to_string()).collect()
}

pub(crate) fn parse_brace(raw: &str, body: &str) -> ParseOutput {
    let fields = match parse_fields(body) {
        Ok(fields) => fields,
        Err(errors) => return ParseOutput::invalid(Syntax::Brace, raw, errors),
    };

    let errors: Vec<GrammarError> = fields.iter().filter_map(|f| f.error.clone()).collect();
    let valid_value = |kind: FieldKind| {
        fields
            .iter()
            .find(|f| f.kind == kind && f.is_valid())
            .map(|f| f.value.as_str())
    };

    let action = valid_value(FieldKind::Action).map(str::to_string);
    let mapping = match (valid_value(FieldKind::Src), valid_value(FieldKind::Tgt)) {
        (Some(source), Some(target)) => {
            Mapping::new(source, target, DEFAULT_CONFIDENCE, action.clone())
        }
        _ => None,
    };

    ParseOutput {
        syntax: Syntax::Brace,
        mappings: mapping.into_iter().collect(),
        actions: action.into_iter().collect(),
        raw: raw.to_string(),
        valid: errors.is_empty(),
        errors,
    }
}
