//! Display form of TOON notation as categorized text segments.
//!
//! Rendering is layered on the parsers: brace input is re-rendered from its
//! positional fields, bracket streams from the parsed mappings. Concatenating
//! the segments ([`render`]) yields notation that parses back to the same
//! mappings.

use serde::Serialize;

use super::brace::{self, Field, FieldKind, FIELD_SEPARATOR};
use super::{parse, Syntax};
use crate::lexer::{self, CLOSE, OPEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Keyword,
    Operator,
    StringLiteral,
    Identifier,
    Error,
    Bracket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub kind: SegmentKind,
}

impl Segment {
    fn new(text: impl Into<String>, kind: SegmentKind) -> Self {
        Segment {
            text: text.into(),
            kind,
        }
    }
}

/// Segment the input for display. Input that cannot be structured is
/// returned as a single [`SegmentKind::Error`] segment.
pub fn highlight(input: &str) -> Vec<Segment> {
    let body = lexer::strip_code_fences(input);
    let segments = match Syntax::detect(&body) {
        Syntax::Brace => brace::parse_fields(&body).ok().map(|f| brace_segments(&f)),
        Syntax::BracketStream => stream_segments(input),
    };
    segments.unwrap_or_else(|| vec![Segment::new(input, SegmentKind::Error)])
}

/// Concatenate segment text.
pub fn render(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}

fn brace_segments(fields: &[Field]) -> Vec<Segment> {
    let mut out = vec![
        Segment::new("MAP", SegmentKind::Keyword),
        Segment::new("{", SegmentKind::Bracket),
    ];
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(Segment::new(
                format!(" {} ", FIELD_SEPARATOR),
                SegmentKind::Operator,
            ));
        }
        let kind = match (field.is_valid(), field.kind) {
            (false, _) => SegmentKind::Error,
            (true, FieldKind::Tgt) => SegmentKind::Identifier,
            (true, _) => SegmentKind::StringLiteral,
        };
        let escaped = field.value.replace(FIELD_SEPARATOR, "\\|");
        out.push(Segment::new(field.kind.key(), SegmentKind::Keyword));
        out.push(Segment::new("=", SegmentKind::Operator));
        out.push(Segment::new(format!("'{}'", escaped), kind));
    }
    out.push(Segment::new("}", SegmentKind::Bracket));
    out
}

fn stream_segments(input: &str) -> Option<Vec<Segment>> {
    let parsed = parse(input);
    if parsed.mappings.is_empty() && parsed.actions.is_empty() {
        return None;
    }

    let open = |key: &str| Segment::new(format!("{}{}:", OPEN, key), SegmentKind::Keyword);
    let marker = |key: &str| Segment::new(format!("{}{}{}", OPEN, key, CLOSE), SegmentKind::Keyword);
    let close = || Segment::new(CLOSE.to_string(), SegmentKind::Bracket);

    let mut out = Vec::new();
    for m in &parsed.mappings {
        out.push(marker("MAP_START"));
        out.push(open("SRC"));
        out.push(Segment::new(&m.source, SegmentKind::StringLiteral));
        out.push(close());
        out.push(open("TGT"));
        out.push(Segment::new(&m.target, SegmentKind::Identifier));
        out.push(close());
        out.push(open("CONF"));
        out.push(Segment::new(m.confidence.to_string(), SegmentKind::StringLiteral));
        out.push(close());
        out.push(marker("MAP_END"));
    }
    for action in &parsed.actions {
        out.push(open("ACTION"));
        out.push(Segment::new(action, SegmentKind::StringLiteral));
        out.push(close());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(segments: &[Segment]) -> Vec<SegmentKind> {
        segments.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_brace_segments() {
        let segments = highlight("MAP{SRC='a'|TGT='b'|ACTION='DirectMap'}");
        assert_eq!(render(&segments), "MAP{SRC='a' | TGT='b' | ACTION='DirectMap'}");
        assert_eq!(segments[0].kind, SegmentKind::Keyword);
        assert_eq!(segments[1].kind, SegmentKind::Bracket);
        assert_eq!(segments[4].text, "'a'");
        assert_eq!(segments[4].kind, SegmentKind::StringLiteral);
        assert_eq!(segments[8].kind, SegmentKind::Identifier);
        assert!(!kinds(&segments).contains(&SegmentKind::Error));
    }

    #[test]
    fn test_brace_invalid_field_is_error_segment() {
        let segments = highlight("MAP{SRC='a'|TGT='b'|ACTION='Teleport'}");
        let last_value = &segments[segments.len() - 2];
        assert_eq!(last_value.text, "'Teleport'");
        assert_eq!(last_value.kind, SegmentKind::Error);
    }

    #[test]
    fn test_structural_failure_is_single_error_segment() {
        let input = "MAP{SRC='x'|TGT='y'}";
        assert_eq!(
            highlight(input),
            vec![Segment::new(input, SegmentKind::Error)]
        );
        assert_eq!(highlight("⟨garbage").len(), 1);
    }

    #[test]
    fn test_brace_rendering_parses_back() {
        for input in [
            "MAP{SRC='DB10.W2'|TGT='ECLASS:0173-1#02-BAA123'|ACTION='DirectMap'}",
            r"MAP{SRC='a\|b'|TGT='UNKNOWN'|ACTION='Convert_Unit(F_to_C)'}",
        ] {
            let original = parse(input);
            let reparsed = parse(&render(&highlight(input)));
            assert!(reparsed.valid);
            assert_eq!(original.mappings, reparsed.mappings);
        }
    }

    #[test]
    fn test_stream_rendering_parses_back() {
        for input in [
            "⟨MAP_START⟩⟨SRC:DB10.W2⟩⟨TGT:ECLASS:0173-1#02-BAA123⟩⟨CONF:0.92⟩⟨MAP_END⟩⟨ACTION:GENERATE_NODE_RED⟩",
            "<SRC:Mtr_Tmp_01><TGT:UNKNOWN>",
            "⟨MAP_START⟩⟨SRC:a⟩⟨TGT:b⟩⟨CONF:9⟩⟨MAP_END⟩⟨MAP_START⟩⟨SRC:c⟩⟨TGT:d⟩⟨MAP_END⟩",
        ] {
            let original = parse(input);
            let rendered = render(&highlight(input));
            let reparsed = parse(&rendered);
            assert_eq!(original.mappings, reparsed.mappings, "{rendered}");
            assert_eq!(original.actions, reparsed.actions);
        }
    }

    #[test]
    fn test_stream_segment_kinds() {
        let segments = highlight("⟨SRC:a⟩⟨TGT:b⟩⟨CONF:0.4⟩");
        assert_eq!(render(&segments), "⟨MAP_START⟩⟨SRC:a⟩⟨TGT:b⟩⟨CONF:0.4⟩⟨MAP_END⟩");
        assert_eq!(segments[2].kind, SegmentKind::StringLiteral);
        assert_eq!(segments[5].kind, SegmentKind::Identifier);
        assert_eq!(segments[3].kind, SegmentKind::Bracket);
    }
}
