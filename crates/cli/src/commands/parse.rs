use std::path::Path;
use std::process;

use toonmap_core::parser::highlight::{highlight, render, SegmentKind};
use toonmap_core::{parse, ParseOutput, Syntax};

use crate::{print_json, report_error, OutputFormat};

pub(crate) fn cmd_parse(
    text: Option<&str>,
    file: Option<&Path>,
    show_highlight: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let input = match (text, file) {
        (Some(t), _) => t.to_string(),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                let msg = format!("error reading file '{}': {}", path.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        },
        (None, None) => {
            report_error("provide TOON text or --file <PATH>", output, quiet);
            process::exit(1);
        }
    };

    let parsed = parse(&input);

    if show_highlight {
        let segments = highlight(&input);
        match output {
            OutputFormat::Json => print_json(
                &serde_json::json!({ "valid": parsed.valid, "segments": segments }),
                output,
                quiet,
            ),
            OutputFormat::Text => {
                println!("{}", render(&segments));
                for segment in &segments {
                    println!("  {:<14} {}", kind_label(segment.kind), segment.text);
                }
            }
        }
    } else {
        match output {
            OutputFormat::Json => print_json(&parsed, output, quiet),
            OutputFormat::Text => print_parse_text(&parsed),
        }
    }

    if !parsed.valid {
        process::exit(1);
    }
}

fn print_parse_text(parsed: &ParseOutput) {
    let syntax = match parsed.syntax {
        Syntax::BracketStream => "bracket stream",
        Syntax::Brace => "brace",
    };
    println!("syntax: {}", syntax);
    println!("valid: {}", parsed.valid);
    for (i, m) in parsed.mappings.iter().enumerate() {
        println!(
            "mapping {}: {} -> {} (eclassId {}, confidence {:.2})",
            i + 1,
            m.source,
            m.target,
            m.eclass_id,
            m.confidence
        );
    }
    for action in &parsed.actions {
        println!("action: {}", action);
    }
    for err in &parsed.errors {
        println!("error [{}]: {}", err.code(), err);
    }
}

fn kind_label(kind: SegmentKind) -> &'static str {
    match kind {
        SegmentKind::Keyword => "keyword",
        SegmentKind::Operator => "operator",
        SegmentKind::StringLiteral => "string",
        SegmentKind::Identifier => "identifier",
        SegmentKind::Error => "error",
        SegmentKind::Bracket => "bracket",
    }
}
