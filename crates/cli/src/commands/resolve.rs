use std::process;

use toonmap_core::eclass;

use crate::{print_json, report_error, OutputFormat};

pub(crate) fn cmd_resolve(tag: &str, output: OutputFormat, quiet: bool) {
    let tag = tag.trim();
    if tag.is_empty() {
        report_error("tag must not be empty", output, quiet);
        process::exit(1);
    }

    let result = eclass::fallback(tag);
    let candidates = eclass::candidates(tag);

    match output {
        OutputFormat::Json => print_json(
            &serde_json::json!({
                "tag": tag,
                "fallback": result,
                "candidates": candidates,
            }),
            output,
            quiet,
        ),
        OutputFormat::Text => {
            println!(
                "{} -> {} {} [{}] (confidence {:.2})",
                tag, result.eclass_id, result.target, result.unit, result.confidence
            );
            if !quiet {
                println!("candidates:");
                for c in &candidates {
                    println!("  {} {} [{}]", c.eclass_id, c.target, c.unit);
                }
            }
        }
    }
}
