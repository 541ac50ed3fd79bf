use std::process;

use toonmap_core::guardrail;

use crate::{print_json, report_error, OutputFormat};

pub(crate) fn cmd_guard(input: &str, output: OutputFormat, quiet: bool) {
    let verdict = guardrail::classify_text(input);

    match output {
        OutputFormat::Json => print_json(&verdict, output, quiet),
        OutputFormat::Text if verdict.valid => {
            if !quiet {
                println!("accepted: industrial context");
            }
        }
        OutputFormat::Text => {
            let reason = verdict
                .reason
                .map(|r| format!("{} ({})", r, r.code()))
                .unwrap_or_else(|| "unknown".to_string());
            report_error(&format!("rejected: {}", reason), output, quiet);
        }
    }

    if !verdict.valid {
        process::exit(1);
    }
}
