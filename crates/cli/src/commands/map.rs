use std::process;

use toonmap_core::export;
use toonmap_core::{
    GenerationRequest, Generator, InputType, MockGenerator, Pipeline, PipelineError,
    PipelineResult, Status,
};

use crate::gemini::{GeminiGenerator, GeneratorConfig, API_KEY_ENV};
use crate::{print_json, report_error, ExportFormat, OutputFormat};

/// Pick the generator: Gemini when an API key is configured and `--mock` is
/// not given, the offline mock otherwise.
fn select_generator(mock: bool, model: Option<&str>, quiet: bool) -> Box<dyn Generator> {
    if mock {
        return Box::new(MockGenerator);
    }
    match GeneratorConfig::from_env() {
        Some(mut config) => {
            if let Some(m) = model {
                config.model = m.to_string();
            }
            tracing::debug!(model = %config.model, "using Gemini generator");
            Box::new(GeminiGenerator::new(config))
        }
        None => {
            if !quiet {
                eprintln!(
                    "No {} set. Using the offline mock generator. Set {} for model-backed mapping.",
                    API_KEY_ENV, API_KEY_ENV
                );
            }
            Box::new(MockGenerator)
        }
    }
}

pub(crate) fn cmd_map(
    input: &str,
    input_type: InputType,
    mock: bool,
    model: Option<&str>,
    export_format: Option<ExportFormat>,
    output: OutputFormat,
    quiet: bool,
) {
    let pipeline = Pipeline::new(select_generator(mock, model, quiet));
    let request = GenerationRequest::new(input, input_type);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to create tokio runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let result = match rt.block_on(pipeline.run(&request)) {
        Ok(result) => result,
        Err(e) => {
            report_pipeline_error(&e, output, quiet);
            process::exit(1);
        }
    };

    match (export_format, output) {
        (Some(ExportFormat::Aas), _) => print_json(&export::aas_document(&result), output, quiet),
        (Some(ExportFormat::NodeRed), _) => {
            print_json(&export::node_red_flow(&result), output, quiet)
        }
        (None, OutputFormat::Json) => print_json(&result, output, quiet),
        (None, OutputFormat::Text) => print_result_text(&result, quiet),
    }
}

fn report_pipeline_error(err: &PipelineError, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => eprintln!("{}", err.to_json_value()),
        OutputFormat::Text => {
            let msg = match err {
                PipelineError::Generation(e) => format!("error [{}]: {} ({})", e.code(), e.user_message(), e),
                other => format!("error [{}]: {}", other.code(), other),
            };
            report_error(&msg, output, quiet);
            if let PipelineError::NoMapping { raw, errors } = err {
                for grammar_err in errors {
                    eprintln!("  {}", grammar_err);
                }
                eprintln!("raw generator output:\n{}", raw);
            }
        }
    }
}

fn print_result_text(result: &PipelineResult, quiet: bool) {
    let status = match result.status {
        Status::Success => "success",
        Status::Warning => "warning",
        Status::Error => "error",
    };
    let m = &result.mapping;
    println!("status: {}", status);
    println!("source: {}", m.source);
    println!("target: {}", m.target);
    println!("eclassId: {}", m.eclass_id);
    println!("unit: {}", result.unit);
    println!("confidence: {:.2}", result.confidence);
    println!(
        "fallback: {}",
        if result.fallback_applied { "applied" } else { "not applied" }
    );
    if let Some(candidates) = &result.candidates {
        println!("candidates:");
        for c in candidates {
            println!("  {} {} [{}]", c.eclass_id, c.target, c.unit);
        }
    }
    for action in &result.actions {
        println!("action: {}", action);
    }
    for err in &result.errors {
        println!("error [{}]: {}", err.code(), err);
    }
    if !quiet {
        println!("steps:");
        for step in &result.steps {
            println!("  {}. {} - {}", step.step, step.action, step.detail);
        }
    }
}
