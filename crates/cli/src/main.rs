mod commands;
mod gemini;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use toonmap_core::InputType;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Kind of source being mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum InputTypeArg {
    /// Legacy PLC tag
    Brownfield,
    /// REST or AAS endpoint
    Greenfield,
}

impl From<InputTypeArg> for InputType {
    fn from(arg: InputTypeArg) -> Self {
        match arg {
            InputTypeArg::Brownfield => InputType::Brownfield,
            InputTypeArg::Greenfield => InputType::Greenfield,
        }
    }
}

/// Document to emit instead of the pipeline result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportFormat {
    /// Asset administration shell JSON
    Aas,
    /// Importable Node-RED flow
    NodeRed,
}

/// Semantic mapping of industrial tags to ECLASS properties.
#[derive(Parser)]
#[command(
    name = "toonmap",
    version,
    about = "Semantic mapping of industrial tags to ECLASS properties"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log pipeline progress to stderr (overridden by RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether an input belongs to the industrial domain
    Guard {
        /// Tag, endpoint or free text to classify
        input: String,
    },

    /// Validate TOON notation and list the mappings it contains
    Parse {
        /// TOON text (bracket stream or MAP{..} form)
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        text: Option<String>,
        /// Read the TOON text from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print categorized display segments instead of mappings
        #[arg(long)]
        highlight: bool,
    },

    /// Resolve a tag with the heuristic ECLASS table
    Resolve {
        /// Raw tag name
        tag: String,
    },

    /// Run the full mapping pipeline for one tag or endpoint
    Map {
        /// Tag or endpoint to map
        input: String,
        /// Kind of source
        #[arg(long, value_enum, default_value = "brownfield")]
        input_type: InputTypeArg,
        /// Use the offline mock generator even when an API key is set
        #[arg(long)]
        mock: bool,
        /// Generation model (overrides TOONMAP_MODEL)
        #[arg(long)]
        model: Option<String>,
        /// Emit an export document instead of the pipeline result
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Guard { input } => {
            commands::guard::cmd_guard(&input, cli.output, cli.quiet);
        }
        Commands::Parse {
            text,
            file,
            highlight,
        } => {
            commands::parse::cmd_parse(
                text.as_deref(),
                file.as_deref(),
                highlight,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Resolve { tag } => {
            commands::resolve::cmd_resolve(&tag, cli.output, cli.quiet);
        }
        Commands::Map {
            input,
            input_type,
            mock,
            model,
            export,
        } => {
            commands::map::cmd_map(
                &input,
                input_type.into(),
                mock,
                model.as_deref(),
                export,
                cli.output,
                cli.quiet,
            );
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// Pretty-print a serializable value on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T, output: OutputFormat, quiet: bool) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            report_error(&format!("error serializing output: {}", e), output, quiet);
            std::process::exit(1);
        }
    }
}
