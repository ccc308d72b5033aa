mod commands;
mod config;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Praxis policy engine.
#[derive(Parser)]
#[command(name = "praxis", version, about = "Praxis policy engine")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Sources for building an engine. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct EngineArgs {
    /// Policy source file (YAML, or JSON by extension); repeatable
    #[arg(long = "policies", value_name = "FILE")]
    pub(crate) policies: Vec<PathBuf>,
    /// JSON schema applied to request data before any policy runs
    #[arg(long, value_name = "FILE")]
    pub(crate) request_schema: Option<PathBuf>,
    /// JSON schema applied to the processed data
    #[arg(long, value_name = "FILE")]
    pub(crate) response_schema: Option<PathBuf>,
    /// Path to a praxis.toml config file
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a request envelope and print the response
    Process {
        /// Path to the request JSON file
        request: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Evaluate a single rule against a document
    Check {
        /// Rule text, e.g. "$.valor > 100"
        rule: String,
        /// Path to the document JSON file (default: empty object)
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Validate a JSON document against a schema
    Validate {
        /// Path to the document JSON file
        document: PathBuf,
        /// Path to the schema JSON file
        #[arg(long)]
        schema: PathBuf,
    },

    /// Start the HTTP service
    Serve {
        /// Port to listen on (default: 8080, or the config file's value)
        #[arg(long)]
        port: Option<u16>,
        /// Per-request processing timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match (&cli.command, cli.quiet) {
        (_, true) => "error",
        (Commands::Serve { .. }, false) => "info",
        _ => "warn",
    };
    init_tracing(default_level);

    match cli.command {
        Commands::Process { request, engine } => {
            commands::process::cmd_process(&request, &engine, cli.output, cli.quiet);
        }
        Commands::Check { rule, data } => {
            commands::check::cmd_check(&rule, data.as_deref(), cli.output, cli.quiet);
        }
        Commands::Validate { document, schema } => {
            commands::validate::cmd_validate(&document, &schema, cli.output, cli.quiet);
        }
        Commands::Serve {
            port,
            timeout_ms,
            engine,
        } => {
            cmd_serve(port, timeout_ms, &engine, cli.output, cli.quiet);
        }
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over `default_level`.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_serve(
    port: Option<u16>,
    timeout_ms: Option<u64>,
    args: &EngineArgs,
    output: OutputFormat,
    quiet: bool,
) {
    let config = match config::load_config(args) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let engine = match config::build_engine(&config::engine_settings(&config, args)) {
        Ok(e) => e,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let mut settings = config.server;
    if let Some(p) = port {
        settings.port = p;
    }
    if let Some(ms) = timeout_ms {
        if ms == 0 {
            report_error("error: --timeout-ms must be positive", output, quiet);
            process::exit(1);
        }
        settings.request_timeout_ms = ms;
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(
                &format!("failed to create tokio runtime: {}", e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(serve::start_server(settings, engine)) {
        report_error(&format!("Server error: {}", e), output, quiet);
        process::exit(1);
    }
}

/// Print an error message to stderr, as text or a JSON object.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
