//! TexLM CLI - command-line caller of the verified expression pipeline
//!
//! This CLI lets operators and developers:
//! - Turn a natural-language request into verified LaTeX
//! - Evaluate and format a program locally, without any oracle
//! - Print the expression grammar
//! - Replay a YAML regression suite against the live oracles

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use texlm_pipeline::{LoggingConfig, PipelineConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use commands::{eval, grammar, run, suite};
pub use error::{CliError, CliResult};
pub use output::OutputFormat;

/// TexLM CLI application
#[derive(Parser)]
#[command(name = "texlm")]
#[command(about = "TexLM - natural language to verified LaTeX matrices", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML or YAML)
    #[arg(short, long, env = "TEXLM_CONFIG")]
    config: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run a request through the full pipeline
    Run(run::RunArgs),

    /// Evaluate a program locally and print its numeric core
    Eval(eval::EvalArgs),

    /// Print the expression grammar
    Grammar,

    /// Replay a regression suite
    Suite(suite::SuiteArgs),
}

/// Run using the current process arguments.
pub async fn run() -> CliResult<()> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let config = PipelineConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::Run(args) => run::execute(args, &config, cli.output).await,
        Commands::Eval(args) => eval::execute(args, &config, cli.output),
        Commands::Grammar => grammar::execute(cli.output),
        Commands::Suite(args) => suite::execute(args, &config, cli.output).await,
    }
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level. Logs go
/// to stderr so structured output on stdout stays parseable.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    let initialized = if logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // already set by an embedding caller
    let _ = initialized;
}
