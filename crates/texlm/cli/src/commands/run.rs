//! Full pipeline run against the configured oracles

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;
use texlm_oracle::ChatOracle;
use texlm_pipeline::{AttemptRecord, ExecutionOutcome, Pipeline, PipelineConfig, PipelineResult};

use crate::error::CliResult;
use crate::output::{print_info, print_output, print_result, print_single, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Natural-language request
    pub text: String,

    /// Ask for a replacement program when the request needs rephrasing
    #[arg(short, long)]
    pub manual_override: bool,

    /// List every attempt after the result
    #[arg(short = 'a', long)]
    pub show_attempts: bool,
}

#[derive(Tabled, Serialize)]
struct AttemptRow {
    #[tabled(rename = "#")]
    attempt: u32,
    #[tabled(rename = "Program")]
    program: String,
    #[tabled(rename = "Verified")]
    verified: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

impl From<&AttemptRecord> for AttemptRow {
    fn from(record: &AttemptRecord) -> Self {
        let verified = match record.verification_verdict {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        let outcome = match (&record.execution_outcome, &record.failure) {
            (ExecutionOutcome::Succeeded { .. }, _) => "success".to_string(),
            (_, Some(failure)) => format!("{:?} ({})", failure.class, failure.stage),
            _ => "-".to_string(),
        };
        Self {
            attempt: record.attempt_index,
            program: record.dsl_text.clone().unwrap_or_else(|| "-".into()),
            verified: verified.to_string(),
            outcome,
        }
    }
}

/// Pipeline backed by the HTTP chat oracle
pub(crate) fn build_pipeline(config: &PipelineConfig) -> CliResult<Pipeline> {
    let oracle = ChatOracle::from_config(config.oracle.clone())?;
    Ok(Pipeline::from_config(Arc::new(oracle), config))
}

pub(crate) fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub async fn execute(args: RunArgs, config: &PipelineConfig, format: OutputFormat) -> CliResult<()> {
    let pipeline = build_pipeline(config)?;

    let pb = spinner("Generating and verifying program...".to_string());
    let run = pipeline.run_traced(&args.text).await;
    pb.finish_and_clear();

    let rows: Vec<AttemptRow> = run.attempts.iter().map(AttemptRow::from).collect();

    match format {
        OutputFormat::Table => {
            print_result(&run.result);
            if args.show_attempts {
                println!();
                print_output(&rows, format)?;
            }
        }
        _ => print_single(&run, format)?,
    }

    if args.manual_override && matches!(run.result, PipelineResult::NeedsRephrasing { .. }) {
        let intent = run
            .attempts
            .last()
            .map(|attempt| attempt.formatting_intent.clone())
            .unwrap_or_default();
        manual_override(&pipeline, &intent, format).await?;
    }

    Ok(())
}

/// Operator escalation: execute a hand-written program, skipping
/// generation and verification
async fn manual_override(pipeline: &Pipeline, intent: &str, format: OutputFormat) -> CliResult<()> {
    println!();
    let program: String = dialoguer::Input::new()
        .with_prompt("Replacement program (empty to give up)")
        .allow_empty(true)
        .interact_text()?;

    let program = program.trim();
    if program.is_empty() {
        print_info("No replacement program given");
        return Ok(());
    }

    let result = pipeline.run_program(program, intent).await;
    match format {
        OutputFormat::Table => print_result(&result),
        _ => print_single(&result, format)?,
    }
    Ok(())
}
