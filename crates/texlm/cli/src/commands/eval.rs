//! Local evaluation, no oracle involved

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use texlm_matrix::MatrixValue;
use texlm_pipeline::PipelineConfig;
use texlm_render::NumericFormatter;

use crate::error::CliResult;
use crate::output::{print_single, OutputFormat};

#[derive(Args)]
pub struct EvalArgs {
    /// Program, e.g. "transpose([[1, 2], [3, 4]])"
    pub program: String,

    /// Override the significant-figure budget
    #[arg(short, long)]
    pub significant_figures: Option<usize>,
}

#[derive(Serialize)]
struct EvalReport {
    program: String,
    shape: String,
    value: MatrixValue,
    numeric_core: String,
}

pub fn execute(args: EvalArgs, config: &PipelineConfig, format: OutputFormat) -> CliResult<()> {
    let formatter = match args.significant_figures {
        Some(n) => NumericFormatter::new(n),
        None => config.format,
    };

    let value = texlm_dsl::evaluate(&args.program)?;
    let report = EvalReport {
        program: args.program,
        shape: value.shape().to_string(),
        numeric_core: formatter.format_matrix(&value),
        value,
    };

    match format {
        OutputFormat::Table => {
            println!("{} {}", "Shape:".bold(), report.shape);
            println!("{} {}", "Value:".bold(), report.value);
            println!();
            println!("{}", report.numeric_core);
            Ok(())
        }
        _ => print_single(&report, format),
    }
}
