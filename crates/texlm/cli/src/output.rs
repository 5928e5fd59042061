//! Output formatting utilities

use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};
use texlm_pipeline::PipelineResult;

use crate::error::CliResult;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print a vector of rows in the specified format
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
    }
    Ok(())
}

/// Print a single item as JSON or YAML
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?)
        }
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
    }
    Ok(())
}

/// Human-readable rendering of a pipeline result
pub fn print_result(result: &PipelineResult) {
    match result {
        PipelineResult::Success {
            dsl,
            numeric_core_markup,
            final_markup,
            rationale,
        } => {
            print_success("SUCCESS");
            println!("  {} {}", "Program:".bold(), dsl);
            println!("  {} {}", "Rationale:".bold(), rationale.dimmed());
            println!();
            println!("{}", "Numeric core".bold().cyan());
            println!("{}", numeric_core_markup);
            println!();
            println!("{}", "Final markup".bold().cyan());
            println!("{}", final_markup);
        }
        PipelineResult::ExecutionFailure { dsl, error_detail } => {
            print_error("EXECUTION_FAILURE");
            if let Some(dsl) = dsl {
                println!("  {} {}", "Program:".bold(), dsl);
            }
            println!("  {} {}", "Error:".bold(), error_detail);
        }
        PipelineResult::NeedsRephrasing {
            last_dsl,
            rationale,
            error_reason,
        } => {
            print_warning("NEEDS_REPHRASING");
            println!(
                "  {} {}",
                "Last program:".bold(),
                last_dsl.as_deref().unwrap_or("(none)")
            );
            println!("  {} {}", "Rationale:".bold(), rationale.dimmed());
            println!("  {} {}", "Reason:".bold(), error_reason);
            println!();
            println!("{}", "Please rephrase the request.".yellow());
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }
}
