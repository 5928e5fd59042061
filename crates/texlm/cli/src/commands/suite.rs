//! Regression suite replay
//!
//! A suite file lists requests under `tests:`. A case with
//! `expected_program` must succeed with a numeric core close to that
//! program's value; a case with `expected_reason` must come back as
//! needing rephrasing. Cases with neither are informational.

use std::fmt;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use texlm_pipeline::{PipelineConfig, PipelineResult};
use texlm_render::parse_numeric_core;

use super::run::{build_pipeline, spinner};
use crate::error::{CliError, CliResult};
use crate::output::{print_output, OutputFormat};

const ABS_TOLERANCE: f64 = 1e-2;
const REL_TOLERANCE: f64 = 1e-2;
const PROMPT_COLUMN_WIDTH: usize = 48;

#[derive(Args)]
pub struct SuiteArgs {
    /// Suite file (YAML)
    pub file: PathBuf,

    /// Write passing styled results to a LaTeX document
    #[arg(short, long)]
    pub latex_out: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct SuiteFile {
    tests: Vec<SuiteCase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuiteCase {
    pub prompt: String,
    #[serde(default)]
    pub expected_program: Option<String>,
    #[serde(default)]
    pub expected_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseVerdict {
    Pass,
    Fail,
    Info,
}

impl fmt::Display for CaseVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "{}", "pass".green()),
            Self::Fail => write!(f, "{}", "FAIL".red().bold()),
            Self::Info => write!(f, "{}", "info".blue()),
        }
    }
}

#[derive(Tabled, Serialize)]
struct CaseRow {
    #[tabled(rename = "#")]
    case: usize,
    #[tabled(rename = "Prompt")]
    prompt: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Verdict")]
    verdict: CaseVerdict,
    #[tabled(rename = "Detail")]
    detail: String,
}

pub async fn execute(args: SuiteArgs, config: &PipelineConfig, format: OutputFormat) -> CliResult<()> {
    let text = std::fs::read_to_string(&args.file)?;
    let cases = parse_suite(&text)?;
    let pipeline = build_pipeline(config)?;

    let total = cases.len();
    let mut rows = Vec::with_capacity(total);
    let mut passing_markup = Vec::new();

    for (index, case) in cases.iter().enumerate() {
        let pb = spinner(format!("[{}/{}] {}", index + 1, total, truncate(&case.prompt)));
        let result = pipeline.run(&case.prompt).await;
        pb.finish_and_clear();

        let (verdict, detail) = judge(case, &result);
        tracing::info!(case = index + 1, status = result.status(), ?verdict, "suite case finished");

        if let (CaseVerdict::Pass, PipelineResult::Success { final_markup, .. }) =
            (verdict, &result)
        {
            passing_markup.push((case.prompt.clone(), final_markup.clone()));
        }

        rows.push(CaseRow {
            case: index + 1,
            prompt: truncate(&case.prompt),
            status: result.status().to_string(),
            verdict,
            detail,
        });
    }

    print_output(&rows, format)?;

    if let Some(path) = &args.latex_out {
        std::fs::write(path, latex_document(&passing_markup))?;
    }

    let failed = rows.iter().filter(|r| r.verdict == CaseVerdict::Fail).count();
    if format == OutputFormat::Table {
        println!();
        println!(
            "{} {} passed, {} failed, {} informational",
            "Summary:".bold(),
            rows.iter().filter(|r| r.verdict == CaseVerdict::Pass).count(),
            failed,
            rows.iter().filter(|r| r.verdict == CaseVerdict::Info).count(),
        );
    }

    if failed > 0 {
        return Err(CliError::Suite(format!("{} of {} cases failed", failed, total)));
    }
    Ok(())
}

fn parse_suite(text: &str) -> CliResult<Vec<SuiteCase>> {
    let suite: SuiteFile = serde_yaml::from_str(text)?;
    if let Some(case) = suite.tests.iter().position(|c| c.prompt.trim().is_empty()) {
        return Err(CliError::Suite(format!("case {} has an empty prompt", case + 1)));
    }
    Ok(suite.tests)
}

/// Grade one pipeline result against its case
pub fn judge(case: &SuiteCase, result: &PipelineResult) -> (CaseVerdict, String) {
    let graded = case.expected_program.is_some() || case.expected_reason.is_some();

    match result {
        PipelineResult::ExecutionFailure { error_detail, .. } => {
            let verdict = if graded {
                CaseVerdict::Fail
            } else {
                CaseVerdict::Info
            };
            (verdict, format!("system error: {}", error_detail))
        }
        PipelineResult::Success {
            dsl,
            numeric_core_markup,
            ..
        } => match (&case.expected_program, &case.expected_reason) {
            (Some(expected_program), _) => {
                compare_with_program(numeric_core_markup, expected_program)
            }
            (None, Some(expected_reason)) => (
                CaseVerdict::Fail,
                format!("expected rejection: {}", expected_reason),
            ),
            (None, None) => (CaseVerdict::Info, dsl.clone()),
        },
        PipelineResult::NeedsRephrasing { error_reason, .. } => {
            match (&case.expected_program, &case.expected_reason) {
                (Some(_), _) => (
                    CaseVerdict::Fail,
                    format!("failed to generate a valid result: {}", error_reason),
                ),
                (None, Some(expected_reason)) => (
                    CaseVerdict::Pass,
                    format!("{} (expected: {})", error_reason, expected_reason),
                ),
                (None, None) => (CaseVerdict::Info, error_reason.clone()),
            }
        }
    }
}

fn compare_with_program(numeric_core: &str, expected_program: &str) -> (CaseVerdict, String) {
    let expected = match texlm_dsl::evaluate(expected_program) {
        Ok(value) => value.to_f64_rows(),
        Err(e) => {
            return (
                CaseVerdict::Fail,
                format!("invalid expected program: {}", e),
            )
        }
    };
    let returned = match parse_numeric_core(numeric_core) {
        Ok(rows) => rows,
        Err(e) => return (CaseVerdict::Fail, e.to_string()),
    };

    if allclose(&returned, &expected, REL_TOLERANCE, ABS_TOLERANCE) {
        (CaseVerdict::Pass, "matches expected program".to_string())
    } else {
        (
            CaseVerdict::Fail,
            format!("returned {:?} but expected {:?}", returned, expected),
        )
    }
}

/// Element-wise `|a - b| <= atol + rtol * |b|` over equal shapes
fn allclose(actual: &[Vec<f64>], expected: &[Vec<f64>], rtol: f64, atol: f64) -> bool {
    actual.len() == expected.len()
        && actual.iter().zip(expected).all(|(a_row, b_row)| {
            a_row.len() == b_row.len()
                && a_row
                    .iter()
                    .zip(b_row)
                    .all(|(a, b)| a == b || (a - b).abs() <= atol + rtol * b.abs())
        })
}

fn truncate(prompt: &str) -> String {
    let line = prompt.lines().next().unwrap_or_default();
    if line.chars().count() <= PROMPT_COLUMN_WIDTH && !prompt.contains('\n') {
        return line.to_string();
    }
    let cut: String = line.chars().take(PROMPT_COLUMN_WIDTH - 3).collect();
    format!("{}...", cut)
}

fn latex_document(entries: &[(String, String)]) -> String {
    let mut doc = String::from("\\documentclass{article}\n\\usepackage{amsmath}\n\n\\begin{document}\n\n");
    for (prompt, markup) in entries {
        doc.push_str(&escape_latex(prompt));
        doc.push_str("\n\n");
        doc.push_str(markup);
        doc.push_str("\n\n");
    }
    doc.push_str("\\end{document}\n");
    doc
}

/// Escape text for a LaTeX paragraph
fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '\\' => out.push_str("\\textbackslash{}"),
            _ => out.push(c),
        }
    }
    out
}
