//! CLI error types

use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Config(#[from] texlm_pipeline::ConfigError),

    #[error("{0}")]
    Oracle(#[from] texlm_oracle::OracleError),

    #[error("{}: {}", .0.kind(), .0)]
    Eval(#[from] texlm_dsl::EvalError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Suite error: {0}")]
    Suite(String),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
