//! Terminal results of a pipeline run

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attempt::AttemptRecord;

/// Identifier of one `run` invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a request. Exactly one is returned per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineResult {
    /// A verified program was evaluated and rendered
    Success {
        dsl: String,
        numeric_core_markup: String,
        final_markup: String,
        rationale: String,
    },

    /// An oracle call failed outside the retry path
    ExecutionFailure {
        dsl: Option<String>,
        error_detail: String,
    },

    /// No verifiable program was reached; a human should rephrase
    NeedsRephrasing {
        last_dsl: Option<String>,
        rationale: String,
        error_reason: String,
    },
}

impl PipelineResult {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "SUCCESS",
            Self::ExecutionFailure { .. } => "EXECUTION_FAILURE",
            Self::NeedsRephrasing { .. } => "NEEDS_REPHRASING",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A result together with the attempts that led to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: RunId,
    pub result: PipelineResult,
    pub attempts: Vec<AttemptRecord>,
}
