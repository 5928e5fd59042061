//! Per-attempt records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loop stage an attempt was in when it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generating,
    Verifying,
    Executing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generating => write!(f, "generating"),
            Self::Verifying => write!(f, "verifying"),
            Self::Executing => write!(f, "executing"),
        }
    }
}

/// Why an attempt did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureClass {
    /// The generation oracle returned no program
    OracleRefusal,
    /// An oracle call failed or timed out
    OracleError,
    VerificationMismatch,
    /// The evaluator rejected the program
    EvaluationError,
    /// The styling call failed or altered a numeral
    StylingFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub stage: Stage,
    pub class: FailureClass,
    pub message: String,
}

/// What the EXECUTING stage produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The attempt ended before execution
    NotReached,
    Succeeded {
        numeric_core: String,
        final_markup: String,
    },
    Failed {
        message: String,
    },
}

/// One generation, verification and execution cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 0 for the first attempt
    pub attempt_index: u32,
    pub dsl_text: Option<String>,
    pub formatting_intent: String,
    pub rationale_text: String,
    /// `None` when verification was not reached
    pub verification_verdict: Option<bool>,
    pub verification_explanation: Option<String>,
    pub execution_outcome: ExecutionOutcome,
    pub failure: Option<AttemptFailure>,
    pub recorded_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub(crate) fn begin(attempt_index: u32) -> Self {
        Self {
            attempt_index,
            dsl_text: None,
            formatting_intent: String::new(),
            rationale_text: String::new(),
            verification_verdict: None,
            verification_explanation: None,
            execution_outcome: ExecutionOutcome::NotReached,
            failure: None,
            recorded_at: Utc::now(),
        }
    }

    pub(crate) fn fail(&mut self, stage: Stage, class: FailureClass, message: impl Into<String>) {
        self.failure = Some(AttemptFailure {
            stage,
            class,
            message: message.into(),
        });
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.execution_outcome, ExecutionOutcome::Succeeded { .. })
    }
}
