//! Oracle contracts
//!
//! The pipeline only sees these three traits. Any backend (a chat
//! completion service, a scripted replay, a local model) plugs in behind
//! them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleResult;

/// Reply of the generation oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub rationale: String,
    /// How the caller wants the result presented, e.g. "latex table"
    pub formatting_intent: String,
    /// `None` when the oracle could not or would not produce a program
    pub dsl_candidate: Option<String>,
}

impl Generation {
    pub fn program(
        dsl: impl Into<String>,
        formatting_intent: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            rationale: rationale.into(),
            formatting_intent: formatting_intent.into(),
            dsl_candidate: Some(dsl.into()),
        }
    }

    pub fn refusal(rationale: impl Into<String>) -> Self {
        Self {
            rationale: rationale.into(),
            formatting_intent: String::new(),
            dsl_candidate: None,
        }
    }
}

/// Reply of the verification oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_match: bool,
    pub explanation: String,
}

impl Verdict {
    pub fn matched(explanation: impl Into<String>) -> Self {
        Self {
            is_match: true,
            explanation: explanation.into(),
        }
    }

    pub fn mismatch(explanation: impl Into<String>) -> Self {
        Self {
            is_match: false,
            explanation: explanation.into(),
        }
    }
}

/// Natural language (plus feedback) to a candidate program
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    async fn generate(&self, prompt: &str) -> OracleResult<Generation>;
}

/// Does a program do what the user asked for?
#[async_trait]
pub trait VerificationOracle: Send + Sync {
    async fn verify(&self, user_text: &str, dsl: &str) -> OracleResult<Verdict>;
}

/// Dress a numeric core in presentation markup without touching its numerals
#[async_trait]
pub trait StylingOracle: Send + Sync {
    async fn style(&self, formatting_intent: &str, numeric_core: &str) -> OracleResult<String>;
}
