//! Oracle error types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure class of an oracle call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleErrorKind {
    /// Connection or protocol failure
    Transport,
    /// The call did not finish in time
    Timeout,
    /// The reply could not be read
    Parse,
    /// Missing credentials or unusable settings
    InvalidConfig,
    /// The service answered with an error status
    Api,
}

impl fmt::Display for OracleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Parse => "parse",
            Self::InvalidConfig => "invalid config",
            Self::Api => "api",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("oracle {kind} error: {message}")]
pub struct OracleError {
    pub kind: OracleErrorKind,
    pub message: String,
}

impl OracleError {
    pub fn new(kind: OracleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Parse, message)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::InvalidConfig, message)
    }

    /// Whether a fresh attempt may succeed where this one failed.
    ///
    /// Timeouts and unreadable replies are retried. Transport, API and
    /// configuration failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, OracleErrorKind::Timeout | OracleErrorKind::Parse)
    }
}

/// Result type alias for oracle calls
pub type OracleResult<T> = Result<T, OracleError>;
