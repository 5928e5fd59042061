//! Evaluator error types

use serde::{Deserialize, Serialize};
use std::fmt;
use texlm_matrix::MatrixError;

/// Errors that can occur while parsing or evaluating a program
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Syntax error at line {line}, column {col}: {message}")]
    Syntax {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("Unknown operation '{name}' at line {line}, column {col}: expected one of transpose, inverse, add, multiply")]
    UnknownOperation { name: String, line: usize, col: usize },

    #[error("Arity error: '{operation}' takes {expected} argument(s), found {found}")]
    Arity {
        operation: String,
        expected: usize,
        found: usize,
    },

    #[error("Shape error in {operation}: {message}")]
    Shape { operation: String, message: String },

    #[error("Dimension error: {0}")]
    Dimension(String),
}

/// Discriminant of [`EvalError`], stable across releases
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalErrorKind {
    SyntaxError,
    UnknownOperationError,
    ArityError,
    ShapeError,
    DimensionError,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SyntaxError => "SyntaxError",
            Self::UnknownOperationError => "UnknownOperationError",
            Self::ArityError => "ArityError",
            Self::ShapeError => "ShapeError",
            Self::DimensionError => "DimensionError",
        };
        f.write_str(name)
    }
}

impl EvalError {
    pub(crate) fn syntax(line: usize, col: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            col,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> EvalErrorKind {
        match self {
            Self::Syntax { .. } => EvalErrorKind::SyntaxError,
            Self::UnknownOperation { .. } => EvalErrorKind::UnknownOperationError,
            Self::Arity { .. } => EvalErrorKind::ArityError,
            Self::Shape { .. } => EvalErrorKind::ShapeError,
            Self::Dimension(_) => EvalErrorKind::DimensionError,
        }
    }
}

impl From<MatrixError> for EvalError {
    fn from(err: MatrixError) -> Self {
        match err {
            MatrixError::Shape { operation, message } => Self::Shape {
                operation: operation.to_string(),
                message,
            },
            MatrixError::Dimension(message) => Self::Dimension(message),
        }
    }
}

/// Result type alias for evaluator operations
pub type EvalResult<T> = Result<T, EvalError>;
