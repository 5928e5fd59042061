//! Matrix error types

/// Errors raised while building or combining matrix values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    /// Operand shapes are incompatible with the requested operation
    /// (non-square or singular input to inverse, mismatched add/multiply).
    #[error("{operation}: {message}")]
    Shape {
        operation: &'static str,
        message: String,
    },

    /// The value does not describe a non-empty rectangular grid of rank 1 or 2.
    #[error("{0}")]
    Dimension(String),
}

impl MatrixError {
    pub(crate) fn shape(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Shape {
            operation,
            message: message.into(),
        }
    }
}

/// Result type alias for matrix operations
pub type MatrixResult<T> = Result<T, MatrixError>;
