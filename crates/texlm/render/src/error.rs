//! Render error types

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// A numeral of the numeric core is absent from, or altered in, the
    /// styled markup.
    #[error("styled markup does not preserve numeral {position} ('{numeral}') of the numeric core")]
    NumeralNotPreserved { numeral: String, position: usize },

    /// The markup is not a readable numeric core.
    #[error("cannot read numeric core: {0}")]
    NumericCore(String),
}

/// Result type alias for render operations
pub type RenderResult<T> = Result<T, RenderError>;
