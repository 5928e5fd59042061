//! Numeric matrix values and the four operations the expression language
//! can call.
//!
//! ```
//! use texlm_matrix::{MatrixValue, Scalar};
//!
//! let a = MatrixValue::from_rows(vec![
//!     vec![Scalar::Int(1), Scalar::Int(2)],
//!     vec![Scalar::Int(3), Scalar::Int(4)],
//! ])
//! .unwrap();
//! assert_eq!(a.transpose().to_string(), "[[1, 3], [2, 4]]");
//! ```

#![deny(unsafe_code)]

mod error;
mod matrix;
mod ops;
mod scalar;

pub use error::{MatrixError, MatrixResult};
pub use matrix::{MatrixValue, Shape};
pub use ops::SINGULARITY_TOLERANCE;
pub use scalar::Scalar;
