//! Fixed-precision LaTeX rendering for TexLM
//!
//! [`NumericFormatter`] turns a matrix value into the numeric core, a
//! `bmatrix` fragment whose every numeral fits the significant-figure
//! budget. [`audit_numerals`] checks that later styling left those
//! numerals intact, and [`parse_numeric_core`] reads a core back into
//! numbers for regression checks.

#![deny(unsafe_code)]

mod error;
mod formatter;
mod numerals;

pub use error::{RenderError, RenderResult};
pub use formatter::{
    NumericFormatter, BEGIN_GRID, COLUMN_SEPARATOR, DEFAULT_SIGNIFICANT_FIGURES, END_GRID,
    ROW_SEPARATOR,
};
pub use numerals::{audit_numerals, extract_numerals, parse_numeric_core};
