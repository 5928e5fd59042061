//! TexLM expression language
//!
//! A program is one matrix literal or one call to `transpose`,
//! `inverse`, `add` or `multiply`, with calls nesting arbitrarily:
//!
//! ```text
//! inverse(add([[1, 2], [3, 4]], [[5, 6], [7, 8]]))
//! ```
//!
//! There are no variables and no control flow, so every program that
//! parses has exactly one evaluation.

#![deny(unsafe_code)]

pub mod ast;
pub mod errors;
pub mod evaluator;
pub mod grammar;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use evaluator::{evaluate, evaluate_expr};
pub use grammar::{arity_of, GRAMMAR, OPERATIONS};
pub use parser::{parse, MAX_NESTING};
