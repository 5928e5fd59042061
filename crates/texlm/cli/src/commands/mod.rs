//! CLI command implementations

pub mod eval;
pub mod grammar;
pub mod run;
pub mod suite;
