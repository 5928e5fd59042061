//! Verified expression pipeline
//!
//! [`Pipeline::run`] turns a natural-language request into markup:
//!
//! 1. the generation oracle proposes a program,
//! 2. the verification oracle checks it against the original request,
//! 3. the program is evaluated, formatted and styled.
//!
//! Failures feed back into the next generation attempt until the retry
//! budget is spent. The caller always gets exactly one [`PipelineResult`].

#![deny(unsafe_code)]

pub mod attempt;
pub mod config;
pub mod orchestrator;
pub mod result;

pub use attempt::{AttemptFailure, AttemptRecord, ExecutionOutcome, FailureClass, Stage};
pub use config::{ConfigError, LoggingConfig, PipelineConfig, RetryConfig, DEFAULT_MAX_RETRIES};
pub use orchestrator::{Execution, ExecutionError, Pipeline};
pub use result::{PipelineResult, PipelineRun, RunId};
