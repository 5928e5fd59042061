//! Bounded generate, verify, execute loop
//!
//! Every request walks `GENERATING → VERIFYING → EXECUTING` at most
//! `max_retries + 1` times. A refusal from the generation oracle ends the
//! request at once; mismatches, evaluation errors, styling errors and
//! oracle timeouts feed a new prompt and share one retry counter. Other
//! oracle errors end the request with `ExecutionFailure`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn, Instrument};

use texlm_dsl::EvalError;
use texlm_oracle::prompts::feedback_prompt;
use texlm_oracle::{
    GenerationOracle, OracleError, OracleResult, StylingOracle, VerificationOracle,
};
use texlm_render::{audit_numerals, NumericFormatter, RenderError};

use crate::attempt::{AttemptRecord, ExecutionOutcome, FailureClass, Stage};
use crate::config::{PipelineConfig, DEFAULT_MAX_RETRIES};
use crate::result::{PipelineResult, PipelineRun, RunId};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const REFUSAL_REASON: &str = "the generation oracle returned no program";

/// Failure of the EXECUTING stage
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvalError),

    #[error("styling failed: {0}")]
    Styling(OracleError),

    #[error("styling rejected: {0}")]
    NumeralAudit(#[from] RenderError),
}

impl ExecutionError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::Evaluation(_) => FailureClass::EvaluationError,
            Self::Styling(_) | Self::NumeralAudit(_) => FailureClass::StylingFailure,
        }
    }
}

/// Output of the EXECUTING stage
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Formatter output, before styling
    pub numeric_core: String,
    pub final_markup: String,
}

/// How one attempt ended
enum Step {
    Done(PipelineResult),
    Refused {
        rationale: String,
    },
    Retry {
        dsl: Option<String>,
        rationale: String,
        reason: String,
    },
}

/// Retry orchestrator
pub struct Pipeline {
    generator: Arc<dyn GenerationOracle>,
    verifier: Arc<dyn VerificationOracle>,
    stylist: Arc<dyn StylingOracle>,
    formatter: NumericFormatter,
    max_retries: u32,
    audit_styled_numerals: bool,
    request_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        generator: Arc<dyn GenerationOracle>,
        verifier: Arc<dyn VerificationOracle>,
        stylist: Arc<dyn StylingOracle>,
    ) -> Self {
        Self {
            generator,
            verifier,
            stylist,
            formatter: NumericFormatter::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            audit_styled_numerals: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Build from one backend serving all three roles
    pub fn from_config<O>(oracle: Arc<O>, config: &PipelineConfig) -> Self
    where
        O: GenerationOracle + VerificationOracle + StylingOracle + 'static,
    {
        Self::new(oracle.clone(), oracle.clone(), oracle)
            .with_formatter(config.format)
            .with_max_retries(config.pipeline.max_retries)
            .with_numeral_audit(config.pipeline.audit_styled_numerals)
            .with_request_timeout(Duration::from_secs(config.oracle.request_timeout_secs))
    }

    pub fn with_formatter(mut self, formatter: NumericFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_numeral_audit(mut self, enabled: bool) -> Self {
        self.audit_styled_numerals = enabled;
        self
    }

    /// Deadline applied to each oracle call
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn formatter(&self) -> &NumericFormatter {
        &self.formatter
    }

    // ── Entry points ────────────────────────────────────────────────

    pub async fn run(&self, user_text: &str) -> PipelineResult {
        self.run_traced(user_text).await.result
    }

    /// Like [`Pipeline::run`], also returning every attempt record
    pub async fn run_traced(&self, user_text: &str) -> PipelineRun {
        let run_id = RunId::generate();
        let span = tracing::info_span!("pipeline_run", run_id = %run_id.short());
        let (result, attempts) = self.drive(user_text).instrument(span).await;
        PipelineRun {
            run_id,
            result,
            attempts,
        }
    }

    /// Execute an operator-supplied program, skipping generation and
    /// verification
    pub async fn run_program(&self, dsl: &str, formatting_intent: &str) -> PipelineResult {
        match self.execute(formatting_intent, dsl).await {
            Ok(execution) => PipelineResult::Success {
                dsl: dsl.to_string(),
                numeric_core_markup: execution.numeric_core,
                final_markup: execution.final_markup,
                rationale: "program supplied by operator".to_string(),
            },
            Err(error) => PipelineResult::ExecutionFailure {
                dsl: Some(dsl.to_string()),
                error_detail: error.to_string(),
            },
        }
    }

    /// EXECUTING stage: evaluate, format, style, then audit the styled
    /// numerals against the numeric core
    pub async fn execute(
        &self,
        formatting_intent: &str,
        dsl: &str,
    ) -> Result<Execution, ExecutionError> {
        let value = texlm_dsl::evaluate(dsl)?;
        let numeric_core = self.formatter.format_matrix(&value);

        let final_markup = self
            .bounded("styling", self.stylist.style(formatting_intent, &numeric_core))
            .await
            .map_err(ExecutionError::Styling)?;

        if self.audit_styled_numerals {
            audit_numerals(&numeric_core, &final_markup)?;
        }

        Ok(Execution {
            numeric_core,
            final_markup,
        })
    }

    // ── Loop ────────────────────────────────────────────────────────

    async fn drive(&self, user_text: &str) -> (PipelineResult, Vec<AttemptRecord>) {
        info!(max_retries = self.max_retries, "pipeline started");

        let mut attempts = Vec::new();
        let mut prompt = user_text.to_string();
        let mut last_dsl: Option<String> = None;
        let mut attempt_index = 0u32;

        loop {
            let mut record = AttemptRecord::begin(attempt_index);
            let step = self.attempt(user_text, &prompt, &mut record).await;
            attempts.push(record);

            match step {
                Step::Done(result) => {
                    info!(attempt = attempt_index, status = result.status(), "pipeline finished");
                    return (result, attempts);
                }
                Step::Refused { rationale } => {
                    warn!(attempt = attempt_index, "generation oracle refused");
                    let result = PipelineResult::NeedsRephrasing {
                        last_dsl,
                        rationale,
                        error_reason: REFUSAL_REASON.to_string(),
                    };
                    return (result, attempts);
                }
                Step::Retry {
                    dsl,
                    rationale,
                    reason,
                } => {
                    // Feedback names only this attempt's program.
                    let feedback = feedback_prompt(user_text, dsl.as_deref(), &reason);
                    if dsl.is_some() {
                        last_dsl = dsl;
                    }
                    if attempt_index >= self.max_retries {
                        warn!(attempt = attempt_index, reason = %reason, "retry budget exhausted");
                        let result = PipelineResult::NeedsRephrasing {
                            last_dsl,
                            rationale,
                            error_reason: reason,
                        };
                        return (result, attempts);
                    }
                    warn!(attempt = attempt_index, reason = %reason, "attempt rejected, retrying");
                    prompt = feedback;
                    attempt_index += 1;
                }
            }
        }
    }

    async fn attempt(&self, user_text: &str, prompt: &str, record: &mut AttemptRecord) -> Step {
        let attempt = record.attempt_index;

        debug!(attempt, stage = %Stage::Generating, "calling generation oracle");
        let generation = match self.bounded("generation", self.generator.generate(prompt)).await {
            Ok(generation) => generation,
            Err(error) => {
                return oracle_failure(record, Stage::Generating, None, String::new(), error)
            }
        };

        record.rationale_text = generation.rationale.clone();
        record.formatting_intent = generation.formatting_intent.clone();
        record.dsl_text = generation.dsl_candidate.clone();

        let rationale = generation.rationale;
        let dsl = match generation.dsl_candidate {
            Some(dsl) if !dsl.trim().is_empty() => dsl,
            _ => {
                record.fail(Stage::Generating, FailureClass::OracleRefusal, REFUSAL_REASON);
                return Step::Refused { rationale };
            }
        };

        debug!(attempt, stage = %Stage::Verifying, dsl = %dsl, "calling verification oracle");
        let verification = self.verifier.verify(user_text, &dsl);
        let verdict = match self.bounded("verification", verification).await {
            Ok(verdict) => verdict,
            Err(error) => {
                return oracle_failure(record, Stage::Verifying, Some(dsl), rationale, error)
            }
        };

        record.verification_verdict = Some(verdict.is_match);
        record.verification_explanation = Some(verdict.explanation.clone());

        if !verdict.is_match {
            let reason = format!("verification mismatch: {}", verdict.explanation);
            record.fail(Stage::Verifying, FailureClass::VerificationMismatch, &reason);
            return Step::Retry {
                dsl: Some(dsl),
                rationale,
                reason,
            };
        }

        debug!(attempt, stage = %Stage::Executing, "executing program");
        match self.execute(&record.formatting_intent, &dsl).await {
            Ok(execution) => {
                record.execution_outcome = ExecutionOutcome::Succeeded {
                    numeric_core: execution.numeric_core.clone(),
                    final_markup: execution.final_markup.clone(),
                };
                Step::Done(PipelineResult::Success {
                    dsl,
                    numeric_core_markup: execution.numeric_core,
                    final_markup: execution.final_markup,
                    rationale,
                })
            }
            Err(error) => {
                let reason = error.to_string();
                record.execution_outcome = ExecutionOutcome::Failed {
                    message: reason.clone(),
                };
                record.fail(Stage::Executing, error.failure_class(), &reason);
                Step::Retry {
                    dsl: Some(dsl),
                    rationale,
                    reason,
                }
            }
        }
    }

    async fn bounded<T, F>(&self, call: &str, future: F) -> OracleResult<T>
    where
        F: Future<Output = OracleResult<T>>,
    {
        match tokio::time::timeout(self.request_timeout, future).await {
            Ok(reply) => reply,
            Err(_) => Err(OracleError::timeout(format!(
                "{} call exceeded {:?}",
                call, self.request_timeout
            ))),
        }
    }
}

/// Timeouts and unreadable replies are retried; anything else ends the request
fn oracle_failure(
    record: &mut AttemptRecord,
    stage: Stage,
    dsl: Option<String>,
    rationale: String,
    error: OracleError,
) -> Step {
    let reason = error.to_string();
    record.fail(stage, FailureClass::OracleError, &reason);
    if error.is_retryable() {
        Step::Retry {
            dsl,
            rationale,
            reason,
        }
    } else {
        Step::Done(PipelineResult::ExecutionFailure {
            dsl,
            error_detail: reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texlm_oracle::ScriptedOracle;

    fn pipeline(oracle: Arc<ScriptedOracle>) -> Pipeline {
        Pipeline::new(oracle.clone(), oracle.clone(), oracle)
    }

    #[tokio::test]
    async fn test_execute_formats_and_styles() {
        let oracle = Arc::new(ScriptedOracle::new());
        let execution = pipeline(oracle.clone())
            .execute("latex matrix", "transpose([[1,2],[3,4]])")
            .await
            .unwrap();
        assert_eq!(
            execution.numeric_core,
            "\\begin{bmatrix}\n1 & 3 \\\\\n2 & 4\n\\end{bmatrix}"
        );
        assert_eq!(execution.final_markup, execution.numeric_core);
        assert_eq!(oracle.styling_calls(), 1);
    }

    #[tokio::test]
    async fn test_execute_near_singular_inverse_uses_scientific_notation() {
        let oracle = Arc::new(ScriptedOracle::new());
        let execution = pipeline(oracle)
            .execute("latex matrix", "inverse([[1, 0], [0, 0.0000000000001]])")
            .await
            .unwrap();
        assert_eq!(
            execution.numeric_core,
            "\\begin{bmatrix}\n1 & 0 \\\\\n0 & 1.0000e+13\n\\end{bmatrix}"
        );
    }

    #[tokio::test]
    async fn test_execute_skips_styling_on_evaluation_error() {
        let oracle = Arc::new(ScriptedOracle::new());
        let err = pipeline(oracle.clone())
            .execute("latex matrix", "inverse([[1,2],[2,4]])")
            .await
            .unwrap_err();
        assert_eq!(err.failure_class(), FailureClass::EvaluationError);
        assert!(err.to_string().contains("singular"));
        assert_eq!(oracle.styling_calls(), 0);
    }

    #[tokio::test]
    async fn test_audit_can_be_disabled() {
        let oracle = Arc::new(ScriptedOracle::new().then_style("\\text{no numbers}"));
        let execution = pipeline(oracle)
            .with_numeral_audit(false)
            .execute("latex matrix", "[[1]]")
            .await
            .unwrap();
        assert_eq!(execution.final_markup, "\\text{no numbers}");
    }

    #[tokio::test]
    async fn test_run_program_reports_failure() {
        let oracle = Arc::new(ScriptedOracle::new());
        let result = pipeline(oracle).run_program("add([[1]], [[1, 2]])", "").await;
        match result {
            PipelineResult::ExecutionFailure { dsl, error_detail } => {
                assert_eq!(dsl.as_deref(), Some("add([[1]], [[1, 2]])"));
                assert!(error_detail.contains("same shape"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_from_config_applies_settings() {
        let mut config = PipelineConfig::default();
        config.pipeline.max_retries = 7;
        config.format = NumericFormatter::new(3);
        let pipeline = Pipeline::from_config(Arc::new(ScriptedOracle::new()), &config);
        assert_eq!(pipeline.max_retries(), 7);
        assert_eq!(pipeline.formatter().significant_figures, 3);
    }
}
