use std::sync::Arc;
use std::time::Duration;

use texlm_oracle::{Generation, OracleError, ScriptedOracle, Verdict};
use texlm_pipeline::{ExecutionOutcome, FailureClass, Pipeline, PipelineResult, Stage};

const REQUEST: &str = "invert the matrix [[1,2],[2,4]]";

fn pipeline(oracle: &Arc<ScriptedOracle>) -> Pipeline {
    Pipeline::new(oracle.clone(), oracle.clone(), oracle.clone())
}

#[tokio::test]
async fn first_attempt_success() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate(Generation::program(
                "transpose([[1,2],[3,4]])",
                "latex matrix",
                "single transpose",
            ))
            .then_verdict(Verdict::matched("transpose of the given matrix")),
    );

    let run = pipeline(&oracle).run_traced("transpose [[1,2],[3,4]]").await;

    match &run.result {
        PipelineResult::Success {
            dsl,
            numeric_core_markup,
            final_markup,
            rationale,
        } => {
            assert_eq!(dsl, "transpose([[1,2],[3,4]])");
            assert!(numeric_core_markup.contains("1 & 3"));
            assert_eq!(final_markup, numeric_core_markup);
            assert_eq!(rationale, "single transpose");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    assert_eq!(run.attempts.len(), 1);
    let record = &run.attempts[0];
    assert_eq!(record.verification_verdict, Some(true));
    assert!(record.succeeded());
    assert!(record.failure.is_none());
    assert_eq!(oracle.styling_calls(), 1);
}

#[tokio::test]
async fn refusal_ends_without_verification() {
    let oracle = Arc::new(ScriptedOracle::new().then_refuse("no matrix in the request"));

    let run = pipeline(&oracle).run_traced("what's the weather").await;

    match &run.result {
        PipelineResult::NeedsRephrasing {
            last_dsl,
            rationale,
            ..
        } => {
            assert_eq!(*last_dsl, None);
            assert_eq!(rationale, "no matrix in the request");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(oracle.generation_calls(), 1);
    assert_eq!(oracle.verification_calls(), 0);
    assert_eq!(oracle.styling_calls(), 0);

    let failure = run.attempts[0].failure.as_ref().unwrap();
    assert_eq!(failure.class, FailureClass::OracleRefusal);
    assert_eq!(run.attempts[0].execution_outcome, ExecutionOutcome::NotReached);
}

#[tokio::test]
async fn singular_matrix_feeds_back_into_generation() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_program("inverse([[1,2],[2,4]])")
            .then_generate_program("transpose([[1,2],[2,4]])"),
    );

    let run = pipeline(&oracle).run_traced(REQUEST).await;

    assert!(run.result.is_success());
    assert_eq!(run.attempts.len(), 2);

    let first = &run.attempts[0];
    assert_eq!(first.verification_verdict, Some(true));
    assert!(matches!(first.execution_outcome, ExecutionOutcome::Failed { .. }));
    let failure = first.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Executing);
    assert_eq!(failure.class, FailureClass::EvaluationError);

    let prompts = oracle.generation_prompts();
    assert_eq!(prompts[0], REQUEST);
    assert!(prompts[1].starts_with(REQUEST));
    assert!(prompts[1].contains("Rejected program: inverse([[1,2],[2,4]])"));
    assert!(prompts[1].contains("singular"));

    // verification never sees the feedback block
    assert_eq!(oracle.verification_texts(), vec![REQUEST, REQUEST]);
}

#[tokio::test]
async fn mismatch_retries_with_explanation() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_program("multiply([[4],[5]], [[1,0],[2,3]])")
            .then_generate_program("multiply([[1,0],[2,3]], [[4],[5]])")
            .then_verdict(Verdict::mismatch("operands are reversed"))
            .then_verdict(Verdict::matched("ok")),
    );

    let run = pipeline(&oracle)
        .run_traced("multiply [[1,0],[2,3]] by [[4],[5]]")
        .await;

    match &run.result {
        PipelineResult::Success {
            numeric_core_markup,
            ..
        } => assert!(numeric_core_markup.contains("4 \\\\\n23")),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(run.attempts[0].verification_verdict, Some(false));
    assert_eq!(
        run.attempts[0].execution_outcome,
        ExecutionOutcome::NotReached
    );
    assert!(oracle.generation_prompts()[1].contains("operands are reversed"));
    assert_eq!(oracle.styling_calls(), 1);
}

#[tokio::test]
async fn budget_bounds_oracle_calls() {
    let mut oracle = ScriptedOracle::new();
    for i in 0..10 {
        oracle = oracle
            .then_generate_program(&format!("transpose([[{i}]])"))
            .then_verdict(Verdict::mismatch(format!("wrong {i}")));
    }
    let oracle = Arc::new(oracle);

    let run = pipeline(&oracle)
        .with_max_retries(2)
        .run_traced("transpose [[9]]")
        .await;

    assert_eq!(oracle.generation_calls(), 3);
    assert_eq!(oracle.verification_calls(), 3);
    assert_eq!(oracle.styling_calls(), 0);
    assert_eq!(run.attempts.len(), 3);

    match run.result {
        PipelineResult::NeedsRephrasing {
            last_dsl,
            rationale,
            error_reason,
        } => {
            assert_eq!(last_dsl.as_deref(), Some("transpose([[2]])"));
            assert_eq!(rationale, "scripted");
            assert!(error_reason.contains("wrong 2"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn zero_budget_allows_one_attempt() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_program("inverse([[0]])")
            .then_generate_program("[[1]]"),
    );

    let result = pipeline(&oracle).with_max_retries(0).run(REQUEST).await;

    assert_eq!(result.status(), "NEEDS_REPHRASING");
    assert_eq!(oracle.generation_calls(), 1);
}

#[tokio::test]
async fn refusal_after_retry_keeps_last_program() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_program("transpose([[1,2]])")
            .then_verdict(Verdict::mismatch("not what was asked"))
            .then_refuse("cannot express this"),
    );

    let result = pipeline(&oracle).run("something odd").await;

    match result {
        PipelineResult::NeedsRephrasing {
            last_dsl,
            rationale,
            ..
        } => {
            assert_eq!(last_dsl.as_deref(), Some("transpose([[1,2]])"));
            assert_eq!(rationale, "cannot express this");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(oracle.verification_calls(), 1);
}

#[tokio::test]
async fn transport_error_is_surfaced() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generation_error(OracleError::transport("connection refused"))
            .then_generate_program("[[1]]"),
    );

    let result = pipeline(&oracle).run(REQUEST).await;

    match result {
        PipelineResult::ExecutionFailure { dsl, error_detail } => {
            assert_eq!(dsl, None);
            assert!(error_detail.contains("connection refused"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(oracle.generation_calls(), 1);
}

#[tokio::test]
async fn verification_transport_error_keeps_candidate() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_program("transpose([[1]])")
            .then_verification_error(OracleError::transport("reset by peer")),
    );

    let result = pipeline(&oracle).run("transpose [[1]]").await;

    assert_eq!(
        result,
        PipelineResult::ExecutionFailure {
            dsl: Some("transpose([[1]])".into()),
            error_detail: OracleError::transport("reset by peer").to_string(),
        }
    );
}

#[tokio::test]
async fn unreadable_generation_is_retried() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generation_error(OracleError::parse("reply is not JSON"))
            .then_generate_program("[[1, 2]]"),
    );

    let run = pipeline(&oracle).run_traced("show [[1,2]]").await;

    assert!(run.result.is_success());
    assert_eq!(
        run.attempts[0].failure.as_ref().unwrap().class,
        FailureClass::OracleError
    );
    assert!(oracle.generation_prompts()[1].contains("(no program)"));
}

#[tokio::test]
async fn feedback_after_unreadable_generation_names_no_program() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_program("transpose([[1,2]])")
            .then_verdict(Verdict::mismatch("not what was asked"))
            .then_generation_error(OracleError::parse("reply is not JSON"))
            .then_generate_program("[[1, 2]]"),
    );

    let run = pipeline(&oracle).run_traced("show [[1,2]]").await;

    assert!(run.result.is_success());
    let prompts = oracle.generation_prompts();
    assert!(prompts[1].contains("Rejected program: transpose([[1,2]])"));
    assert!(prompts[2].contains("Rejected program: (no program)"));
    assert!(prompts[2].contains("reply is not JSON"));
    assert!(!prompts[2].contains("transpose([[1,2]])"));
}

#[tokio::test]
async fn exhausted_budget_keeps_last_produced_program() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_program("transpose([[1,2]])")
            .then_verdict(Verdict::mismatch("not what was asked"))
            .then_generation_error(OracleError::parse("reply is not JSON")),
    );

    let result = pipeline(&oracle).with_max_retries(1).run("show [[1,2]]").await;

    match result {
        PipelineResult::NeedsRephrasing {
            last_dsl,
            error_reason,
            ..
        } => {
            assert_eq!(last_dsl.as_deref(), Some("transpose([[1,2]])"));
            assert!(error_reason.contains("reply is not JSON"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn slow_generation_times_out_and_retries() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_after(
                Duration::from_secs(120),
                Generation::program("[[1]]", "latex matrix", "late"),
            )
            .then_generate_program("[[2]]"),
    );

    let run = pipeline(&oracle)
        .with_request_timeout(Duration::from_secs(5))
        .run_traced("show [[2]]")
        .await;

    match &run.result {
        PipelineResult::Success { dsl, .. } => assert_eq!(dsl, "[[2]]"),
        other => panic!("unexpected result: {other:?}"),
    }
    let failure = run.attempts[0].failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Generating);
    assert!(failure.message.contains("timeout"));
}

#[tokio::test]
async fn altered_numerals_are_rejected() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_program("[[0.66667]]")
            .then_generate_program("[[0.66667]]")
            .then_style("\\begin{table}$\\begin{bmatrix} 0.67 \\end{bmatrix}$\\end{table}")
            .then_style("\\begin{table}$\\begin{bmatrix} 0.66667 \\end{bmatrix}$\\end{table}"),
    );

    let run = pipeline(&oracle).run_traced("show [[0.66667]] as a table").await;

    assert!(run.result.is_success());
    assert_eq!(
        run.attempts[0].failure.as_ref().unwrap().class,
        FailureClass::StylingFailure
    );
    assert_eq!(oracle.styling_calls(), 2);
}

#[tokio::test]
async fn styling_error_is_retried() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .then_generate_program("[[1]]")
            .then_generate_program("[[1]]")
            .then_styling_error(OracleError::transport("styling backend down")),
    );

    let run = pipeline(&oracle).run_traced("show [[1]]").await;

    assert!(run.result.is_success());
    assert!(oracle.generation_prompts()[1].contains("styling backend down"));
}

#[tokio::test]
async fn run_serializes_with_status_tag() {
    let oracle = Arc::new(ScriptedOracle::new().then_generate_program("[[1]]"));

    let run = pipeline(&oracle).run_traced("show [[1]]").await;
    let yaml = serde_yaml::to_string(&run).unwrap();

    assert!(yaml.contains("status: SUCCESS"));
    assert!(yaml.contains(&run.run_id.to_string()));
}
