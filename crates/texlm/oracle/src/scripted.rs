//! Replay oracle for tests and offline runs
//!
//! Each role has a queue of scripted steps consumed in order. When a
//! queue runs dry, generation fails with a transport error, verification
//! answers "match" and styling returns the numeric core unchanged.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{OracleError, OracleResult};
use crate::oracle::{Generation, GenerationOracle, StylingOracle, Verdict, VerificationOracle};

#[derive(Debug)]
struct Step<T> {
    delay: Option<Duration>,
    reply: OracleResult<T>,
}

#[derive(Debug)]
struct Lane<T> {
    steps: Mutex<VecDeque<Step<T>>>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl<T> Default for Lane<T> {
    fn default() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T> Lane<T> {
    fn push(&self, delay: Option<Duration>, reply: OracleResult<T>) {
        lock(&self.steps).push_back(Step { delay, reply });
    }

    async fn next(&self, input: String) -> Option<OracleResult<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.inputs).push(input);
        let step = lock(&self.steps).pop_front()?;
        if let Some(delay) = step.delay {
            tokio::time::sleep(delay).await;
        }
        Some(step.reply)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn inputs(&self) -> Vec<String> {
        lock(&self.inputs).clone()
    }
}

/// Implements all three oracle traits from queued replies
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    generation: Lane<Generation>,
    verification: Lane<Verdict>,
    styling: Lane<String>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Generation ──────────────────────────────────────────────────

    pub fn then_generate(self, generation: Generation) -> Self {
        self.generation.push(None, Ok(generation));
        self
    }

    pub fn then_generate_program(self, dsl: &str) -> Self {
        self.then_generate(Generation::program(dsl, "latex matrix", "scripted"))
    }

    pub fn then_refuse(self, rationale: &str) -> Self {
        self.then_generate(Generation::refusal(rationale))
    }

    pub fn then_generation_error(self, error: OracleError) -> Self {
        self.generation.push(None, Err(error));
        self
    }

    pub fn then_generate_after(self, delay: Duration, generation: Generation) -> Self {
        self.generation.push(Some(delay), Ok(generation));
        self
    }

    // ── Verification ────────────────────────────────────────────────

    pub fn then_verdict(self, verdict: Verdict) -> Self {
        self.verification.push(None, Ok(verdict));
        self
    }

    pub fn then_verification_error(self, error: OracleError) -> Self {
        self.verification.push(None, Err(error));
        self
    }

    // ── Styling ─────────────────────────────────────────────────────

    pub fn then_style(self, markup: impl Into<String>) -> Self {
        self.styling.push(None, Ok(markup.into()));
        self
    }

    pub fn then_styling_error(self, error: OracleError) -> Self {
        self.styling.push(None, Err(error));
        self
    }

    // ── Inspection ──────────────────────────────────────────────────

    pub fn generation_calls(&self) -> usize {
        self.generation.calls()
    }

    pub fn verification_calls(&self) -> usize {
        self.verification.calls()
    }

    pub fn styling_calls(&self) -> usize {
        self.styling.calls()
    }

    /// Prompts passed to `generate`, in call order
    pub fn generation_prompts(&self) -> Vec<String> {
        self.generation.inputs()
    }

    /// `user_text` arguments passed to `verify`, in call order
    pub fn verification_texts(&self) -> Vec<String> {
        self.verification.inputs()
    }

    /// Numeric cores passed to `style`, in call order
    pub fn styling_inputs(&self) -> Vec<String> {
        self.styling.inputs()
    }
}

#[async_trait]
impl GenerationOracle for ScriptedOracle {
    async fn generate(&self, prompt: &str) -> OracleResult<Generation> {
        self.generation
            .next(prompt.to_string())
            .await
            .unwrap_or_else(|| Err(OracleError::transport("generation script exhausted")))
    }
}

#[async_trait]
impl VerificationOracle for ScriptedOracle {
    async fn verify(&self, user_text: &str, _dsl: &str) -> OracleResult<Verdict> {
        self.verification
            .next(user_text.to_string())
            .await
            .unwrap_or_else(|| Ok(Verdict::matched("scripted match")))
    }
}

#[async_trait]
impl StylingOracle for ScriptedOracle {
    async fn style(&self, _formatting_intent: &str, numeric_core: &str) -> OracleResult<String> {
        self.styling
            .next(numeric_core.to_string())
            .await
            .unwrap_or_else(|| Ok(numeric_core.to_string()))
    }
}
