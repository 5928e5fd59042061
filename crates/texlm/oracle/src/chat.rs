//! Oracle implementation over a chat-completion transport

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::OracleConfig;
use crate::error::{OracleError, OracleResult};
use crate::oracle::{Generation, GenerationOracle, StylingOracle, Verdict, VerificationOracle};
use crate::prompts;
use crate::transport::{ChatMessage, ChatRequest, ChatTransport, HttpChatTransport};

/// One chat model per role, sharing a transport
#[derive(Clone)]
pub struct ChatOracle {
    config: OracleConfig,
    transport: Arc<dyn ChatTransport>,
}

impl std::fmt::Debug for ChatOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOracle")
            .field("config", &self.config)
            .finish()
    }
}

impl ChatOracle {
    pub fn with_transport(config: OracleConfig, transport: Arc<dyn ChatTransport>) -> Self {
        Self { config, transport }
    }

    /// HTTP-backed oracle. Fails when the API key is not set.
    pub fn from_config(config: OracleConfig) -> OracleResult<Self> {
        let transport = HttpChatTransport::from_config(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    async fn ask(
        &self,
        role: &'static str,
        model: &str,
        system: &str,
        user: String,
        json_object: bool,
    ) -> OracleResult<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.config.temperature,
            json_object,
        };

        let started = Instant::now();
        let result = self.transport.complete(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(reply) => tracing::debug!(
                role,
                model,
                elapsed_ms,
                reply_len = reply.len(),
                "oracle replied"
            ),
            Err(err) => tracing::warn!(role, model, elapsed_ms, error = %err, "oracle call failed"),
        }
        result
    }
}

#[async_trait]
impl GenerationOracle for ChatOracle {
    async fn generate(&self, prompt: &str) -> OracleResult<Generation> {
        let raw = self
            .ask(
                "generation",
                &self.config.generation_model,
                prompts::GENERATION_SYSTEM_PROMPT,
                prompts::generation_prompt(prompt),
                true,
            )
            .await?;
        parse_generation(&raw)
    }
}

#[async_trait]
impl VerificationOracle for ChatOracle {
    async fn verify(&self, user_text: &str, dsl: &str) -> OracleResult<Verdict> {
        let raw = self
            .ask(
                "verification",
                &self.config.verification_model,
                prompts::VERIFICATION_SYSTEM_PROMPT,
                prompts::verification_prompt(user_text, dsl),
                false,
            )
            .await?;
        Ok(parse_verdict(&raw))
    }
}

#[async_trait]
impl StylingOracle for ChatOracle {
    async fn style(&self, formatting_intent: &str, numeric_core: &str) -> OracleResult<String> {
        let raw = self
            .ask(
                "styling",
                &self.config.styling_model,
                prompts::STYLING_SYSTEM_PROMPT,
                prompts::styling_prompt(formatting_intent, numeric_core),
                false,
            )
            .await?;

        let markup = strip_code_fences(&raw);
        if markup.is_empty() {
            return Err(OracleError::parse("styling reply is empty"));
        }
        Ok(markup.to_string())
    }
}

// ── Reply parsing ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerationEnvelope {
    #[serde(default)]
    rationale: String,
    #[serde(default, alias = "formatting")]
    formatting_intent: String,
    #[serde(default, alias = "dsl_candidate", alias = "program")]
    dsl: Option<String>,
}

impl From<GenerationEnvelope> for Generation {
    fn from(envelope: GenerationEnvelope) -> Self {
        let formatting_intent = if envelope.formatting_intent.trim().is_empty() {
            prompts::DEFAULT_FORMATTING_INTENT.to_string()
        } else {
            envelope.formatting_intent.trim().to_string()
        };
        let dsl_candidate = envelope
            .dsl
            .map(|dsl| strip_code_fences(&dsl).to_string())
            .filter(|dsl| !dsl.is_empty());

        Generation {
            rationale: envelope.rationale.trim().to_string(),
            formatting_intent,
            dsl_candidate,
        }
    }
}

/// Read a generation reply.
///
/// Strict JSON first, then the first balanced object inside the reply,
/// then a bare program (a reply that starts like a call or a literal).
pub fn parse_generation(raw: &str) -> OracleResult<Generation> {
    let trimmed = strip_code_fences(raw);

    if let Ok(envelope) = serde_json::from_str::<GenerationEnvelope>(trimmed) {
        return Ok(envelope.into());
    }

    if let Some(candidate) = extract_first_json_object(trimmed) {
        if let Ok(envelope) = serde_json::from_str::<GenerationEnvelope>(candidate) {
            return Ok(envelope.into());
        }
    }

    if looks_like_program(trimmed) {
        return Ok(Generation {
            rationale: String::new(),
            formatting_intent: prompts::DEFAULT_FORMATTING_INTENT.to_string(),
            dsl_candidate: Some(trimmed.to_string()),
        });
    }

    Err(OracleError::parse(format!(
        "generation reply is not a JSON object: {}",
        preview(raw)
    )))
}

/// Read a verification reply of the form `EXPLANATION: ... MATCH: TRUE|FALSE`.
///
/// Markers are case-insensitive and must start a word. The last marker of
/// each kind is used; anything without one reading `TRUE` is a mismatch.
pub fn parse_verdict(raw: &str) -> Verdict {
    // ASCII uppercasing keeps byte offsets valid for `raw`.
    let upper = raw.to_ascii_uppercase();

    let is_match = marker_offsets(&upper, MATCH_MARKER)
        .last()
        .is_some_and(|at| starts_with_word(upper[at + MATCH_MARKER.len()..].trim_start(), "TRUE"));

    let explanation = match marker_offsets(&upper, EXPLANATION_MARKER).last() {
        Some(at) => {
            let from = at + EXPLANATION_MARKER.len();
            let to = marker_offsets(&upper, MATCH_MARKER)
                .find(|&m| m >= from)
                .unwrap_or(raw.len());
            raw[from..to].trim()
        }
        None => raw.trim(),
    };
    let explanation = if explanation.is_empty() {
        "no explanation given".to_string()
    } else {
        explanation.to_string()
    };

    Verdict {
        is_match,
        explanation,
    }
}

const MATCH_MARKER: &str = "MATCH:";
const EXPLANATION_MARKER: &str = "EXPLANATION:";

/// Offsets of `marker` in `text` that are not preceded by a word character
fn marker_offsets<'a>(text: &'a str, marker: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(marker)
        .map(|(at, _)| at)
        .filter(|&at| !text[..at].chars().next_back().is_some_and(is_word_char))
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .is_some_and(|rest| !rest.chars().next().is_some_and(is_word_char))
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Remove a surrounding Markdown code fence, if any
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```latex, ```json).
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// First `{...}` object, ignoring braces inside JSON strings
fn extract_first_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + idx + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn looks_like_program(text: &str) -> bool {
    if text.starts_with('[') {
        return true;
    }
    texlm_dsl::OPERATIONS
        .iter()
        .any(|(name, _)| text.strip_prefix(name).is_some_and(|rest| rest.trim_start().starts_with('(')))
}

fn preview(raw: &str) -> String {
    const LIMIT: usize = 120;
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
