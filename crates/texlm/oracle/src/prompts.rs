//! Prompt text for every oracle call

use texlm_dsl::GRAMMAR;

/// Presentation used when the request does not name one
pub const DEFAULT_FORMATTING_INTENT: &str = "latex matrix";

pub const GENERATION_SYSTEM_PROMPT: &str = "\
You translate requests about matrix computations into a program in a small \
expression language. A program is one matrix literal or one call to \
transpose(X), inverse(X), add(X, Y) or multiply(X, Y); calls nest. Write every \
matrix as a list of rows, e.g. [[1, 2], [3, 4]]. Copy numbers exactly as given.

Natural language reads inside out: \"the inverse of the transpose of A\" is \
inverse(transpose(A)).

Also extract how the user wants the result presented (\"latex table with \
width = 70%\", \"latex matrix\", ...). If they do not say, use \"latex matrix\".

If the request is not a matrix computation the language can express, or the \
matrices are missing, return an empty dsl and say why in the rationale.

Reply with one JSON object and nothing else:
{\"rationale\": \"<one or two sentences>\", \"formatting_intent\": \"<presentation>\", \"dsl\": \"<program or empty>\"}";

pub const GENERATION_FEW_SHOT: &str = "\
Examples:
Request: transpose the matrix [[1,2],[3,4]]
{\"rationale\": \"Single transpose.\", \"formatting_intent\": \"latex matrix\", \"dsl\": \"transpose([[1, 2], [3, 4]])\"}

Request: give me a latex table of the inverse of the sum of [[1,2],[3,4]] and [[5,6],[7,8]]
{\"rationale\": \"Add the two matrices, then invert.\", \"formatting_intent\": \"latex table\", \"dsl\": \"inverse(add([[1, 2], [3, 4]], [[5, 6], [7, 8]]))\"}

Request: multiply A=[[1,0],[2,3]] by B=[[4],[5]] and transpose the result
{\"rationale\": \"Multiply A by B, then transpose.\", \"formatting_intent\": \"latex matrix\", \"dsl\": \"transpose(multiply([[1, 0], [2, 3]], [[4], [5]]))\"}

Request: what's the weather like
{\"rationale\": \"Not a matrix computation.\", \"formatting_intent\": \"latex matrix\", \"dsl\": \"\"}";

pub const VERIFICATION_SYSTEM_PROMPT: &str = "\
You check whether a program in a small matrix expression language computes \
exactly what a user asked for. The language has transpose(X), inverse(X), \
add(X, Y) and multiply(X, Y); calls apply inside out. Check the order of \
operations, the order of operands of multiply, and that every number was \
copied exactly. Ignore presentation requests (tables, widths, styles).

Reply in exactly this form:
EXPLANATION: <short reasoning>
MATCH: TRUE or MATCH: FALSE";

pub const STYLING_SYSTEM_PROMPT: &str = "\
You are a LaTeX formatter for Overleaf. You receive a matrix already written \
as LaTeX and a description of how it should be presented. Wrap or restyle the \
markup to match the description (table environments, captions, widths, \
alignment) but never change, round, reorder or drop any number. If no \
presentation is described, return the matrix unchanged. Output only LaTeX, \
no code fences, no surrounding $ ... $.";

/// Generator user prompt: few-shot block, grammar and the request
pub fn generation_prompt(request: &str) -> String {
    format!(
        "{}\n\nGrammar (Lark):\n{}\nRequest: {}",
        GENERATION_FEW_SHOT, GRAMMAR, request
    )
}

/// Request text for a later attempt, naming the rejected program and why
pub fn feedback_prompt(user_text: &str, rejected_dsl: Option<&str>, reason: &str) -> String {
    let program = match rejected_dsl {
        Some(dsl) if !dsl.trim().is_empty() => dsl,
        _ => "(no program)",
    };
    format!(
        "{}\n\nA previous attempt was rejected.\nRejected program: {}\nReason: {}\n\
         Produce a corrected program for the original request.",
        user_text, program, reason
    )
}

pub fn verification_prompt(user_text: &str, dsl: &str) -> String {
    format!("User request:\n{}\n\nProgram:\n{}", user_text, dsl)
}

pub fn styling_prompt(formatting_intent: &str, numeric_core: &str) -> String {
    let intent = if formatting_intent.trim().is_empty() {
        DEFAULT_FORMATTING_INTENT
    } else {
        formatting_intent
    };
    format!("Presentation: {}\n\nMatrix:\n{}", intent, numeric_core)
}
