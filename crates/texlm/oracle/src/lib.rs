//! Oracle adapters for TexLM
//!
//! Three external collaborators sit at the edge of the pipeline:
//!
//! - a **generation** oracle turning a request into a candidate program,
//! - a **verification** oracle judging a program against the request,
//! - a **styling** oracle wrapping the numeric core in presentation markup.
//!
//! [`ChatOracle`] serves all three from an OpenAI-compatible chat API.
//! [`ScriptedOracle`] replays canned replies.

#![deny(unsafe_code)]

pub mod chat;
pub mod config;
pub mod error;
pub mod oracle;
pub mod prompts;
pub mod scripted;
pub mod transport;

pub use chat::{parse_generation, parse_verdict, strip_code_fences, ChatOracle};
pub use config::OracleConfig;
pub use error::{OracleError, OracleErrorKind, OracleResult};
pub use oracle::{Generation, GenerationOracle, StylingOracle, Verdict, VerificationOracle};
pub use scripted::ScriptedOracle;
pub use transport::{ChatMessage, ChatRequest, ChatRole, ChatTransport, HttpChatTransport};
