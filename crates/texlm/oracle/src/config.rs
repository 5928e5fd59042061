//! Oracle endpoint configuration

use serde::{Deserialize, Serialize};

use crate::error::{OracleError, OracleResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-5";
pub const DEFAULT_VERIFICATION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_STYLING_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible chat completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    #[serde(default = "default_verification_model")]
    pub verification_model: String,

    #[serde(default = "default_styling_model")]
    pub styling_model: String,

    /// Upper bound on each oracle call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sampling temperature; omitted from requests when unset
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            generation_model: default_generation_model(),
            verification_model: default_verification_model(),
            styling_model: default_styling_model(),
            request_timeout_secs: default_request_timeout_secs(),
            temperature: None,
        }
    }
}

impl OracleConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> OracleResult<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(OracleError::invalid_config(format!(
                "missing {}",
                self.api_key_env
            ))),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_generation_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

fn default_verification_model() -> String {
    DEFAULT_VERIFICATION_MODEL.to_string()
}

fn default_styling_model() -> String {
    DEFAULT_STYLING_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
