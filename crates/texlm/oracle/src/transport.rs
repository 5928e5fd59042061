//! Chat-completion transport
//!
//! [`ChatTransport`] is the seam between oracle logic and the network.
//! [`HttpChatTransport`] speaks the OpenAI-compatible
//! `POST {base_url}/chat/completions` protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OracleConfig;
use crate::error::{OracleError, OracleErrorKind, OracleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Ask the service for a JSON object reply
    #[serde(default)]
    pub json_object: bool,
}

/// Sends one chat request and returns the assistant's text
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> OracleResult<String>;
}

pub struct HttpChatTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpChatTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChatTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpChatTransport {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> OracleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::invalid_config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from configuration, reading the key from the environment
    pub fn from_config(config: &OracleConfig) -> OracleResult<Self> {
        let api_key = config.api_key()?;
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn build_headers(&self) -> OracleResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| OracleError::invalid_config(format!("api key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn map_send_error(err: reqwest::Error) -> OracleError {
        if err.is_timeout() {
            OracleError::timeout(err.to_string())
        } else {
            OracleError::transport(err.to_string())
        }
    }
}

/// Request body for `/chat/completions`
pub fn build_payload(request: &ChatRequest) -> Value {
    let mut payload = serde_json::json!({
        "model": request.model,
        "messages": request.messages,
    });

    if let Some(temp) = request.temperature.and_then(serde_json::Number::from_f64) {
        payload["temperature"] = Value::Number(temp);
    }
    if request.json_object {
        payload["response_format"] = serde_json::json!({ "type": "json_object" });
    }

    payload
}

/// Text of the first choice
pub fn parse_completion(body: &Value) -> OracleResult<String> {
    body.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| OracleError::parse("completion has no choices[0].message.content"))
}

fn map_status(status: u16, body: &str) -> OracleError {
    let kind = match status {
        401 | 403 => OracleErrorKind::InvalidConfig,
        408 | 504 => OracleErrorKind::Timeout,
        _ => OracleErrorKind::Api,
    };
    OracleError::new(kind, format!("status {}: {}", status, body))
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn complete(&self, request: &ChatRequest) -> OracleResult<String> {
        let headers = self.build_headers()?;
        let payload = build_payload(request);

        tracing::debug!(model = %request.model, url = %self.url(), "sending chat completion");

        let response = self
            .client
            .post(self.url())
            .headers(headers)
            .json(&payload)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        let text = response.text().await.map_err(Self::map_send_error)?;

        if !status.is_success() {
            return Err(map_status(status.as_u16(), &text));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| OracleError::parse(format!("completion body: {}", e)))?;
        parse_completion(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            temperature: Some(0.0),
            json_object: true,
        };
        let payload = build_payload(&request);
        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "u");
        assert_eq!(payload["temperature"], 0.0);
        assert_eq!(payload["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_payload_omits_unset_options() {
        let request = ChatRequest {
            model: "gpt-5".into(),
            messages: vec![ChatMessage::user("u")],
            temperature: None,
            json_object: false,
        };
        let payload = build_payload(&request);
        assert!(payload.get("temperature").is_none());
        assert!(payload.get("response_format").is_none());
    }

    #[test]
    fn test_parse_completion() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "MATCH: TRUE"}}]
        });
        assert_eq!(parse_completion(&body).unwrap(), "MATCH: TRUE");

        let empty = serde_json::json!({"choices": []});
        assert_eq!(
            parse_completion(&empty).unwrap_err().kind,
            OracleErrorKind::Parse
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status(401, "").kind, OracleErrorKind::InvalidConfig);
        assert_eq!(map_status(504, "").kind, OracleErrorKind::Timeout);
        assert_eq!(map_status(500, "boom").kind, OracleErrorKind::Api);
    }
}
