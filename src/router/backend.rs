//! Upstream text-generation backends.
//!
//! [`HttpBackend`] speaks the Anthropic Messages API or any OpenAI-compatible
//! chat-completions endpoint. Sessions are client-side for both: the
//! "assistant" is the resolved model and the "thread" a locally minted id.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;
use crate::settings::{LlmProvider, LlmProviderConfig, ModelTier};

use super::session::ModelSession;

const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// 401/403: bad or missing credentials.
    Unauthorized(String),
    /// 429 or an exhausted quota.
    RateLimited(String),
    /// The upstream no longer knows the session's assistant or thread.
    SessionExpired(String),
    /// Connection, timeout or body decode failure.
    Transport(String),
    Status { code: u16, body: String },
}

impl BackendError {
    /// Auth and quota failures abort the call without retrying.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BackendError::Unauthorized(_) | BackendError::RateLimited(_))
    }

    pub fn from_status(code: u16, body: String) -> Self {
        match code {
            401 | 403 => BackendError::Unauthorized(body),
            402 | 429 => BackendError::RateLimited(body),
            _ => BackendError::Status { code, body },
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unauthorized(m) => write!(f, "unauthorized: {m}"),
            BackendError::RateLimited(m) => write!(f, "rate limited: {m}"),
            BackendError::SessionExpired(m) => write!(f, "session expired: {m}"),
            BackendError::Transport(m) => write!(f, "transport error: {m}"),
            BackendError::Status { code, body } => write!(f, "HTTP {code}: {body}"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Unauthorized(message) => AppError::Unauthorized { message },
            BackendError::RateLimited(message) => AppError::RateLimited { message },
            other => AppError::ApiError {
                message: other.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Transport(e.to_string())
    }
}

/// Upstream handles for a freshly created session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandles {
    pub assistant_handle: String,
    pub thread_handle: String,
}

/// Seam between the router and whatever produces model text.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Create an assistant and thread bound to `system_prompt`.
    async fn create_session(
        &self,
        tier: ModelTier,
        system_prompt: &str,
    ) -> Result<SessionHandles, BackendError>;

    /// Send one user utterance on `session`, returning the raw reply text.
    async fn send(&self, session: &ModelSession, utterance: &str) -> Result<String, BackendError>;
}

// ── HTTP backend ─────────────────────────────────────────────────

/// Resolved provider details ready for making an API call.
struct ResolvedProvider {
    url: String,
    api_key: String,
    provider: LlmProvider,
}

impl ResolvedProvider {
    fn from_config(config: &LlmProviderConfig) -> Result<Self, AppError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Unauthorized {
                message: "No API key configured".to_string(),
            })?
            .to_string();

        let url = match config.provider {
            LlmProvider::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
            LlmProvider::OpenAiCompatible => {
                let base = config
                    .base_url
                    .as_deref()
                    .unwrap_or("https://api.openai.com/v1")
                    .trim_end_matches('/');
                format!("{base}/chat/completions")
            }
        };
        Ok(Self {
            url,
            api_key,
            provider: config.provider,
        })
    }
}

pub struct HttpBackend {
    client: reqwest::Client,
    config: LlmProviderConfig,
    provider: ResolvedProvider,
}

impl HttpBackend {
    /// Fails with `Unauthorized` when no API key is configured.
    pub fn new(config: LlmProviderConfig) -> Result<Self, AppError> {
        let provider = ResolvedProvider::from_config(&config)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::ApiError {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            config,
            provider,
        })
    }

    fn build_request(&self, session: &ModelSession, utterance: &str) -> reqwest::RequestBuilder {
        let p = &self.provider;
        match p.provider {
            LlmProvider::Anthropic => {
                let body = serde_json::json!({
                    "model": session.assistant_handle,
                    "max_tokens": MAX_TOKENS,
                    "system": session.system_prompt,
                    "messages": [{ "role": "user", "content": utterance }],
                    "metadata": { "user_id": session.thread_handle },
                });
                self.client
                    .post(&p.url)
                    .header("x-api-key", &p.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .header("content-type", "application/json")
                    .json(&body)
            }
            LlmProvider::OpenAiCompatible => {
                let body = serde_json::json!({
                    "model": session.assistant_handle,
                    "max_tokens": MAX_TOKENS,
                    "user": session.thread_handle,
                    "response_format": { "type": "json_object" },
                    "messages": [
                        { "role": "system", "content": session.system_prompt },
                        { "role": "user", "content": utterance },
                    ],
                });
                self.client
                    .post(&p.url)
                    .header("Authorization", format!("Bearer {}", p.api_key))
                    .header("content-type", "application/json")
                    .json(&body)
            }
        }
    }
}

#[async_trait]
impl ModelBackend for HttpBackend {
    async fn create_session(
        &self,
        tier: ModelTier,
        _system_prompt: &str,
    ) -> Result<SessionHandles, BackendError> {
        Ok(SessionHandles {
            assistant_handle: self.config.model_for(tier),
            thread_handle: uuid::Uuid::new_v4().to_string(),
        })
    }

    async fn send(&self, session: &ModelSession, utterance: &str) -> Result<String, BackendError> {
        let response = self.build_request(session, utterance).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status.as_u16(), body));
        }
        let json: Value = response.json().await?;
        extract_text(self.provider.provider, &json)
    }
}

/// Pull the reply text out of a provider response body.
pub fn extract_text(provider: LlmProvider, json: &Value) -> Result<String, BackendError> {
    match provider {
        LlmProvider::Anthropic => {
            let text: Vec<&str> = json
                .get("content")
                .and_then(Value::as_array)
                .map(|blocks| {
                    blocks
                        .iter()
                        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                        .filter_map(|b| b.get("text").and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();
            if text.is_empty() {
                return Err(BackendError::Transport(
                    "No text content in Anthropic response".to_string(),
                ));
            }
            Ok(text.join("\n"))
        }
        LlmProvider::OpenAiCompatible => json
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::Transport("No message in OpenAI response".to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(BackendError::from_status(401, String::new()).is_terminal());
        assert!(BackendError::from_status(403, String::new()).is_terminal());
        assert!(BackendError::from_status(429, String::new()).is_terminal());
        assert!(!BackendError::from_status(500, String::new()).is_terminal());
        assert!(!BackendError::Transport("reset".into()).is_terminal());
        assert!(!BackendError::SessionExpired("gone".into()).is_terminal());
    }

    #[test]
    fn test_terminal_errors_map_to_terminal_app_errors() {
        let e: AppError = BackendError::RateLimited("slow down".into()).into();
        assert!(e.is_terminal());
        let e: AppError = BackendError::Status { code: 502, body: "bad gateway".into() }.into();
        assert!(!e.is_terminal());
        assert!(e.to_string().contains("502"));
    }

    #[test]
    fn test_extract_anthropic_text() {
        let body = json!({"content": [
            {"type": "text", "text": "{\"actions\": []}"},
            {"type": "tool_use", "id": "x"}
        ]});
        assert_eq!(
            extract_text(LlmProvider::Anthropic, &body).unwrap(),
            "{\"actions\": []}"
        );
        assert!(extract_text(LlmProvider::Anthropic, &json!({"content": []})).is_err());
    }

    #[test]
    fn test_extract_openai_text() {
        let body = json!({"choices": [{"message": {"content": "hi"}}]});
        assert_eq!(extract_text(LlmProvider::OpenAiCompatible, &body).unwrap(), "hi");
        assert!(extract_text(LlmProvider::OpenAiCompatible, &json!({})).is_err());
    }

    #[test]
    fn test_http_backend_requires_key() {
        let err = HttpBackend::new(LlmProviderConfig::default()).err().unwrap();
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn test_http_backend_sessions_are_local() {
        let config = LlmProviderConfig {
            api_key: Some("k".into()),
            ..LlmProviderConfig::default()
        };
        let backend = HttpBackend::new(config).unwrap();
        let a = backend.create_session(ModelTier::Fast, "prompt").await.unwrap();
        let b = backend.create_session(ModelTier::Fast, "prompt").await.unwrap();
        assert_eq!(a.assistant_handle, "claude-3-5-haiku-latest");
        assert_ne!(a.thread_handle, b.thread_handle);
    }
}
