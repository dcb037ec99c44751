//! OpenAI-compatible chat-completions oracle.
//!
//! Talks to any endpoint implementing the OpenAI `/chat/completions`
//! contract. Classification needs the `logprobs`/`top_logprobs` request
//! options, which the official API supports on chat models; extraction is
//! a plain two-message completion.
//!
//! Transport-level failures map onto the error taxonomy
//! (401/403 → [`DocPipeError::AuthFailed`], 429 →
//! [`DocPipeError::RateLimitExceeded`], other non-2xx →
//! [`DocPipeError::OracleApi`]) and are never retried here: the pipeline's
//! own retry loop is about malformed responses, and request-level backoff
//! is the caller's policy.

use crate::error::DocPipeError;
use crate::oracle::{Oracle, TextRequest, TextResponse, TokenCandidate, TokenRequest, TokenResponse, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Oracle backed by an OpenAI-compatible chat-completions API.
#[derive(Debug)]
pub struct OpenAiOracle {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiOracle {
    /// Create an oracle for the given model and API key.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("reqwest client with static configuration");

        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Create an oracle reading the key from `OPENAI_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Result<Self, DocPipeError> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self::new(model, key)),
            _ => Err(DocPipeError::OracleNotConfigured {
                hint: "Set OPENAI_API_KEY, or construct the pipeline with an explicit oracle."
                    .to_string(),
            }),
        }
    }

    /// Point at a different OpenAI-compatible endpoint
    /// (e.g. a local vLLM or a proxy).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client with static configuration");
        self
    }

    /// The model identifier requests are issued against.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post_chat(&self, body: &ChatRequest<'_>) -> Result<ChatResponse, DocPipeError> {
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| DocPipeError::OracleTransport {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(DocPipeError::RateLimitExceeded { retry_after_secs });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let detail = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(DocPipeError::AuthFailed { detail });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "no body".to_string());
            return Err(DocPipeError::OracleApi {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| DocPipeError::UnexpectedOracleResponse {
                detail: format!("response body did not match the chat-completions shape: {e}"),
            })
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn classify_token(&self, request: &TokenRequest) -> Result<TokenResponse, DocPipeError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: 1,
            temperature: 0.0,
            logprobs: Some(true),
            top_logprobs: Some(request.top_k),
        };

        let response = self.post_chat(&body).await?;
        let usage = response.usage_or_warn();

        // Drill down to the candidate list for the single generated
        // position. Any missing level means the endpoint does not support
        // logprobs for this model.
        let candidates = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.logprobs)
            .and_then(|l| l.content.into_iter().next())
            .map(|position| position.top_logprobs)
            .ok_or_else(|| DocPipeError::UnexpectedOracleResponse {
                detail: format!(
                    "no token candidates in response; does model '{}' support logprobs?",
                    self.model
                ),
            })?;

        debug!(count = candidates.len(), "received token candidates");

        Ok(TokenResponse {
            candidates: candidates
                .into_iter()
                .map(|c| TokenCandidate {
                    token: c.token,
                    logprob: c.logprob,
                })
                .collect(),
            usage,
        })
    }

    async fn complete(&self, request: &TextRequest) -> Result<TextResponse, DocPipeError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: 0.0,
            logprobs: None,
            top_logprobs: None,
        };

        let response = self.post_chat(&body).await?;
        let usage = response.usage_or_warn();

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .ok_or_else(|| DocPipeError::UnexpectedOracleResponse {
                detail: "no message content in response".to_string(),
            })?;

        Ok(TextResponse { text, usage })
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    logprobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_logprobs: Option<usize>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

impl ChatResponse {
    fn usage_or_warn(&self) -> Usage {
        match &self.usage {
            Some(u) => Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            },
            None => {
                warn!("provider omitted usage information; token accounting will undercount");
                Usage::default()
            }
        }
    }
}

#[derive(Deserialize)]
struct Choice {
    message: Option<WireMessage>,
    logprobs: Option<WireLogprobs>,
}

#[derive(Deserialize)]
struct WireMessage {
    content: String,
}

#[derive(Deserialize)]
struct WireLogprobs {
    #[serde(default)]
    content: Vec<WirePosition>,
}

#[derive(Deserialize)]
struct WirePosition {
    #[serde(default)]
    top_logprobs: Vec<WireCandidate>,
}

#[derive(Deserialize)]
struct WireCandidate {
    token: String,
    logprob: f64,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGPROB_BODY: &str = r#"{
        "choices": [{
            "message": {"content": "Invoice"},
            "logprobs": {
                "content": [{
                    "top_logprobs": [
                        {"token": "Invoice", "logprob": -0.01},
                        {"token": " Contract", "logprob": -4.2}
                    ]
                }]
            }
        }],
        "usage": {"prompt_tokens": 812, "completion_tokens": 1}
    }"#;

    #[test]
    fn deserializes_logprob_response() {
        let r: ChatResponse = serde_json::from_str(LOGPROB_BODY).unwrap();
        let candidates = r.choices[0].logprobs.as_ref().unwrap().content[0]
            .top_logprobs
            .as_slice();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].token, "Invoice");
        assert_eq!(r.usage.as_ref().unwrap().prompt_tokens, 812);
    }

    #[test]
    fn deserializes_plain_completion_without_logprobs() {
        let body = r#"{"choices": [{"message": {"content": "{\"summary\": \"hi\"}"}}]}"#;
        let r: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(r.choices[0].logprobs.is_none());
        assert_eq!(r.choices[0].message.as_ref().unwrap().content, "{\"summary\": \"hi\"}");
        // Missing usage downgrades to zeros rather than failing the call.
        assert_eq!(r.usage_or_warn(), Usage::default());
    }

    #[test]
    fn request_omits_logprob_fields_when_unset() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![],
            max_tokens: 1000,
            temperature: 0.0,
            logprobs: None,
            top_logprobs: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("logprobs"));
    }

    #[test]
    fn from_env_without_key_is_not_configured() {
        // Only meaningful when the variable is absent in the test
        // environment; skip silently otherwise.
        if std::env::var("OPENAI_API_KEY").is_err() {
            let err = OpenAiOracle::from_env("gpt-4o-mini").unwrap_err();
            assert!(matches!(err, DocPipeError::OracleNotConfigured { .. }));
        }
    }
}
