//! OpenAI-compatible chat completions client
//!
//! Talks to any endpoint that speaks the OpenAI Chat Completions wire format
//! (Groq by default). Failures are returned to the caller as-is; nothing here
//! retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, StopReason, TokenUsage};
use crate::config::ResolvedLlmConfig;

/// Default wait suggested by a 429 without a usable `retry-after` header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Slack added to the configured timeout for the HTTP client
///
/// The planner enforces the configured timeout; the HTTP client only catches
/// connections that outlive the planner task.
const HTTP_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// HTTP client timeout for a configured request timeout
fn http_timeout(request_timeout: Duration) -> Duration {
    request_timeout + HTTP_TIMEOUT_GRACE
}

/// OpenAI-compatible API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    http: Client,
}

impl OpenAIClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        let http = Client::builder()
            .timeout(http_timeout(config.timeout))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Build the request body for the chat completions API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];
        messages.extend(request.messages.iter().map(convert_message));

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": request.max_tokens.min(self.max_tokens),
        })
    }

    /// Parse the chat completions response
    fn parse_response(&self, api_response: OpenAIResponse) -> CompletionResponse {
        debug!(choice_count = api_response.choices.len(), "parse_response: called");
        let (content, stop_reason) = match api_response.choices.into_iter().next() {
            Some(c) => (c.message.content, StopReason::from_openai(c.finish_reason.as_deref())),
            None => (None, StopReason::EndTurn),
        };

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        CompletionResponse {
            content,
            stop_reason,
            usage,
        }
    }
}

fn convert_message(msg: &Message) -> serde_json::Value {
    serde_json::json!({
        "role": msg.role.as_openai(),
        "content": msg.content,
    })
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("complete: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "complete: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let text = response.text().await?;
        let api_response: OpenAIResponse = serde_json::from_str(&text)?;
        let parsed = self.parse_response(api_response);
        info!(
            model = %self.model,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "complete: success"
        );
        Ok(parsed)
    }
}

// Chat completions response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: &str) -> OpenAIClient {
        let config = LlmConfig {
            base_url: base_url.to_string(),
            max_tokens: 1024,
            timeout_ms: 5_000,
            ..Default::default()
        };
        OpenAIClient::from_config(&config.resolve_with_key("test-key")).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system_prompt: "You are helpful".to_string(),
            messages: vec![Message::human("Hello")],
            max_tokens: 4096,
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = client_for("https://api.groq.com/openai");
        let body = client.build_request_body(&request());

        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are helpful");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_http_timeout_outlasts_request_timeout() {
        for ms in [1, 5_000, 30_000] {
            let request_timeout = Duration::from_millis(ms);
            assert!(http_timeout(request_timeout) > request_timeout);
        }
    }

    #[test]
    fn test_max_tokens_capped() {
        let client = client_for("https://api.groq.com/openai");
        let body = client.build_request_body(&request());
        assert_eq!(body["max_tokens"], 1024);
    }

    #[tokio::test]
    async fn test_complete_returns_raw_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "model": "llama-3.3-70b-versatile",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "  * Morning: Louvre\n" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 40, "completion_tokens": 12, "total_tokens": 52 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server.uri()).complete(request()).await.unwrap();

        assert_eq!(response.content.as_deref(), Some("  * Morning: Louvre\n"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total(), 52);
    }

    #[tokio::test]
    async fn test_complete_api_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).complete(request()).await.unwrap_err();
        match err {
            LlmError::ApiError { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_complete_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).complete(request()).await.unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_complete_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Json(_)));
    }
}
