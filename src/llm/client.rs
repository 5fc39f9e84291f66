//! OpenAI-compatible chat completions client with retry and circuit breaker

use super::circuit_breaker::CircuitBreaker;
use super::{CompletionRequest, LlmError, TextCompletion};
use crate::config::LlmSettings;
use crate::metrics::METRICS;
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Production [`TextCompletion`] implementation
pub struct ChatCompletionsClient {
    http: Client,
    api_url: String,
    api_key: String,
    retry_attempts: u32,
    retry_backoff: Duration,
    breaker: CircuitBreaker,
}

impl ChatCompletionsClient {
    /// Build a client, reading the API key from `settings.api_key_env`
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(settings.api_key_env.clone()))?;
        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(settings: &LlmSettings, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        Ok(Self {
            http,
            api_url: settings.api_url.clone(),
            api_key: api_key.into(),
            retry_attempts: settings.retry_attempts,
            retry_backoff: settings.retry_backoff(),
            breaker: CircuitBreaker::new(
                settings.circuit_breaker_failures,
                settings.breaker_reset_timeout(),
            ),
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn call_once(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::RequestFailed(format!("timeout: {}", e))
                } else {
                    LlmError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyCompletion)?;
        if choice.finish_reason.as_deref() == Some("length") {
            warn!("{}: completion hit max_tokens={}", request.agent, request.max_tokens);
        }

        choice
            .message
            .content
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyCompletion)
    }

    /// Exponential backoff with up to 50% random jitter
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base = self.retry_backoff.saturating_mul(multiplier);
        let jitter_ms = base.as_millis() as u64 / 2;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

#[async_trait]
impl TextCompletion for ChatCompletionsClient {
    async fn generate(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        if self.breaker.is_open() {
            error!("Circuit breaker is open, rejecting {} call", request.agent);
            return Err(LlmError::CircuitOpen(self.api_url.clone()));
        }

        debug!(
            "{}: requesting completion from {} ({} prompt chars)",
            request.agent,
            request.model,
            request.prompt.len()
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.call_once(&request).await {
                Ok(text) => {
                    self.breaker.mark_success();
                    return Ok(text);
                }
                Err(e) => {
                    self.breaker.mark_failure();
                    if !e.is_retryable() || attempt > self.retry_attempts {
                        error!("{}: completion failed after {} attempts: {}", request.agent, attempt, e);
                        return Err(e);
                    }

                    let backoff = self.calculate_backoff(attempt);
                    METRICS.llm_retries.inc();
                    warn!(
                        "{}: attempt {} failed: {}, retrying in {:?}",
                        request.agent, attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> LlmSettings {
        LlmSettings {
            api_url: url.to_string(),
            retry_attempts: 2,
            retry_backoff_ms: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_backoff_grows() {
        let client = ChatCompletionsClient::with_api_key(
            &LlmSettings {
                retry_backoff_ms: 100,
                ..Default::default()
            },
            "key",
        )
        .unwrap();

        let first = client.calculate_backoff(1);
        let third = client.calculate_backoff(3);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(600));
    }

    #[test]
    fn test_missing_api_key() {
        let settings = LlmSettings {
            api_key_env: "ACTUALCODE_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        assert!(matches!(
            ChatCompletionsClient::new(&settings),
            Err(LlmError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![
                ChatMessage { role: "system", content: "be strict" },
                ChatMessage { role: "user", content: "hi" },
            ],
            max_tokens: 10,
            temperature: 0.5,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 10);
    }

    #[tokio::test]
    async fn test_breaker_rejects_when_open() {
        let client = ChatCompletionsClient::with_api_key(&settings("http://127.0.0.1:9"), "k").unwrap();
        for _ in 0..5 {
            client.breaker().mark_failure();
        }
        let request = CompletionRequest {
            agent: "test",
            model: "m",
            system_instruction: "",
            prompt: "p",
            temperature: 0.0,
            max_tokens: 1,
        };
        assert!(matches!(client.generate(request).await, Err(LlmError::CircuitOpen(_))));
    }
}
