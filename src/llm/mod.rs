//! Text-completion collaborator
//!
//! Agents only see the [`TextCompletion`] trait. The production
//! implementation is [`ChatCompletionsClient`]; tests substitute scripted
//! stubs.

pub mod circuit_breaker;
pub mod client;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use client::ChatCompletionsClient;

use async_trait::async_trait;
use std::time::Duration;

/// Text-completion error types
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key not set: environment variable {0} is empty")]
    MissingApiKey(String),

    #[error("Circuit breaker is open: {0}")]
    CircuitOpen(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Upstream error: status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Completion contained no text")]
    EmptyCompletion,
}

impl LlmError {
    /// Transport failures, throttling and server errors are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RequestFailed(_) | LlmError::Timeout(_) => true,
            LlmError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// One text-completion call
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Calling agent, for logs and metrics
    pub agent: &'a str,
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Opaque `generate(prompt, options) -> text` capability
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn generate(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}
