//! Error types shared across the pipeline

use crate::llm::LlmError;
use crate::orchestrator::state::PipelineState;
use crate::source::ScanError;
use serde::Serialize;
use serde_json::Value;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failure of a single pipeline stage
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Agent invocation failed: {0}")]
    Llm(#[from] LlmError),
}

/// A run that ended in the failed state
#[derive(Debug, thiserror::Error)]
#[error("Pipeline failed while {state}: {source}")]
pub struct PipelineError {
    /// State the pipeline was in when the failure happened
    pub state: PipelineState,
    #[source]
    pub source: StageError,
    /// Raw material gathered before the failure, for diagnosis
    pub partial_output: Option<Value>,
}

impl PipelineError {
    pub fn new(state: PipelineState, source: impl Into<StageError>) -> Self {
        Self {
            state,
            source: source.into(),
            partial_output: None,
        }
    }

    pub fn with_partial(mut self, partial: Value) -> Self {
        self.partial_output = Some(partial);
        self
    }

    /// User-facing failure record
    pub fn report(&self) -> FailureReport {
        FailureReport {
            success: false,
            state: self.state,
            error: self.to_string(),
            partial_output: self.partial_output.clone(),
        }
    }
}

/// Serializable counterpart of a successful assessment
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub success: bool,
    pub state: PipelineState,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_output: Option<Value>,
}
