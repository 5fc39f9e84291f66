//! Role-bound agents
//!
//! [`Agent`] binds a role (instruction, model, sampling parameters) to the
//! text-completion collaborator and measures every call. The specialized
//! agents in the submodules build prompts, call their [`Agent`], and decode
//! the answer into typed records.

pub mod analyzer;
pub mod code;
pub mod creator;
pub mod dependency;
pub mod issue;
pub mod pr;
pub mod scanner;
pub mod validator;

pub use analyzer::Analyzer;
pub use code::CodeAnalyzer;
pub use creator::ProblemCreator;
pub use dependency::DependencyAnalyzer;
pub use issue::IssueAnalyzer;
pub use pr::PrAnalyzer;
pub use scanner::ScannerAgent;
pub use validator::QaValidator;

use crate::a2a::{Draft, MessageType, NotificationBus};
use crate::config::AgentSettings;
use crate::error::ConfigError;
use crate::llm::{CompletionRequest, LlmError, TextCompletion};
use crate::metrics::METRICS;
use crate::transcript::Transcript;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// The seven pipeline roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    Scanner,
    CodeAnalyzer,
    PrAnalyzer,
    IssueAnalyzer,
    DependencyAnalyzer,
    ProblemCreator,
    QaValidator,
}

impl AgentRole {
    pub const ALL: [AgentRole; 7] = [
        AgentRole::Scanner,
        AgentRole::CodeAnalyzer,
        AgentRole::PrAnalyzer,
        AgentRole::IssueAnalyzer,
        AgentRole::DependencyAnalyzer,
        AgentRole::ProblemCreator,
        AgentRole::QaValidator,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AgentRole::Scanner => "scanner",
            AgentRole::CodeAnalyzer => "code_analyzer",
            AgentRole::PrAnalyzer => "pr_analyzer",
            AgentRole::IssueAnalyzer => "issue_analyzer",
            AgentRole::DependencyAnalyzer => "dependency_analyzer",
            AgentRole::ProblemCreator => "problem_creator",
            AgentRole::QaValidator => "qa_validator",
        }
    }

    /// Sender type used on the notification bus
    pub fn kind(self) -> &'static str {
        match self {
            AgentRole::Scanner => "scanner",
            AgentRole::ProblemCreator => "creator",
            AgentRole::QaValidator => "validator",
            _ => "analyzer",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            AgentRole::Scanner => scanner::INSTRUCTION,
            AgentRole::CodeAnalyzer => code::INSTRUCTION,
            AgentRole::PrAnalyzer => pr::INSTRUCTION,
            AgentRole::IssueAnalyzer => issue::INSTRUCTION,
            AgentRole::DependencyAnalyzer => dependency::INSTRUCTION,
            AgentRole::ProblemCreator => creator::INSTRUCTION,
            AgentRole::QaValidator => validator::INSTRUCTION,
        }
    }

    pub fn default_settings(self) -> AgentSettings {
        let (model, temperature, max_output_tokens) = match self {
            AgentRole::Scanner => ("gemini-2.5-flash", 0.1, 2048),
            AgentRole::CodeAnalyzer => ("gemini-2.5-pro", 0.3, 4096),
            AgentRole::PrAnalyzer => ("gemini-2.5-flash", 0.4, 4096),
            AgentRole::IssueAnalyzer => ("gemini-2.5-flash", 0.4, 4096),
            AgentRole::DependencyAnalyzer => ("gemini-2.5-flash", 0.3, 4096),
            AgentRole::ProblemCreator => ("gemini-2.5-flash", 0.7, 8192),
            AgentRole::QaValidator => ("gemini-2.5-flash", 0.3, 8192),
        };
        AgentSettings {
            model: model.to_string(),
            temperature,
            max_output_tokens,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collaborators shared by every agent of a pipeline
#[derive(Clone)]
pub struct AgentContext {
    pub llm: Arc<dyn TextCompletion>,
    pub bus: Arc<NotificationBus>,
    pub transcript: Arc<Transcript>,
    /// Bound on a single completion call
    pub call_timeout: Duration,
}

impl AgentContext {
    pub fn new(llm: Arc<dyn TextCompletion>, call_timeout: Duration) -> Self {
        Self {
            llm,
            bus: Arc::new(NotificationBus::new()),
            transcript: Arc::new(Transcript::disabled()),
            call_timeout,
        }
    }

    pub fn with_bus(mut self, bus: Arc<NotificationBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_transcript(mut self, transcript: Arc<Transcript>) -> Self {
        self.transcript = transcript;
        self
    }
}

/// Per-call overrides for [`Agent::run`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions<'a> {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub conversation_id: Option<&'a str>,
}

impl<'a> RunOptions<'a> {
    pub fn conversation(conversation_id: Option<&'a str>) -> Self {
        Self {
            conversation_id,
            ..Default::default()
        }
    }
}

/// An instruction-bound completion caller
#[derive(Clone)]
pub struct Agent {
    role: AgentRole,
    settings: AgentSettings,
    instruction: String,
    ctx: AgentContext,
}

impl Agent {
    /// Build an agent; rejects temperatures outside [0, 1] and empty budgets
    pub fn new(role: AgentRole, settings: AgentSettings, ctx: AgentContext) -> Result<Self, ConfigError> {
        Self::with_instruction(role, role.instruction(), settings, ctx)
    }

    pub fn with_instruction(
        role: AgentRole,
        instruction: impl Into<String>,
        settings: AgentSettings,
        ctx: AgentContext,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&settings.temperature) {
            return Err(ConfigError::Invalid(format!(
                "{}: temperature {} outside [0, 1]",
                role, settings.temperature
            )));
        }
        if settings.max_output_tokens == 0 {
            return Err(ConfigError::Invalid(format!(
                "{}: max_output_tokens must be positive",
                role
            )));
        }

        Ok(Self {
            role,
            settings,
            instruction: instruction.into(),
            ctx,
        })
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn name(&self) -> &'static str {
        self.role.name()
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Issue one completion call and return the raw text.
    ///
    /// Invocation failures and timeouts are returned unchanged; content is
    /// not inspected here.
    pub async fn run(&self, prompt: &str, options: RunOptions<'_>) -> Result<String, LlmError> {
        let temperature = options.temperature.unwrap_or(self.settings.temperature);
        let max_tokens = options
            .max_output_tokens
            .unwrap_or(self.settings.max_output_tokens);

        let request = CompletionRequest {
            agent: self.name(),
            model: &self.settings.model,
            system_instruction: &self.instruction,
            prompt,
            temperature,
            max_tokens,
        };

        debug!("{}: prompt is {} chars", self.name(), prompt.chars().count());
        let started = Instant::now();
        let result = match tokio::time::timeout(self.ctx.call_timeout, self.ctx.llm.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.ctx.call_timeout)),
        };
        let elapsed = started.elapsed();
        METRICS.record_agent_call(self.name(), result.is_ok(), elapsed);

        match &result {
            Ok(text) => {
                info!(
                    "{}: completed in {:.2}s ({} chars)",
                    self.name(),
                    elapsed.as_secs_f64(),
                    text.len()
                );
                self.ctx.transcript.record(self.name(), prompt, text, elapsed);
                self.notify(
                    options.conversation_id,
                    "orchestrator",
                    MessageType::Notification,
                    json!({
                        "status": "completed",
                        "agent": self.name(),
                        "duration_seconds": elapsed.as_secs_f64(),
                    }),
                );
            }
            Err(e) => warn!("{}: call failed after {:.2}s: {}", self.name(), elapsed.as_secs_f64(), e),
        }

        result
    }

    /// Publish a notice when a conversation id is present
    pub fn notify(
        &self,
        conversation_id: Option<&str>,
        recipient: &str,
        kind: MessageType,
        payload: Value,
    ) {
        if let Some(conversation_id) = conversation_id {
            self.ctx.bus.publish(
                Draft::new(conversation_id, self.name(), self.role.kind())
                    .to(recipient)
                    .kind(kind)
                    .payload(payload),
            );
        }
    }
}

/// Left-anchored prefix of at most `max_chars` characters
pub fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Pretty JSON of `value`, clipped to `max_chars`
pub(crate) fn clipped_json<T: serde::Serialize + ?Sized>(value: &T, max_chars: usize) -> String {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_default();
    clip(&rendered, max_chars).to_string()
}
