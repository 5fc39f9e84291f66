//! Configuration for the assessment pipeline

use crate::agents::AgentRole;
use crate::error::ConfigError;
use crate::schemas::{Difficulty, ProblemType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of structured environment overrides, e.g.
/// `ACTUALCODE__PIPELINE__QUALITY_THRESHOLD=90`
pub const ENV_PREFIX: &str = "ACTUALCODE";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub agents: AgentsConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Layer defaults, an optional file and `ACTUALCODE__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        let config = config.from_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply the flat shortcut variables
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("ACTUALCODE_API_URL") {
            self.llm.api_url = val;
        }

        if let Ok(val) = std::env::var("ACTUALCODE_MODEL") {
            self.agents.model = Some(val);
        }

        if let Ok(val) = std::env::var("ACTUALCODE_QUALITY_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                self.pipeline.quality_threshold = threshold;
            }
        }

        if let Ok(val) = std::env::var("ACTUALCODE_OUTPUT_DIR") {
            self.pipeline.output_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("ACTUALCODE_LOG_JSON") {
            self.logging.json = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for role in AgentRole::ALL {
            let settings = self.agents.settings(role);
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
            if settings.model.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{}: model is empty", role)));
            }
        }

        if self.pipeline.quality_threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "quality_threshold {} exceeds 100",
                self.pipeline.quality_threshold
            )));
        }
        if self.pipeline.max_items == 0 {
            return Err(ConfigError::Invalid("max_items must be positive".into()));
        }
        if self.pipeline.call_timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".into()));
        }
        Ok(())
    }
}

/// Text-completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// OpenAI-compatible chat completions URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key environment variable
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_breaker_failures")]
    pub circuit_breaker_failures: usize,

    #[serde(default = "default_breaker_reset")]
    pub circuit_breaker_reset_secs: u64,
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_breaker_failures() -> usize {
    5
}

fn default_breaker_reset() -> u64 {
    30
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_llm_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            circuit_breaker_failures: default_breaker_failures(),
            circuit_breaker_reset_secs: default_breaker_reset(),
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn breaker_reset_timeout(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_reset_secs)
    }
}

/// Resolved model parameters of one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Partial per-agent override
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOverride {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Model used by every agent without its own override
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub scanner: AgentOverride,
    #[serde(default)]
    pub code_analyzer: AgentOverride,
    #[serde(default)]
    pub pr_analyzer: AgentOverride,
    #[serde(default)]
    pub issue_analyzer: AgentOverride,
    #[serde(default)]
    pub dependency_analyzer: AgentOverride,
    #[serde(default)]
    pub problem_creator: AgentOverride,
    #[serde(default)]
    pub qa_validator: AgentOverride,
}

impl AgentsConfig {
    fn override_for(&self, role: AgentRole) -> &AgentOverride {
        match role {
            AgentRole::Scanner => &self.scanner,
            AgentRole::CodeAnalyzer => &self.code_analyzer,
            AgentRole::PrAnalyzer => &self.pr_analyzer,
            AgentRole::IssueAnalyzer => &self.issue_analyzer,
            AgentRole::DependencyAnalyzer => &self.dependency_analyzer,
            AgentRole::ProblemCreator => &self.problem_creator,
            AgentRole::QaValidator => &self.qa_validator,
        }
    }

    /// Built-in defaults for `role`, overlaid with configured values
    pub fn settings(&self, role: AgentRole) -> AgentSettings {
        let mut settings = role.default_settings();
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }

        let overrides = self.override_for(role);
        if let Some(model) = &overrides.model {
            settings.model = model.clone();
        }
        if let Some(temperature) = overrides.temperature {
            settings.temperature = temperature;
        }
        if let Some(tokens) = overrides.max_output_tokens {
            settings.max_output_tokens = tokens;
        }
        settings
    }
}

/// Orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum overall score for approval
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: u32,

    /// Cap on every list in the repository dataset
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    #[serde(default)]
    pub default_difficulty: Difficulty,

    #[serde(default)]
    pub default_problem_type: ProblemType,

    #[serde(default = "default_time_limit")]
    pub default_time_limit_minutes: u32,

    /// Bound on a single text-completion call
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    #[serde(default = "default_want")]
    pub want_issues: bool,

    #[serde(default = "default_want")]
    pub want_prs: bool,

    #[serde(default = "default_want")]
    pub want_commits: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub save_transcript: bool,
}

fn default_quality_threshold() -> u32 {
    85
}

fn default_max_items() -> usize {
    20
}

fn default_max_suggestions() -> usize {
    10
}

fn default_time_limit() -> u32 {
    240
}

fn default_call_timeout() -> u64 {
    120
}

fn default_want() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quality_threshold: default_quality_threshold(),
            max_items: default_max_items(),
            max_suggestions: default_max_suggestions(),
            default_difficulty: Difficulty::default(),
            default_problem_type: ProblemType::default(),
            default_time_limit_minutes: default_time_limit(),
            call_timeout_secs: default_call_timeout(),
            want_issues: default_want(),
            want_prs: default_want(),
            want_commits: default_want(),
            output_dir: default_output_dir(),
            save_transcript: false,
        }
    }
}

impl PipelineConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
