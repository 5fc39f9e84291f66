//! Repository-grounded coding assessment generator
//!
//! A pipeline of language-model agents scans a repository, analyzes its
//! code, pull requests, issues and dependencies in parallel, then creates,
//! validates and refines a take-home coding problem.
//!
//! ```no_run
//! use actualcode::{AppConfig, ChatCompletionsClient, Orchestrator, RunRequest, SyntheticSource};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AppConfig::default();
//! let llm = Arc::new(ChatCompletionsClient::new(&config.llm)?);
//! let orchestrator = Orchestrator::from_config(&config, llm, Arc::new(SyntheticSource::new()))?;
//! let result = orchestrator.generate_assessment(RunRequest::new("octo/shop")).await?;
//! println!("{}", result.assessment.problem.record().title);
//! # Ok(())
//! # }
//! ```

pub mod a2a;
pub mod agents;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod persist;
pub mod schemas;
pub mod source;
pub mod transcript;

pub use a2a::{AgentMessage, MessageType, NotificationBus};
pub use config::AppConfig;
pub use error::{ConfigError, FailureReport, PipelineError, StageError};
pub use extract::{extract, Extraction, FailureRecord};
pub use llm::{ChatCompletionsClient, CompletionRequest, LlmError, TextCompletion};
pub use orchestrator::{Orchestrator, PipelineState};
pub use schemas::{AssessmentResult, Decoded, Difficulty, ProblemSpec, ProblemType, RunRequest, ValidationResult};
pub use source::{FileSource, RepoRef, RepositorySource, ScanError, ScanOptions, SyntheticSource};
pub use transcript::Transcript;
