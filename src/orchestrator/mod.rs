//! Pipeline driver
//!
//! One run moves through scanning, parallel analysis, creation, validation
//! and a single refinement pass. Any invocation or scan failure aborts the
//! run in the state it happened in.

pub mod refinement;
pub mod state;
pub mod synthesis;

pub use state::{PipelineState, StateTracker, TransitionRecord};
pub use synthesis::{rank_suggestions, synthesize, Analyses};

use crate::a2a::NotificationBus;
use crate::agents::creator::ProblemRequest;
use crate::agents::{
    AgentContext, AgentRole, Analyzer, CodeAnalyzer, DependencyAnalyzer, IssueAnalyzer, PrAnalyzer,
    ProblemCreator, QaValidator, ScannerAgent,
};
use crate::config::{AppConfig, PipelineConfig};
use crate::error::{ConfigError, PipelineError, StageError};
use crate::llm::TextCompletion;
use crate::metrics::{PerformanceMonitor, METRICS};
use crate::schemas::{
    AnalysisSummary, Assessment, AssessmentMetadata, AssessmentResult, DebugInfo, RepositoryDataset,
    RunRequest,
};
use crate::source::{RepoRef, RepositorySource, ScanOptions};
use crate::transcript::Transcript;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

const SENDER: &str = "orchestrator";

/// Owns one instance of every agent and drives runs through them
pub struct Orchestrator {
    scanner: ScannerAgent,
    code: CodeAnalyzer,
    pr: PrAnalyzer,
    issue: IssueAnalyzer,
    dependency: DependencyAnalyzer,
    creator: ProblemCreator,
    validator: QaValidator,
    bus: Arc<NotificationBus>,
    transcript: Arc<Transcript>,
    pipeline: PipelineConfig,
}

impl Orchestrator {
    /// Wire every agent from configuration around the given collaborators
    pub fn from_config(
        config: &AppConfig,
        llm: Arc<dyn TextCompletion>,
        source: Arc<dyn RepositorySource>,
    ) -> Result<Self, ConfigError> {
        let transcript = if config.pipeline.save_transcript {
            Transcript::enabled()
        } else {
            Transcript::disabled()
        };
        let ctx = AgentContext::new(llm, config.pipeline.call_timeout())
            .with_bus(Arc::new(NotificationBus::new()))
            .with_transcript(Arc::new(transcript));
        let agents = &config.agents;

        Ok(Self {
            scanner: ScannerAgent::new(agents.settings(AgentRole::Scanner), ctx.clone(), source)?,
            code: CodeAnalyzer::new(agents.settings(AgentRole::CodeAnalyzer), ctx.clone())?,
            pr: PrAnalyzer::new(agents.settings(AgentRole::PrAnalyzer), ctx.clone())?,
            issue: IssueAnalyzer::new(agents.settings(AgentRole::IssueAnalyzer), ctx.clone())?,
            dependency: DependencyAnalyzer::new(agents.settings(AgentRole::DependencyAnalyzer), ctx.clone())?,
            creator: ProblemCreator::new(agents.settings(AgentRole::ProblemCreator), ctx.clone())?,
            validator: QaValidator::new(
                agents.settings(AgentRole::QaValidator),
                ctx.clone(),
                config.pipeline.quality_threshold,
            )?,
            bus: ctx.bus,
            transcript: ctx.transcript,
            pipeline: config.pipeline.clone(),
        })
    }

    pub fn bus(&self) -> &Arc<NotificationBus> {
        &self.bus
    }

    pub fn transcript(&self) -> &Arc<Transcript> {
        &self.transcript
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Run the full pipeline for one request
    pub async fn generate_assessment(&self, request: RunRequest) -> Result<AssessmentResult, PipelineError> {
        let conversation_id = format!(
            "orchestrator_{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );
        let conv = Some(conversation_id.as_str());
        let monitor = PerformanceMonitor::new();
        let mut tracker = StateTracker::new();

        info!(
            "Generating {} {} assessment for {} ({} min)",
            request.difficulty, request.problem_type, request.repo_url, request.time_limit_minutes
        );
        self.bus.broadcast(
            &conversation_id,
            SENDER,
            SENDER,
            json!({"status": "started", "repository": request.repo_url}),
        );

        // Scanning
        let dataset = match request.repo_data.clone() {
            Some(dataset) => {
                info!("Using supplied repository dataset; scan skipped");
                dataset
            }
            None => {
                let repo = match RepoRef::parse(&request.repo_url) {
                    Ok(repo) => repo,
                    Err(e) => return Err(self.abort(&mut tracker, &conversation_id, e, None)),
                };
                let options = self.scan_options();
                match monitor
                    .measure("scan", self.scanner.scan(&repo, &options, conv))
                    .await
                {
                    Ok(dataset) => dataset,
                    Err(e) => return Err(self.abort(&mut tracker, &conversation_id, e, None)),
                }
            }
        };
        self.record_stage(&monitor, "scan");

        // Analyzing
        self.enter(&mut tracker, PipelineState::Analyzing, None);
        let joined = monitor
            .measure("analysis", async {
                tokio::try_join!(
                    monitor.measure("analysis.code", self.code.analyze(&dataset, conv)),
                    monitor.measure("analysis.pr", self.pr.analyze(&dataset, conv)),
                    monitor.measure("analysis.issue", self.issue.analyze(&dataset, conv)),
                    monitor.measure("analysis.dependency", self.dependency.analyze(&dataset, conv)),
                )
            })
            .await;
        let (code, pr, issue, dependency) = match joined {
            Ok(results) => results,
            Err(e) => {
                let partial = json!({"repo_data": dataset});
                return Err(self.abort(&mut tracker, &conversation_id, e, Some(partial)));
            }
        };
        self.record_stage(&monitor, "analysis");

        let report = synthesize(
            &dataset,
            Analyses {
                code,
                pr,
                issue,
                dependency,
            },
            self.pipeline.max_suggestions,
        );
        let decode_failures = report.decode_failures();
        if !decode_failures.is_empty() {
            warn!("Analyses fell back to defaults: {}", decode_failures.join(", "));
        }
        info!(
            "Synthesized report: {} suggestions, language {}",
            report.ranked_suggestions.len(),
            report.repository_profile.language
        );

        // Creating
        self.enter(&mut tracker, PipelineState::Creating, None);
        let problem_request = ProblemRequest {
            difficulty: request.difficulty,
            problem_type: request.problem_type,
            time_limit_minutes: request.time_limit_minutes,
        };
        let created = monitor
            .measure("creation", self.creator.create(&report, problem_request, None, conv))
            .await;
        let problem = match created {
            Ok(problem) => problem,
            Err(e) => {
                let partial = json!({"repo_data": dataset, "analysis_report": report});
                return Err(self.abort(&mut tracker, &conversation_id, e, Some(partial)));
            }
        };
        self.record_stage(&monitor, "creation");

        // Validating
        self.enter(&mut tracker, PipelineState::Validating, None);
        let validated = monitor
            .measure("validation", self.validator.validate(problem.record(), &report, conv))
            .await;
        let validation = match validated {
            Ok(validation) => validation,
            Err(e) => {
                let partial = json!({"analysis_report": report, "problem": problem});
                return Err(self.abort(&mut tracker, &conversation_id, e, Some(partial)));
            }
        };
        self.record_stage(&monitor, "validation");

        // Refining runs whatever the verdict was
        let verdict = if validation.record().is_approved {
            "approved"
        } else {
            "not approved"
        };
        self.enter(&mut tracker, PipelineState::Refining, Some(verdict));
        let context = refinement::improvement_context(problem.record(), validation.record());
        let refined = monitor
            .measure(
                "refinement",
                self.creator.create(&report, problem_request, Some(&context), conv),
            )
            .await;
        let refined = match refined {
            Ok(refined) => refined,
            Err(e) => {
                let partial = json!({
                    "analysis_report": report,
                    "problem": problem,
                    "validation": validation,
                });
                return Err(self.abort(&mut tracker, &conversation_id, e, Some(partial)));
            }
        };
        self.record_stage(&monitor, "refinement");

        self.enter(&mut tracker, PipelineState::Done, None);
        METRICS.record_run(true);
        self.bus.broadcast(
            &conversation_id,
            SENDER,
            SENDER,
            json!({
                "status": "completed",
                "problem_title": refined.record().title,
                "overall_score": validation.record().overall_score,
            }),
        );
        info!(
            "Assessment ready: '{}' (validated '{}' at {})",
            refined.record().title,
            problem.record().title,
            validation.record().overall_score
        );

        let metadata = AssessmentMetadata {
            repository: repository_label(&dataset, &request.repo_url),
            difficulty: request.difficulty,
            problem_type: request.problem_type,
            time_limit_minutes: request.time_limit_minutes,
            validated_title: problem.record().title.clone(),
            analysis_summary: AnalysisSummary {
                language: dataset.language().to_string(),
                suggestions_evaluated: report.ranked_suggestions.len(),
                decode_failures: decode_failures.iter().map(|s| s.to_string()).collect(),
            },
            performance: monitor.summary(),
            transitions: tracker.into_transitions(),
            conversation_id,
            generated_at: Utc::now(),
        };

        Ok(AssessmentResult {
            success: true,
            assessment: Assessment {
                problem: refined,
                validation,
                metadata,
            },
            debug: DebugInfo {
                repo_data: dataset,
                analysis_report: report,
            },
        })
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            want_issues: self.pipeline.want_issues,
            want_prs: self.pipeline.want_prs,
            want_commits: self.pipeline.want_commits,
            max_items: self.pipeline.max_items,
        }
    }

    /// Linear transitions never fail; log if one ever does
    fn enter(&self, tracker: &mut StateTracker, to: PipelineState, reason: Option<&str>) {
        if let Err(e) = tracker.advance(to, reason) {
            warn!("{}", e);
        }
    }

    fn record_stage(&self, monitor: &PerformanceMonitor, stage: &str) {
        if let Some(elapsed) = monitor.duration(stage) {
            METRICS.record_stage(stage, elapsed);
        }
    }

    fn abort(
        &self,
        tracker: &mut StateTracker,
        conversation_id: &str,
        source: impl Into<StageError>,
        partial: Option<Value>,
    ) -> PipelineError {
        let state = tracker.current();
        let mut failure = PipelineError::new(state, source);
        if let Some(partial) = partial {
            failure = failure.with_partial(partial);
        }

        error!("{}", failure);
        tracker.fail(&failure.source.to_string());
        METRICS.record_run(false);
        self.bus.broadcast(
            conversation_id,
            SENDER,
            SENDER,
            json!({"status": "failed", "state": state, "error": failure.source.to_string()}),
        );
        failure
    }
}

/// `owner/name` when the dataset knows it, otherwise the requested URL
fn repository_label(dataset: &RepositoryDataset, repo_url: &str) -> String {
    if !dataset.repository.full_name.is_empty() {
        dataset.repository.full_name.clone()
    } else if !dataset.repository.name.is_empty() {
        dataset.repository.name.clone()
    } else {
        repo_url.to_string()
    }
}
