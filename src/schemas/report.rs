//! Run inputs, the synthesized analysis report and the final assessment

use super::{
    CodeAnalysis, Decoded, DependencyAnalysis, Difficulty, IssueAnalysis, Opportunities,
    PrAnalysis, ProblemSpec, ProblemType, RepositoryDataset, SuggestedProblem, TechStack,
    ValidationResult,
};
use crate::metrics::performance::PerformanceSummary;
use crate::orchestrator::state::TransitionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry point of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub repo_url: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub problem_type: ProblemType,
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: u32,
    /// Pre-gathered facts; when present the scan is skipped
    #[serde(default)]
    pub repo_data: Option<RepositoryDataset>,
}

fn default_time_limit() -> u32 {
    240
}

impl RunRequest {
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            difficulty: Difficulty::default(),
            problem_type: ProblemType::default(),
            time_limit_minutes: default_time_limit(),
            repo_data: None,
        }
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn problem_type(mut self, problem_type: ProblemType) -> Self {
        self.problem_type = problem_type;
        self
    }

    pub fn time_limit(mut self, minutes: u32) -> Self {
        self.time_limit_minutes = minutes;
        self
    }

    pub fn with_repo_data(mut self, dataset: RepositoryDataset) -> Self {
        self.repo_data = Some(dataset);
        self
    }
}

/// Condensed view of the repository shared with the creator and validator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepositoryProfile {
    pub name: String,
    pub description: String,
    pub language: String,
    pub stars: u64,
    pub forks: u64,
    pub architecture: String,
    pub quality_score: u32,
    pub tech_stack: TechStack,
    pub development_patterns: Vec<String>,
    pub issue_patterns: Vec<String>,
}

/// Merge of the four analyses plus repository facts
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizedReport {
    pub repository_profile: RepositoryProfile,
    pub code_analysis: Decoded<CodeAnalysis>,
    pub pr_analysis: Decoded<PrAnalysis>,
    pub issue_analysis: Decoded<IssueAnalysis>,
    pub dependency_analysis: Decoded<DependencyAnalysis>,
    pub opportunities: Opportunities,
    /// Title-deduplicated suggestions, PR analysis first
    pub ranked_suggestions: Vec<SuggestedProblem>,
    pub readme_summary: String,
}

impl SynthesizedReport {
    /// Names of the analyzers whose output fell back to defaults
    pub fn decode_failures(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.code_analysis.is_failed() {
            failed.push("code_analyzer");
        }
        if self.pr_analysis.is_failed() {
            failed.push("pr_analyzer");
        }
        if self.issue_analysis.is_failed() {
            failed.push("issue_analyzer");
        }
        if self.dependency_analysis.is_failed() {
            failed.push("dependency_analyzer");
        }
        failed
    }
}

/// Input of a refinement call
#[derive(Debug, Clone, Serialize)]
pub struct ImprovementContext {
    pub original_problem: ProblemSpec,
    pub validation_feedback: ValidationResult,
    pub improvement_instructions: String,
    pub target_score: u32,
    pub current_score: u32,
}

/// Top-level result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    pub success: bool,
    pub assessment: Assessment,
    pub debug: DebugInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    /// The refined problem
    pub problem: Decoded<ProblemSpec>,
    /// Verdict on the problem as first created, before refinement
    pub validation: Decoded<ValidationResult>,
    pub metadata: AssessmentMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentMetadata {
    pub repository: String,
    pub difficulty: Difficulty,
    pub problem_type: ProblemType,
    pub time_limit_minutes: u32,
    /// Title of the problem the validation scores belong to
    pub validated_title: String,
    pub analysis_summary: AnalysisSummary,
    pub performance: PerformanceSummary,
    pub transitions: Vec<TransitionRecord>,
    pub conversation_id: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisSummary {
    pub language: String,
    pub suggestions_evaluated: usize,
    pub decode_failures: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub repo_data: RepositoryDataset,
    pub analysis_report: SynthesizedReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_request_defaults() {
        let request: RunRequest =
            serde_json::from_value(json!({"repo_url": "octo/demo"})).unwrap();
        assert_eq!(request.difficulty, Difficulty::Medium);
        assert_eq!(request.problem_type, ProblemType::Feature);
        assert_eq!(request.time_limit_minutes, 240);
        assert!(request.repo_data.is_none());
    }

    #[test]
    fn test_run_request_builder() {
        let request = RunRequest::new("octo/demo")
            .difficulty(Difficulty::Hard)
            .problem_type(ProblemType::Refactor)
            .time_limit(90)
            .with_repo_data(RepositoryDataset::default());
        assert_eq!(request.difficulty, Difficulty::Hard);
        assert_eq!(request.time_limit_minutes, 90);
        assert!(request.repo_data.is_some());
    }
}
