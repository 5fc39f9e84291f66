//! Issue tracker analyzer

use super::{clipped_json, Agent, AgentContext, AgentRole, Analyzer};
use crate::config::AgentSettings;
use crate::error::ConfigError;
use crate::schemas::{IssueAnalysis, RepositoryDataset};
use serde_json::{json, Value};

pub(crate) const INSTRUCTION: &str = r#"You triage a repository's issue tracker to find realistic problems worth turning into coding assessments.

Categorise issues into bugs, features and enhancements with counts and examples, pick the issues that matter most and say why, name recurring problem patterns, and propose coding problems based on real issues.

Return ONLY a JSON object:
{
  "categories": {"bugs": {"count": 0, "examples": ["..."]}, "features": {"count": 0, "examples": []}, "enhancements": {"count": 0, "examples": []}},
  "priority_issues": [{"title": "...", "reason": "..."}],
  "problem_patterns": [{"pattern": "...", "frequency": "..."}],
  "suggested_problems": [{"title": "...", "description": "...", "difficulty": "easy|medium|hard|expert", "based_on_issues": [1]}]
}"#;

const ISSUE_COUNT: usize = 15;
const ISSUE_LISTING_CHARS: usize = 2000;

pub struct IssueAnalyzer {
    agent: Agent,
}

impl IssueAnalyzer {
    pub fn new(settings: AgentSettings, ctx: AgentContext) -> Result<Self, ConfigError> {
        Ok(Self {
            agent: Agent::new(AgentRole::IssueAnalyzer, settings, ctx)?,
        })
    }
}

impl Analyzer for IssueAnalyzer {
    type Output = IssueAnalysis;

    fn agent(&self) -> &Agent {
        &self.agent
    }

    fn target(&self) -> &'static str {
        "issue_patterns"
    }

    fn build_prompt(&self, dataset: &RepositoryDataset) -> String {
        let recent: Vec<_> = dataset.issues.iter().take(ISSUE_COUNT).collect();
        let listing = if recent.is_empty() {
            "No issues available".to_string()
        } else {
            clipped_json(&recent, ISSUE_LISTING_CHARS)
        };

        format!(
            "Analyze these GitHub issues:\n\n\
             Repository: {}\n\n\
             Recent Issues:\n{}\n\n\
             Analyze the issue patterns, feature requests, and identify opportunities for coding challenges.\n\
             Return ONLY valid JSON matching the specified format.",
            dataset.repository.name, listing
        )
    }

    fn summarize(&self, output: &IssueAnalysis) -> Value {
        json!({
            "bugs": output.categories.bugs.count,
            "features": output.categories.features.count,
            "suggested_problems": output.suggested_problems.len(),
        })
    }
}
