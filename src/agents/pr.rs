//! Pull request pattern analyzer

use super::{clipped_json, Agent, AgentContext, AgentRole, Analyzer};
use crate::config::AgentSettings;
use crate::error::ConfigError;
use crate::schemas::{PrAnalysis, RepositoryDataset};
use serde_json::{json, Value};

pub(crate) const INSTRUCTION: &str = r#"You study a repository's pull request history to learn how the team changes code.

Identify common change types, frequently touched files and workflow habits, summarise recent features, recurring bugs and performance work, and propose coding problems grounded in those changes.

Return ONLY a JSON object:
{
  "patterns": {"common_change_types": ["..."], "frequent_files": [{"path": "...", "change_count": 0}], "workflow_patterns": ["..."]},
  "insights": {"recent_features": ["..."], "common_bugs": ["..."], "performance_improvements": ["..."]},
  "suggested_problems": [{"title": "...", "description": "...", "difficulty": "easy|medium|hard|expert", "based_on_prs": [1]}]
}"#;

/// Pull requests embedded in the prompt
const PR_COUNT: usize = 10;
const PR_LISTING_CHARS: usize = 2000;

pub struct PrAnalyzer {
    agent: Agent,
}

impl PrAnalyzer {
    pub fn new(settings: AgentSettings, ctx: AgentContext) -> Result<Self, ConfigError> {
        Ok(Self {
            agent: Agent::new(AgentRole::PrAnalyzer, settings, ctx)?,
        })
    }
}

impl Analyzer for PrAnalyzer {
    type Output = PrAnalysis;

    fn agent(&self) -> &Agent {
        &self.agent
    }

    fn target(&self) -> &'static str {
        "pr_patterns"
    }

    fn build_prompt(&self, dataset: &RepositoryDataset) -> String {
        let recent: Vec<_> = dataset.pull_requests.iter().take(PR_COUNT).collect();
        let listing = if recent.is_empty() {
            "No pull requests available".to_string()
        } else {
            clipped_json(&recent, PR_LISTING_CHARS)
        };

        format!(
            "Analyze these pull requests:\n\n\
             Repository: {}\n\n\
             Recent Pull Requests:\n{}\n\n\
             Analyze the PR patterns, development workflows, and identify opportunities for coding challenges.\n\
             Return ONLY valid JSON matching the specified format.",
            dataset.repository.name, listing
        )
    }

    fn summarize(&self, output: &PrAnalysis) -> Value {
        json!({
            "patterns_found": output.patterns.common_change_types.len(),
            "suggested_problems": output.suggested_problems.len(),
        })
    }
}
