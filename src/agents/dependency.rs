//! Technology stack and dependency analyzer

use super::{clip, Agent, AgentContext, AgentRole, Analyzer};
use crate::config::AgentSettings;
use crate::error::ConfigError;
use crate::schemas::{DependencyAnalysis, RepositoryDataset};
use serde_json::{json, Value};

pub(crate) const INSTRUCTION: &str = r#"You are a dependency and technology stack expert.

From the manifests provided, identify frameworks, libraries, runtime and build tools, judge dependency health (outdated, vulnerable, well maintained), and suggest integration opportunities that would make good coding challenges.

Return ONLY a JSON object:
{
  "tech_stack": {"frameworks": ["..."], "libraries": ["..."], "runtime": "...", "build_tools": ["..."]},
  "dependency_health": {"outdated": ["..."], "vulnerable": ["..."], "well_maintained": ["..."]},
  "integration_opportunities": [{"opportunity": "...", "technologies": ["..."], "difficulty": "easy|medium|hard", "rationale": "..."}]
}"#;

/// Characters of the dependency listing embedded in the prompt
pub const DEPENDENCY_LISTING_CHARS: usize = 2000;
const README_CHARS: usize = 500;

pub struct DependencyAnalyzer {
    agent: Agent,
}

impl DependencyAnalyzer {
    pub fn new(settings: AgentSettings, ctx: AgentContext) -> Result<Self, ConfigError> {
        Ok(Self {
            agent: Agent::new(AgentRole::DependencyAnalyzer, settings, ctx)?,
        })
    }
}

impl Analyzer for DependencyAnalyzer {
    type Output = DependencyAnalysis;

    fn agent(&self) -> &Agent {
        &self.agent
    }

    fn target(&self) -> &'static str {
        "dependencies"
    }

    fn build_prompt(&self, dataset: &RepositoryDataset) -> String {
        let listing = dataset.dependency_listing();
        let listing = if listing.is_empty() {
            "No dependency manifests found"
        } else {
            clip(&listing, DEPENDENCY_LISTING_CHARS)
        };
        let readme = if dataset.readme.is_empty() {
            "No README"
        } else {
            clip(&dataset.readme, README_CHARS)
        };

        format!(
            "Analyze this tech stack and dependencies:\n\n\
             Repository: {}\n\
             Primary Language: {}\n\n\
             Dependencies:\n{}\n\n\
             README (for context):\n{}\n\n\
             Analyze the technology stack, dependency health, and identify integration opportunities for coding challenges.\n\
             Return ONLY valid JSON matching the specified format.",
            dataset.repository.name,
            dataset.language(),
            listing,
            readme,
        )
    }

    fn summarize(&self, output: &DependencyAnalysis) -> Value {
        json!({
            "frameworks": output.tech_stack.frameworks.len(),
            "runtime": output.tech_stack.runtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::*;
    use std::sync::Arc;

    #[test]
    fn test_listing_without_manifests() {
        let client = Arc::new(CannedClient::new(""));
        let analyzer =
            DependencyAnalyzer::new(AgentRole::DependencyAnalyzer.default_settings(), context(client)).unwrap();
        let prompt = analyzer.build_prompt(&RepositoryDataset::default());
        assert!(prompt.contains("No dependency manifests found"));
        assert!(prompt.contains("No README"));
    }

    #[tokio::test]
    async fn test_fallback_runtime_unknown() {
        let client = Arc::new(CannedClient::new("```json\n{\"tech_stack\": "));
        let analyzer =
            DependencyAnalyzer::new(AgentRole::DependencyAnalyzer.default_settings(), context(client)).unwrap();

        let decoded = analyzer.analyze(&RepositoryDataset::default(), None).await.unwrap();
        assert!(decoded.is_failed());
        assert_eq!(decoded.record().tech_stack.runtime, "Unknown");
    }

    #[test]
    fn test_listing_clipped_on_char_boundary() {
        let client = Arc::new(CannedClient::new(""));
        let analyzer =
            DependencyAnalyzer::new(AgentRole::DependencyAnalyzer.default_settings(), context(client)).unwrap();

        let mut dataset = RepositoryDataset::default();
        dataset
            .dependencies
            .insert("package.json".into(), format!("{}ENDOFMANIFEST", "日本語é".repeat(700)));
        let listing = dataset.dependency_listing();
        assert!(listing.chars().count() > DEPENDENCY_LISTING_CHARS);

        let prompt = analyzer.build_prompt(&dataset);
        let kept = clip(&listing, DEPENDENCY_LISTING_CHARS);
        assert_eq!(kept.chars().count(), DEPENDENCY_LISTING_CHARS);
        assert!(prompt.contains(kept));
        assert!(!prompt.contains(&listing[kept.len()..]));
        assert!(!prompt.contains("ENDOFMANIFEST"));
    }
}
