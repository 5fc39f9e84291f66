//! Code architecture and quality analyzer

use super::{clip, clipped_json, Agent, AgentContext, AgentRole, Analyzer};
use crate::config::AgentSettings;
use crate::error::ConfigError;
use crate::schemas::{CodeAnalysis, RepositoryDataset};
use serde_json::{json, Value};

pub(crate) const INSTRUCTION: &str = r#"You are a senior software architect reviewing a codebase to find material for realistic coding assessments.

Assess the architecture pattern and layers, rate code quality from 0 to 100 with concrete strengths and weaknesses, and list feature, improvement and extension opportunities that a candidate could implement in a few hours.

Return ONLY a JSON object:
{
  "architecture": {"pattern": "...", "layers": ["..."], "complexity": "low|medium|high"},
  "code_quality": {"score": 0-100, "strengths": ["..."], "weaknesses": ["..."]},
  "opportunities": {"features": ["..."], "improvements": ["..."], "extensions": ["..."]}
}"#;

const FILE_TREE_CHARS: usize = 500;
const README_CHARS: usize = 1000;
const DEPENDENCY_CHARS: usize = 500;

pub struct CodeAnalyzer {
    agent: Agent,
}

impl CodeAnalyzer {
    pub fn new(settings: AgentSettings, ctx: AgentContext) -> Result<Self, ConfigError> {
        Ok(Self {
            agent: Agent::new(AgentRole::CodeAnalyzer, settings, ctx)?,
        })
    }
}

impl Analyzer for CodeAnalyzer {
    type Output = CodeAnalysis;

    fn agent(&self) -> &Agent {
        &self.agent
    }

    fn target(&self) -> &'static str {
        "code_architecture"
    }

    fn build_prompt(&self, dataset: &RepositoryDataset) -> String {
        let repo = &dataset.repository;
        let readme = if dataset.readme.is_empty() {
            "No README"
        } else {
            clip(&dataset.readme, README_CHARS)
        };
        let description = if repo.description.is_empty() {
            "No description"
        } else {
            &repo.description
        };

        format!(
            "Analyze this codebase:\n\n\
             Repository: {}\n\
             Language: {}\n\
             Description: {}\n\n\
             File Structure:\n{}\n\n\
             README:\n{}\n\n\
             Dependencies:\n{}\n\n\
             Analyze the architecture, code quality, and identify opportunities for coding challenges.\n\
             Return ONLY valid JSON matching the specified format.",
            repo.name,
            dataset.language(),
            description,
            clipped_json(&dataset.file_tree, FILE_TREE_CHARS),
            readme,
            clip(&dataset.dependency_listing(), DEPENDENCY_CHARS),
        )
    }

    fn summarize(&self, output: &CodeAnalysis) -> Value {
        json!({
            "complexity": output.architecture.complexity,
            "quality_score": output.code_quality.score,
        })
    }
}
