//! Output records of the four repository analyzers

use super::{lenient_score, null_default, AgentSchema};
use serde::{Deserialize, Serialize};

/// Architecture, quality and opportunity assessment of the codebase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeAnalysis {
    #[serde(deserialize_with = "null_default")]
    pub architecture: Architecture,
    #[serde(deserialize_with = "null_default")]
    pub code_quality: CodeQuality,
    #[serde(deserialize_with = "null_default")]
    pub opportunities: Opportunities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Architecture {
    #[serde(deserialize_with = "null_default")]
    pub pattern: String,
    #[serde(deserialize_with = "null_default")]
    pub layers: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub complexity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeQuality {
    #[serde(deserialize_with = "lenient_score")]
    pub score: u32,
    #[serde(deserialize_with = "null_default")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Opportunities {
    #[serde(deserialize_with = "null_default")]
    pub features: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub improvements: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub extensions: Vec<String>,
}

impl AgentSchema for CodeAnalysis {
    const AGENT: &'static str = "code_analyzer";

    fn fallback() -> Self {
        Self {
            architecture: Architecture {
                pattern: "Unknown".to_string(),
                layers: vec![],
                complexity: "medium".to_string(),
            },
            code_quality: CodeQuality {
                score: 50,
                strengths: vec![],
                weaknesses: vec!["Unable to analyze".to_string()],
            },
            opportunities: Opportunities::default(),
        }
    }
}

/// A problem idea proposed by the PR or issue analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestedProblem {
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "null_default")]
    pub difficulty: Option<String>,
    /// PR or issue references the idea is derived from
    #[serde(
        alias = "based_on_prs",
        alias = "based_on_issues",
        deserialize_with = "null_default"
    )]
    pub based_on: Vec<serde_json::Value>,
}

/// Change patterns mined from pull requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrAnalysis {
    #[serde(deserialize_with = "null_default")]
    pub patterns: PrPatterns,
    #[serde(deserialize_with = "null_default")]
    pub insights: PrInsights,
    #[serde(deserialize_with = "null_default")]
    pub suggested_problems: Vec<SuggestedProblem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrPatterns {
    #[serde(deserialize_with = "null_default")]
    pub common_change_types: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub frequent_files: Vec<FrequentFile>,
    #[serde(deserialize_with = "null_default")]
    pub workflow_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequentFile {
    #[serde(deserialize_with = "null_default")]
    pub path: String,
    #[serde(alias = "changes", deserialize_with = "null_default")]
    pub change_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrInsights {
    #[serde(deserialize_with = "null_default")]
    pub recent_features: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub common_bugs: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub performance_improvements: Vec<String>,
}

impl AgentSchema for PrAnalysis {
    const AGENT: &'static str = "pr_analyzer";

    fn fallback() -> Self {
        Self::default()
    }
}

/// Categorised issue tracker contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueAnalysis {
    #[serde(deserialize_with = "null_default")]
    pub categories: IssueCategories,
    #[serde(deserialize_with = "null_default")]
    pub priority_issues: Vec<PriorityIssue>,
    #[serde(deserialize_with = "null_default")]
    pub problem_patterns: Vec<ProblemPattern>,
    #[serde(deserialize_with = "null_default")]
    pub suggested_problems: Vec<SuggestedProblem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueCategories {
    #[serde(deserialize_with = "null_default")]
    pub bugs: IssueCategory,
    #[serde(deserialize_with = "null_default")]
    pub features: IssueCategory,
    #[serde(deserialize_with = "null_default")]
    pub enhancements: IssueCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueCategory {
    #[serde(deserialize_with = "null_default")]
    pub count: u32,
    #[serde(deserialize_with = "null_default")]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityIssue {
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemPattern {
    #[serde(deserialize_with = "null_default")]
    pub pattern: String,
    #[serde(deserialize_with = "null_default")]
    pub frequency: String,
}

impl AgentSchema for IssueAnalysis {
    const AGENT: &'static str = "issue_analyzer";

    fn fallback() -> Self {
        Self::default()
    }
}

/// Technology stack and dependency health
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyAnalysis {
    #[serde(deserialize_with = "null_default")]
    pub tech_stack: TechStack,
    #[serde(deserialize_with = "null_default")]
    pub dependency_health: DependencyHealth,
    #[serde(deserialize_with = "null_default")]
    pub integration_opportunities: Vec<IntegrationOpportunity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechStack {
    #[serde(deserialize_with = "null_default")]
    pub frameworks: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub libraries: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub runtime: String,
    #[serde(deserialize_with = "null_default")]
    pub build_tools: Vec<String>,
}

impl TechStack {
    /// Frameworks followed by libraries, in order
    pub fn technologies(&self) -> Vec<String> {
        self.frameworks
            .iter()
            .chain(self.libraries.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyHealth {
    #[serde(deserialize_with = "null_default")]
    pub outdated: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub vulnerable: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub well_maintained: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationOpportunity {
    #[serde(deserialize_with = "null_default")]
    pub opportunity: String,
    #[serde(deserialize_with = "null_default")]
    pub technologies: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub difficulty: String,
    #[serde(deserialize_with = "null_default")]
    pub rationale: String,
}

impl AgentSchema for DependencyAnalysis {
    const AGENT: &'static str = "dependency_analyzer";

    fn fallback() -> Self {
        Self {
            tech_stack: TechStack {
                runtime: "Unknown".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_suggested_problem_aliases() {
        let from_prs: SuggestedProblem = serde_json::from_value(json!({
            "title": "Add retries",
            "description": "Flaky network calls",
            "based_on_prs": [12, 15]
        }))
        .unwrap();
        assert_eq!(from_prs.description, "Flaky network calls");
        assert!(from_prs.rationale.is_empty());
        assert_eq!(from_prs.based_on.len(), 2);

        let from_issues: SuggestedProblem = serde_json::from_value(json!({
            "title": "Fix login",
            "based_on_issues": ["#3"]
        }))
        .unwrap();
        assert_eq!(from_issues.based_on, vec![json!("#3")]);
    }

    #[test]
    fn test_code_analysis_fallback_shape() {
        let fallback = CodeAnalysis::fallback();
        assert_eq!(fallback.architecture.pattern, "Unknown");
        assert_eq!(fallback.code_quality.score, 50);
        assert_eq!(fallback.code_quality.weaknesses, vec!["Unable to analyze"]);
    }

    #[test]
    fn test_technologies_order() {
        let stack = TechStack {
            frameworks: vec!["React".into()],
            libraries: vec!["lodash".into(), "axios".into()],
            ..Default::default()
        };
        assert_eq!(stack.technologies(), vec!["React", "lodash", "axios"]);
    }

    #[test]
    fn test_null_sections_decode_to_defaults() {
        let code = crate::schemas::decode::<CodeAnalysis>(
            r#"{"architecture": {"pattern": "Hexagonal", "layers": null}, "code_quality": null, "opportunities": {"features": ["Webhooks"]}}"#,
        );
        assert!(!code.is_failed());
        let code = code.record();
        assert_eq!(code.architecture.pattern, "Hexagonal");
        assert_eq!(code.code_quality, CodeQuality::default());
        assert_eq!(code.opportunities.features, vec!["Webhooks"]);

        let issues = crate::schemas::decode::<IssueAnalysis>(
            r#"{"categories": {"bugs": null, "features": {"count": null}}, "priority_issues": [{"title": "Crash on login", "reason": null}], "problem_patterns": [{"pattern": null, "frequency": "often"}]}"#,
        );
        assert!(!issues.is_failed());
        let issues = issues.record();
        assert_eq!(issues.priority_issues[0].title, "Crash on login");
        assert_eq!(issues.problem_patterns[0].frequency, "often");

        let deps = crate::schemas::decode::<DependencyAnalysis>(
            r#"{"tech_stack": {"runtime": "Node.js"}, "dependency_health": null}"#,
        );
        assert!(!deps.is_failed());
        assert_eq!(deps.record().tech_stack.runtime, "Node.js");
    }
}
