#![allow(dead_code)]

use actualcode::schemas::{IssueRecord, PullRequestRecord, RepositoryDataset, RepositoryMetadata};
use actualcode::{CompletionRequest, LlmError, TextCompletion};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Answers each agent with a canned, schema-shaped reply.
///
/// The problem creator answers "Original Title" on its first call and
/// "Refined Title" afterwards, echoing the requested difficulty. The
/// validator names the title it was shown in its issue list.
#[derive(Default)]
pub struct ScriptedClient {
    delays: HashMap<&'static str, Duration>,
    failing: HashSet<&'static str>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, agent: &'static str, millis: u64) -> Self {
        self.delays.insert(agent, Duration::from_millis(millis));
        self
    }

    pub fn failing(mut self, agent: &'static str) -> Self {
        self.failing.insert(agent);
        self
    }

    /// Prompts sent by `agent`, in call order
    pub fn prompts_for(&self, agent: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == agent)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn reply(&self, agent: &str, prompt: &str) -> String {
        match agent {
            "code_analyzer" => json!({
                "architecture": {"pattern": "Layered MVC", "layers": ["routes", "services", "db"], "complexity": "medium"},
                "code_quality": {"score": 72, "strengths": ["Clear routing"], "weaknesses": ["No input validation"]},
                "opportunities": {"features": ["Order pagination"], "improvements": ["Caching"], "extensions": []}
            })
            .to_string(),
            "pr_analyzer" => format!(
                "```json\n{}\n```",
                json!({
                    "patterns": {"common_change_types": ["bug fixes"], "frequent_files": [{"path": "src/routes/orders.js", "change_count": 3}], "workflow_patterns": ["small PRs"]},
                    "insights": {"recent_features": ["caching"], "common_bugs": [], "performance_improvements": []},
                    "suggested_problems": [
                        {"title": "Add rate limiting", "description": "Protect the API", "based_on_prs": [20]},
                        {"title": "Cache product lookups", "description": "Speed up reads", "based_on_prs": [21]}
                    ]
                })
            ),
            "issue_analyzer" => format!(
                "Here is the analysis you asked for:\n{}\nLet me know if you need more.",
                json!({
                    "categories": {"bugs": {"count": 2, "examples": ["Order totals"]}, "features": {"count": 1, "examples": []}, "enhancements": {"count": 0, "examples": []}},
                    "priority_issues": [{"title": "Inventory drift", "reason": "Data loss"}],
                    "problem_patterns": [{"pattern": "Concurrency bugs", "frequency": "recurring"}],
                    "suggested_problems": [
                        {"title": "add rate limiting", "description": "duplicate"},
                        {"title": "Fix inventory drift", "description": "Use transactions", "based_on_issues": [12]}
                    ]
                })
            ),
            "dependency_analyzer" => json!({
                "tech_stack": {"frameworks": ["Express"], "libraries": ["pg", "joi"], "runtime": "Node.js", "build_tools": ["npm"]},
                "dependency_health": {"outdated": [], "vulnerable": [], "well_maintained": ["express"]},
                "integration_opportunities": []
            })
            .to_string(),
            "problem_creator" => {
                let previous = self.prompts_for("problem_creator").len();
                let title = if previous <= 1 { "Original Title" } else { "Refined Title" };
                let difficulty = line_value(prompt, "Difficulty: ").unwrap_or("medium");
                json!({
                    "title": title,
                    "description": "Add cursor pagination to the orders endpoint",
                    "business_context": "Large merchants time out listing orders",
                    "requirements": ["Cursor-based pagination", "Stable ordering"],
                    "acceptance_criteria": ["Pages never repeat rows"],
                    "starter_code": [{"filename": "src/routes/orders.js", "content": "// TODO", "description": "route"}],
                    "hints": ["Index created_at"],
                    "estimated_time": 180,
                    "difficulty": difficulty,
                    "tech_stack": ["Express", "pg"],
                    "evaluation_rubric": [{"criterion": "Correctness", "points": 60, "description": ""}, {"criterion": "Tests", "points": 40, "description": ""}]
                })
                .to_string()
            }
            "qa_validator" => {
                let title = line_value(prompt, "Title: ").unwrap_or("?");
                json!({
                    "is_approved": true,
                    "overall_score": 84,
                    "scores": {"feasibility": 90, "quality": 80, "technical": 85, "educational": 81},
                    "issues": [format!("Reviewed: {}", title)],
                    "suggestions": ["Clarify the cursor format"],
                    "feedback": {"strengths": ["Realistic"], "weaknesses": ["Vague rubric"], "improvements": []}
                })
                .to_string()
            }
            other => format!("unexpected agent {}", other),
        }
    }
}

fn line_value<'a>(prompt: &'a str, prefix: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .map(str::trim)
}

#[async_trait]
impl TextCompletion for ScriptedClient {
    async fn generate(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.agent.to_string(), request.prompt.to_string()));

        if let Some(delay) = self.delays.get(request.agent) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(request.agent) {
            return Err(LlmError::Upstream {
                status: 500,
                body: format!("{} unavailable", request.agent),
            });
        }
        Ok(self.reply(request.agent, request.prompt))
    }
}

/// JavaScript repository with 3 issues, 3 pull requests and 2 manifests
pub fn javascript_dataset() -> RepositoryDataset {
    let mut dataset = RepositoryDataset {
        repository: RepositoryMetadata {
            name: "shopfront".into(),
            full_name: "octo/shopfront".into(),
            description: "Storefront API".into(),
            language: "JavaScript".into(),
            stars: 120,
            forks: 14,
            url: "https://github.com/octo/shopfront".into(),
        },
        readme: "# shopfront\n\nExpress API for orders.".into(),
        issues: (1..=3)
            .map(|n| IssueRecord {
                number: n,
                title: format!("Issue {}", n),
                state: "open".into(),
                ..Default::default()
            })
            .collect(),
        pull_requests: (1..=3)
            .map(|n| PullRequestRecord {
                number: 10 + n,
                title: format!("PR {}", n),
                state: "merged".into(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };
    dataset
        .dependencies
        .insert("package.json".into(), r#"{"dependencies": {"express": "^4.18.2"}}"#.into());
    dataset
        .dependencies
        .insert("package-lock.json".into(), r#"{"lockfileVersion": 3}"#.into());
    dataset
}
