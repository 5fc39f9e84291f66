//! Problem creator: turns the synthesized report into an assessment, or
//! refines an existing one from QA feedback

use super::{clip, Agent, AgentContext, AgentRole, RunOptions};
use crate::a2a::MessageType;
use crate::config::AgentSettings;
use crate::error::ConfigError;
use crate::llm::LlmError;
use crate::metrics::METRICS;
use crate::schemas::{
    decode_with, Decoded, Difficulty, ImprovementContext, ProblemSpec, ProblemType,
    SynthesizedReport,
};
use serde_json::{json, Map, Value};
use tracing::{error, info};

pub(crate) const INSTRUCTION: &str = r#"You write realistic take-home coding assessments grounded in a specific repository.

Every problem must use the repository's actual technology stack, address a real weakness or opportunity, fit the stated time limit, and come with a clear business context, specific requirements, objective acceptance criteria, helpful starter code, hints that do not give away the solution, and a points-based rubric.

Keep each text field concise, escape newlines inside strings, and close every bracket.

Return ONLY a JSON object:
{
  "title": "...",
  "description": "...",
  "business_context": "...",
  "requirements": ["..."],
  "acceptance_criteria": ["..."],
  "starter_code": [{"filename": "...", "content": "...", "description": "..."}],
  "hints": ["..."],
  "estimated_time": 180,
  "difficulty": "easy|medium|hard|expert",
  "tech_stack": ["..."],
  "evaluation_rubric": [{"criterion": "...", "points": 10, "description": "..."}]
}"#;

/// Parameters of the problem being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemRequest {
    pub difficulty: Difficulty,
    pub problem_type: ProblemType,
    pub time_limit_minutes: u32,
}

pub struct ProblemCreator {
    agent: Agent,
}

impl ProblemCreator {
    pub fn new(settings: AgentSettings, ctx: AgentContext) -> Result<Self, ConfigError> {
        Ok(Self {
            agent: Agent::new(AgentRole::ProblemCreator, settings, ctx)?,
        })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Create a fresh problem, or refine `improvement.original_problem` when
    /// an improvement context is given. Both modes return the same schema.
    pub async fn create(
        &self,
        report: &SynthesizedReport,
        request: ProblemRequest,
        improvement: Option<&ImprovementContext>,
        conversation_id: Option<&str>,
    ) -> Result<Decoded<ProblemSpec>, LlmError> {
        let prompt = match improvement {
            Some(context) => {
                info!("Refining '{}' from QA feedback", context.original_problem.title);
                self.refinement_prompt(context, request)
            }
            None => {
                info!(
                    "Creating {} {} problem ({} min)",
                    request.difficulty, request.problem_type, request.time_limit_minutes
                );
                self.creation_prompt(report, request)
            }
        };

        self.agent.notify(
            conversation_id,
            "orchestrator",
            MessageType::Notification,
            json!({
                "status": if improvement.is_some() { "refining" } else { "creating" },
                "difficulty": request.difficulty,
                "type": request.problem_type,
            }),
        );

        let text = self
            .agent
            .run(&prompt, RunOptions::conversation(conversation_id))
            .await?;

        let mut decoded = decode_with::<ProblemSpec, _>(&text, |map| {
            fill_difficulty(map, request.difficulty)
        });

        match &mut decoded {
            Decoded::Parsed(problem) => {
                info!("Problem created: '{}' ({})", problem.title, problem.difficulty);
                self.agent.notify(
                    conversation_id,
                    "qa_validator",
                    MessageType::Request,
                    json!({
                        "status": "completed",
                        "problem": {
                            "title": problem.title,
                            "difficulty": problem.difficulty,
                            "estimated_time": problem.estimated_time,
                        },
                    }),
                );
            }
            Decoded::Failed { fallback, failure } => {
                METRICS.record_decode_failure(self.agent.name());
                error!("Failed to parse problem: {}", failure.error);
                fallback.difficulty = request.difficulty;
            }
        }

        Ok(decoded)
    }

    fn creation_prompt(&self, report: &SynthesizedReport, request: ProblemRequest) -> String {
        let profile = &report.repository_profile;
        let code = report.code_analysis.record();
        let stack = &report.dependency_analysis.record().tech_stack;

        let libraries: Vec<&String> = stack.libraries.iter().take(8).collect();
        let weaknesses: Vec<&String> = code.code_quality.weaknesses.iter().take(3).collect();
        let features: Vec<&String> = report.opportunities.features.iter().take(3).collect();
        let ideas: Vec<&str> = report
            .ranked_suggestions
            .iter()
            .take(5)
            .map(|s| s.title.as_str())
            .collect();
        let must_use: Vec<String> = stack
            .frameworks
            .iter()
            .chain(stack.libraries.iter().take(5))
            .cloned()
            .collect();

        format!(
            "Create a {difficulty} {kind} coding assessment for THIS SPECIFIC REPOSITORY.\n\n\
             REPOSITORY DETAILS:\n\
             Name: {name}\n\
             Description: {description}\n\
             Primary Language: {language}\n\n\
             README Summary:\n{readme}\n\n\
             TECH STACK (use these exact technologies):\n\
             Frameworks: {frameworks}\n\
             Libraries: {libraries}\n\
             Runtime: {runtime}\n\n\
             ARCHITECTURE:\n\
             Pattern: {pattern}\n\
             Complexity: {complexity}\n\n\
             CODE QUALITY:\n\
             Score: {score}/100\n\
             Weaknesses: {weaknesses}\n\n\
             IMPROVEMENT OPPORTUNITIES:\n{features}\n\n\
             CANDIDATE IDEAS FROM PR AND ISSUE HISTORY:\n{ideas}\n\n\
             REQUIREMENTS:\n\
             1. Use the repository's actual tech stack: {must_use}\n\
             2. Address a weakness or opportunity identified above\n\
             3. Must be implementable within {minutes} minutes\n\
             4. No generic exercises unrelated to this repository\n\
             5. Use the repository name \"{name}\" as context\n\n\
             Difficulty: {difficulty}\n\
             Problem Type: {kind}\n\
             Time Limit: {minutes} minutes\n\n\
             Return ONLY valid JSON matching the specified format.",
            difficulty = request.difficulty,
            kind = request.problem_type,
            name = profile.name,
            description = clip(&profile.description, 200),
            language = profile.language,
            readme = clip(&report.readme_summary, 400),
            frameworks = json!(stack.frameworks),
            libraries = json!(libraries),
            runtime = stack.runtime,
            pattern = code.architecture.pattern,
            complexity = code.architecture.complexity,
            score = code.code_quality.score,
            weaknesses = json!(weaknesses),
            features = serde_json::to_string_pretty(&features).unwrap_or_default(),
            ideas = json!(ideas),
            must_use = must_use.join(", "),
            minutes = request.time_limit_minutes,
        )
    }

    fn refinement_prompt(&self, context: &ImprovementContext, request: ProblemRequest) -> String {
        let feedback = &context.validation_feedback;
        let original = serde_json::to_string_pretty(&context.original_problem).unwrap_or_default();
        let issues = if feedback.issues.is_empty() {
            "None - problem is generally good".to_string()
        } else {
            serde_json::to_string_pretty(&feedback.issues).unwrap_or_default()
        };
        let suggestions = if feedback.suggestions.is_empty() {
            "None - minor polish only".to_string()
        } else {
            serde_json::to_string_pretty(&feedback.suggestions).unwrap_or_default()
        };

        format!(
            "TASK: Refine this coding problem based on QA feedback. Make ONLY MINIMAL improvements.\n\n\
             ORIGINAL PROBLEM (keep this as the base):\n{original}\n\n\
             QA FEEDBACK:\n\
             Score: {score}/100 (target {target})\n\n\
             Issues: {issues}\n\n\
             Suggestions: {suggestions}\n\n\
             Strengths to Preserve: {strengths}\n\n\
             {instructions}\n\n\
             REFINEMENT RULES:\n\
             1. Keep the EXACT same title, description, and tech stack\n\
             2. Only fix critical issues\n\
             3. Make small clarifications to requirements or criteria if needed\n\
             4. Preserve most of the original problem\n\
             5. If feedback is minimal, return a nearly identical problem\n\n\
             Difficulty: {difficulty}\n\
             Problem Type: {kind}\n\
             Time Limit: {minutes} minutes\n\n\
             Return the refined problem as JSON.",
            score = context.current_score,
            target = context.target_score,
            strengths = json!(feedback.feedback.strengths),
            instructions = context.improvement_instructions,
            difficulty = request.difficulty,
            kind = ProblemType::Improvement,
            minutes = request.time_limit_minutes,
        )
    }
}

/// Models sometimes omit or misspell the difficulty; fall back to the one
/// that was requested
fn fill_difficulty(map: &mut Map<String, Value>, requested: Difficulty) {
    let valid = map
        .get("difficulty")
        .and_then(Value::as_str)
        .map_or(false, |d| d.parse::<Difficulty>().is_ok());
    if !valid {
        map.insert("difficulty".to_string(), json!(requested));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::*;
    use crate::schemas::{
        CodeAnalysis, DependencyAnalysis, IssueAnalysis, Opportunities, PrAnalysis,
        RepositoryProfile, ValidationResult,
    };
    use std::sync::Arc;

    fn report() -> SynthesizedReport {
        SynthesizedReport {
            repository_profile: RepositoryProfile {
                name: "shopfront".into(),
                language: "JavaScript".into(),
                ..Default::default()
            },
            code_analysis: Decoded::Parsed(CodeAnalysis::default()),
            pr_analysis: Decoded::Parsed(PrAnalysis::default()),
            issue_analysis: Decoded::Parsed(IssueAnalysis::default()),
            dependency_analysis: Decoded::Parsed(DependencyAnalysis::default()),
            opportunities: Opportunities::default(),
            ranked_suggestions: vec![],
            readme_summary: String::new(),
        }
    }

    fn request() -> ProblemRequest {
        ProblemRequest {
            difficulty: Difficulty::Hard,
            problem_type: ProblemType::BugFix,
            time_limit_minutes: 90,
        }
    }

    #[tokio::test]
    async fn test_creation_prompt_and_missing_difficulty() {
        let client = Arc::new(CannedClient::new(r#"{"title": "Fix cart totals", "difficulty": "impossible"}"#));
        let creator = ProblemCreator::new(AgentRole::ProblemCreator.default_settings(), context(client.clone())).unwrap();

        let decoded = creator.create(&report(), request(), None, None).await.unwrap();
        assert!(!decoded.is_failed());
        assert_eq!(decoded.record().difficulty, Difficulty::Hard);

        let prompt = &client.prompts()[0];
        assert!(prompt.contains("Create a hard bug-fix coding assessment"));
        assert!(prompt.contains("within 90 minutes"));
        assert!(prompt.contains("Name: shopfront"));
    }

    #[tokio::test]
    async fn test_refinement_prompt_embeds_original() {
        let client = Arc::new(CannedClient::new(r#"{"title": "Fix cart totals"}"#));
        let creator = ProblemCreator::new(AgentRole::ProblemCreator.default_settings(), context(client.clone())).unwrap();

        let context = ImprovementContext {
            original_problem: ProblemSpec {
                title: "Fix cart totals".into(),
                ..Default::default()
            },
            validation_feedback: ValidationResult {
                overall_score: 70,
                issues: vec!["Rubric points do not add up".into()],
                ..Default::default()
            },
            improvement_instructions: "CRITICAL ISSUES TO FIX:\n1. Rubric points do not add up".into(),
            target_score: 100,
            current_score: 70,
        };

        creator.create(&report(), request(), Some(&context), None).await.unwrap();
        let prompt = &client.prompts()[0];
        assert!(prompt.starts_with("TASK: Refine"));
        assert!(prompt.contains("\"title\": \"Fix cart totals\""));
        assert!(prompt.contains("Rubric points do not add up"));
        assert!(prompt.contains("Problem Type: improvement"));
    }

    #[tokio::test]
    async fn test_unparseable_answer_yields_error_problem() {
        let client = Arc::new(CannedClient::new("{\"title\": \"cut off"));
        let creator = ProblemCreator::new(AgentRole::ProblemCreator.default_settings(), context(client)).unwrap();

        let decoded = creator.create(&report(), request(), None, None).await.unwrap();
        assert!(decoded.is_failed());
        assert_eq!(decoded.record().title, "Error Creating Problem");
        assert_eq!(decoded.record().difficulty, Difficulty::Hard);
    }
}
