//! QA validator: scores a generated problem and decides approval

use super::{clip, Agent, AgentContext, AgentRole, RunOptions};
use crate::a2a::MessageType;
use crate::config::AgentSettings;
use crate::error::ConfigError;
use crate::llm::LlmError;
use crate::metrics::METRICS;
use crate::schemas::{decode_with, Decoded, ProblemSpec, SynthesizedReport, ValidationResult};
use serde_json::{json, Map, Value};
use tracing::{error, info};

pub(crate) const INSTRUCTION: &str = r#"You are a quality assurance reviewer for technical coding assessments.

Score the problem from 0 to 100 on four dimensions:
- feasibility: can it be completed in the stated time, is the difficulty right, are the requirements achievable
- quality: clarity, complete acceptance criteria, helpful starter code, realistic business context
- technical: correct technologies, accurate technical requirements, sensible architecture
- educational: meaningful skills tested, fair evaluation, good learning experience

List concrete issues and suggestions, and note strengths, weaknesses and improvements.

Return ONLY a JSON object:
{
  "is_approved": true,
  "overall_score": 90,
  "scores": {"feasibility": 90, "quality": 90, "technical": 90, "educational": 90},
  "issues": ["..."],
  "suggestions": ["..."],
  "feedback": {"strengths": ["..."], "weaknesses": ["..."], "improvements": ["..."]}
}"#;

const DIMENSIONS: [&str; 4] = ["feasibility", "quality", "technical", "educational"];

pub struct QaValidator {
    agent: Agent,
    threshold: u32,
}

impl QaValidator {
    pub fn new(settings: AgentSettings, ctx: AgentContext, threshold: u32) -> Result<Self, ConfigError> {
        if threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "quality threshold {} above 100",
                threshold
            )));
        }
        Ok(Self {
            agent: Agent::new(AgentRole::QaValidator, settings, ctx)?,
            threshold,
        })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Score `problem`; approval is recomputed from the overall score.
    ///
    /// A verdict that cannot be decoded is never approved, whatever the
    /// threshold.
    pub async fn validate(
        &self,
        problem: &ProblemSpec,
        report: &SynthesizedReport,
        conversation_id: Option<&str>,
    ) -> Result<Decoded<ValidationResult>, LlmError> {
        info!("Validating '{}'", problem.title);
        self.agent.notify(
            conversation_id,
            "orchestrator",
            MessageType::Notification,
            json!({"status": "validating", "problem_title": problem.title}),
        );

        let prompt = self.build_prompt(problem, report);
        let text = self
            .agent
            .run(&prompt, RunOptions::conversation(conversation_id))
            .await?;

        let mut decoded = decode_with::<ValidationResult, _>(&text, fill_overall_score);
        match &mut decoded {
            Decoded::Parsed(result) => {
                result.apply_threshold(self.threshold);
                info!(
                    "Validation: score {} ({})",
                    result.overall_score,
                    if result.is_approved { "approved" } else { "needs work" }
                );
            }
            Decoded::Failed { fallback, failure } => {
                fallback.is_approved = false;
                METRICS.record_decode_failure(self.agent.name());
                error!("Failed to parse validation: {}", failure.error);
            }
        }

        let result = decoded.record();
        self.agent.notify(
            conversation_id,
            "orchestrator",
            MessageType::Response,
            json!({
                "status": "completed",
                "approved": result.is_approved,
                "overall_score": result.overall_score,
                "scores": result.scores,
            }),
        );

        Ok(decoded)
    }

    fn build_prompt(&self, problem: &ProblemSpec, report: &SynthesizedReport) -> String {
        let profile = &report.repository_profile;
        format!(
            "Validate this coding problem:\n\n\
             Title: {title}\n\
             Description: {description}\n\
             Tech Stack: {stack}\n\
             Difficulty: {difficulty}\n\
             Estimated Time: {minutes} minutes\n\
             Requirements: {requirements} items\n\
             Acceptance Criteria: {criteria} items\n\
             Starter Files: {starter} files\n\
             Rubric Points: {points}\n\n\
             Repository Context:\n\
             Name: {repo}\n\
             Language: {language}\n\
             Technologies: {technologies}\n\n\
             Rate feasibility, quality, technical accuracy and educational value from 0 to 100.\n\
             Approve only if the overall score is at least {threshold}.\n\
             Return ONLY valid JSON matching the specified format.",
            title = problem.title,
            description = clip(&problem.description, 300),
            stack = json!(problem.tech_stack),
            difficulty = problem.difficulty,
            minutes = problem.estimated_time,
            requirements = problem.requirements.len(),
            criteria = problem.acceptance_criteria.len(),
            starter = problem.starter_code.len(),
            points = problem.total_points(),
            repo = profile.name,
            language = profile.language,
            technologies = json!(profile.tech_stack.technologies()),
            threshold = self.threshold,
        )
    }
}

/// Derive a missing overall score from the rounded mean of the dimension
/// scores that are present
fn fill_overall_score(map: &mut Map<String, Value>) {
    if map.get("overall_score").map_or(false, |v| !v.is_null()) {
        return;
    }
    let present: Vec<f64> = match map.get("scores").and_then(Value::as_object) {
        Some(scores) => DIMENSIONS
            .iter()
            .filter_map(|d| scores.get(*d))
            .filter_map(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
                _ => None,
            })
            .collect(),
        None => return,
    };
    if present.is_empty() {
        return;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    map.insert("overall_score".to_string(), json!(mean.round()));
}
