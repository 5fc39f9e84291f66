//! Turning QA feedback into a refinement request

use crate::schemas::{ImprovementContext, ProblemSpec, ValidationResult};
use std::fmt::Write;

/// Score the refinement aims for
pub const TARGET_SCORE: u32 = 100;

const STRENGTHS_TO_KEEP: usize = 3;

fn numbered(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", heading);
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item);
    }
    out.push('\n');
}

/// Numbered instructions built from the validator's feedback
pub fn improvement_instructions(validation: &ValidationResult) -> String {
    let mut out = String::from(
        "REFINEMENT INSTRUCTIONS:\n\nBased on QA validation, refine the problem by addressing:\n\n",
    );

    numbered(&mut out, "CRITICAL ISSUES TO FIX", &validation.issues);
    numbered(&mut out, "IMPROVEMENTS TO IMPLEMENT", &validation.suggestions);
    numbered(&mut out, "WEAKNESSES TO ADDRESS", &validation.feedback.weaknesses);

    out.push_str("MAINTAIN STRENGTHS:\n");
    for (i, strength) in validation
        .feedback
        .strengths
        .iter()
        .take(STRENGTHS_TO_KEEP)
        .enumerate()
    {
        let _ = writeln!(out, "{}. {}", i + 1, strength);
    }

    out.push_str(
        "\nIMPORTANT: Keep the same difficulty level and problem type, but refine all aspects based on the feedback above.",
    );
    out
}

pub fn improvement_context(problem: &ProblemSpec, validation: &ValidationResult) -> ImprovementContext {
    ImprovementContext {
        original_problem: problem.clone(),
        validation_feedback: validation.clone(),
        improvement_instructions: improvement_instructions(validation),
        target_score: TARGET_SCORE,
        current_score: validation.overall_score,
    }
}
