//! QA verdicts on generated problems

use super::{lenient_score, null_default, AgentSchema};
use serde::{Deserialize, Serialize};

/// Default approval threshold
pub const DEFAULT_THRESHOLD: u32 = 85;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationResult {
    /// Recomputed from `overall_score` after decoding
    #[serde(deserialize_with = "null_default")]
    pub is_approved: bool,
    #[serde(deserialize_with = "lenient_score")]
    pub overall_score: u32,
    #[serde(deserialize_with = "null_default")]
    pub scores: DimensionScores,
    #[serde(deserialize_with = "null_default")]
    pub issues: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub suggestions: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub feedback: Feedback,
}

impl ValidationResult {
    /// Replace the model's verdict with `overall_score >= threshold`
    pub fn apply_threshold(&mut self, threshold: u32) -> bool {
        self.is_approved = self.overall_score >= threshold;
        self.is_approved
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionScores {
    #[serde(deserialize_with = "lenient_score")]
    pub feasibility: u32,
    #[serde(deserialize_with = "lenient_score")]
    pub quality: u32,
    #[serde(deserialize_with = "lenient_score")]
    pub technical: u32,
    #[serde(deserialize_with = "lenient_score")]
    pub educational: u32,
}

impl DimensionScores {
    /// Rounded mean of the four dimensions
    pub fn mean(&self) -> u32 {
        let sum = self.feasibility + self.quality + self.technical + self.educational;
        (sum as f64 / 4.0).round() as u32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feedback {
    #[serde(deserialize_with = "null_default")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub improvements: Vec<String>,
}

impl AgentSchema for ValidationResult {
    const AGENT: &'static str = "qa_validator";

    fn fallback() -> Self {
        Self {
            is_approved: false,
            overall_score: 0,
            scores: DimensionScores::default(),
            issues: vec!["Failed to parse validation response".to_string()],
            suggestions: vec![],
            feedback: Feedback {
                weaknesses: vec!["Validation error".to_string()],
                ..Default::default()
            },
        }
    }
}
