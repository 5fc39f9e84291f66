//! Generated assessment problems

use super::{null_default, AgentSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Assessment difficulty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind of work the assessment asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemType {
    #[default]
    Feature,
    BugFix,
    Refactor,
    Optimization,
    /// Used when refining an existing problem
    Improvement,
}

impl ProblemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::Feature => "feature",
            ProblemType::BugFix => "bug-fix",
            ProblemType::Refactor => "refactor",
            ProblemType::Optimization => "optimization",
            ProblemType::Improvement => "improvement",
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "feature" => Ok(ProblemType::Feature),
            "bug-fix" | "bugfix" => Ok(ProblemType::BugFix),
            "refactor" => Ok(ProblemType::Refactor),
            "optimization" => Ok(ProblemType::Optimization),
            "improvement" => Ok(ProblemType::Improvement),
            other => Err(format!("unknown problem type: {}", other)),
        }
    }
}

/// A complete coding assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemSpec {
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub business_context: String,
    #[serde(deserialize_with = "null_default")]
    pub requirements: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub acceptance_criteria: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub starter_code: Vec<StarterFile>,
    #[serde(deserialize_with = "null_default")]
    pub hints: Vec<String>,
    /// Minutes
    #[serde(alias = "estimated_time_minutes", deserialize_with = "lenient_minutes")]
    pub estimated_time: u32,
    pub difficulty: Difficulty,
    #[serde(deserialize_with = "null_default")]
    pub tech_stack: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub evaluation_rubric: Vec<RubricCriterion>,
}

impl ProblemSpec {
    pub fn total_points(&self) -> u32 {
        self.evaluation_rubric.iter().map(|c| c.points).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarterFile {
    #[serde(alias = "path", deserialize_with = "null_default")]
    pub filename: String,
    #[serde(deserialize_with = "null_default")]
    pub content: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RubricCriterion {
    #[serde(deserialize_with = "null_default")]
    pub criterion: String,
    #[serde(deserialize_with = "lenient_minutes")]
    pub points: u32,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
}

impl AgentSchema for ProblemSpec {
    const AGENT: &'static str = "problem_creator";

    fn fallback() -> Self {
        Self {
            title: "Error Creating Problem".to_string(),
            description: "Failed to generate valid problem".to_string(),
            ..Default::default()
        }
    }
}

/// Accept `180`, `180.0` or `"180 minutes"`
fn lenient_minutes<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(0),
        Value::Number(n) => Ok(n.as_f64().unwrap_or(0.0).max(0.0).round() as u32),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid number: {:?}", s)))
        }
        other => Err(serde::de::Error::custom(format!("invalid number: {}", other))),
    }
}
