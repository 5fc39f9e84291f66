//! Typed records exchanged between the pipeline stages

pub mod analysis;
pub mod problem;
pub mod report;
pub mod repository;
pub mod validation;

pub use analysis::*;
pub use problem::*;
pub use report::*;
pub use repository::*;
pub use validation::*;

use crate::extract::{extract, Extraction, FailureRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A record produced by an agent whose output schema has a safe default
pub trait AgentSchema: Sized {
    /// Name of the agent that produces this record
    const AGENT: &'static str;

    /// Default-shaped record used when the model output cannot be decoded
    fn fallback() -> Self;
}

/// Result of decoding one agent response.
///
/// Both variants expose a schema-complete record through [`Decoded::record`];
/// the `Failed` variant additionally carries the failure marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Parsed(T),
    Failed { fallback: T, failure: FailureRecord },
}

impl<T> Decoded<T> {
    pub fn record(&self) -> &T {
        match self {
            Decoded::Parsed(record) => record,
            Decoded::Failed { fallback, .. } => fallback,
        }
    }

    pub fn into_record(self) -> T {
        match self {
            Decoded::Parsed(record) => record,
            Decoded::Failed { fallback, .. } => fallback,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Decoded::Failed { .. })
    }

    pub fn failure(&self) -> Option<&FailureRecord> {
        match self {
            Decoded::Parsed(_) => None,
            Decoded::Failed { failure, .. } => Some(failure),
        }
    }
}

impl<T: AgentSchema> Decoded<T> {
    pub fn failed(failure: FailureRecord) -> Self {
        Decoded::Failed {
            fallback: T::fallback(),
            failure,
        }
    }
}

impl<T: Serialize> Serialize for Decoded<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Marked<'a, R> {
            #[serde(flatten)]
            record: &'a R,
            #[serde(flatten)]
            failure: &'a FailureRecord,
        }

        match self {
            Decoded::Parsed(record) => record.serialize(serializer),
            Decoded::Failed { fallback, failure } => Marked {
                record: fallback,
                failure,
            }
            .serialize(serializer),
        }
    }
}

/// Decode model output into `T`, substituting the fallback record on failure
pub fn decode<T>(text: &str) -> Decoded<T>
where
    T: AgentSchema + DeserializeOwned,
{
    decode_with(text, |_| {})
}

/// Like [`decode`], but lets the caller patch the raw object before it is
/// deserialized
pub fn decode_with<T, F>(text: &str, normalize: F) -> Decoded<T>
where
    T: AgentSchema + DeserializeOwned,
    F: FnOnce(&mut Map<String, Value>),
{
    match extract(text) {
        Extraction::Record(mut map) => {
            normalize(&mut map);
            match serde_json::from_value::<T>(Value::Object(map)) {
                Ok(record) => Decoded::Parsed(record),
                Err(e) => Decoded::failed(FailureRecord::new(
                    format!("schema mismatch for {}: {}", T::AGENT, e),
                    text,
                )),
            }
        }
        Extraction::Failure(failure) => Decoded::failed(failure),
    }
}

/// Deserialize a 0-100 score from an integer, float or numeric string
pub(crate) fn lenient_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Null => 0.0,
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid score: {:?}", s)))?,
        other => {
            return Err(serde::de::Error::custom(format!(
                "invalid score: {}",
                other
            )))
        }
    };
    Ok(raw.round().clamp(0.0, 100.0) as u32)
}

/// Deserialize a value that may be explicitly `null` into its default
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn keys(value: &Value) -> BTreeSet<String> {
        value
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn assert_stable_keys<T>(good: &str)
    where
        T: AgentSchema + DeserializeOwned + Serialize + std::fmt::Debug,
    {
        let parsed: Decoded<T> = decode(good);
        assert!(!parsed.is_failed(), "{:?}", parsed);
        let failed: Decoded<T> = decode("the model refused");
        assert!(failed.is_failed());

        let parsed_keys = keys(&serde_json::to_value(&parsed).unwrap());
        let mut failed_keys = keys(&serde_json::to_value(&failed).unwrap());
        for marker in ["parse_failed", "error", "raw_response"] {
            assert!(failed_keys.remove(marker), "missing marker {}", marker);
        }
        assert_eq!(parsed_keys, failed_keys, "key drift for {}", T::AGENT);
    }

    #[test]
    fn test_default_records_keep_schema_keys() {
        assert_stable_keys::<CodeAnalysis>(r#"{"architecture": {"pattern": "MVC"}}"#);
        assert_stable_keys::<PrAnalysis>(r#"{"suggested_problems": [{"title": "A"}]}"#);
        assert_stable_keys::<IssueAnalysis>(r#"{"categories": {"bugs": {"count": 2}}}"#);
        assert_stable_keys::<DependencyAnalysis>(r#"{"tech_stack": {"runtime": "Node"}}"#);
        assert_stable_keys::<ProblemSpec>(r#"{"title": "T", "difficulty": "hard"}"#);
        assert_stable_keys::<ValidationResult>(r#"{"overall_score": 90}"#);
    }

    #[test]
    fn test_schema_mismatch_is_failure() {
        let decoded: Decoded<CodeAnalysis> = decode(r#"{"architecture": "layered"}"#);
        let failure = decoded.failure().expect("mismatch should fail");
        assert!(failure.error.contains("code_analyzer"));
        assert_eq!(decoded.record().code_quality.score, 50);
    }

    #[test]
    fn test_lenient_score() {
        let v: ValidationResult =
            serde_json::from_value(json!({"overall_score": "87.6", "scores": {"quality": 140}}))
                .unwrap();
        assert_eq!(v.overall_score, 88);
        assert_eq!(v.scores.quality, 100);
    }

    #[test]
    fn test_decode_with_normalizer() {
        let decoded: Decoded<ProblemSpec> = decode_with(r#"{"title": "X"}"#, |map| {
            map.insert("difficulty".into(), json!("expert"));
        });
        assert_eq!(decoded.record().difficulty, Difficulty::Expert);
    }
}
