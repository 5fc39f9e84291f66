//! Recovery of JSON records from free-form model output
//!
//! Models wrap their answers in prose, markdown fences, or simply run out of
//! tokens half-way through an object. [`extract`] tries progressively looser
//! strategies and never fails: it yields either a JSON object or a
//! [`FailureRecord`] describing why nothing usable was found.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of characters of the raw response kept in a failure record
pub const RAW_RESPONSE_LIMIT: usize = 1000;

/// Outcome of an extraction attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A JSON object was recovered
    Record(Map<String, Value>),
    /// Nothing parseable was found
    Failure(FailureRecord),
}

impl Extraction {
    pub fn is_failure(&self) -> bool {
        matches!(self, Extraction::Failure(_))
    }

    /// Convert into a JSON value; failures become their marker object
    pub fn into_value(self) -> Value {
        match self {
            Extraction::Record(map) => Value::Object(map),
            Extraction::Failure(failure) => {
                serde_json::to_value(failure).unwrap_or(Value::Null)
            }
        }
    }
}

/// Marker carried by records that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub parse_failed: bool,
    pub error: String,
    pub raw_response: String,
}

impl FailureRecord {
    pub fn new(error: impl Into<String>, raw: &str) -> Self {
        Self {
            parse_failed: true,
            error: error.into(),
            raw_response: raw.chars().take(RAW_RESPONSE_LIMIT).collect(),
        }
    }
}

/// Extract the first JSON object from model output
pub fn extract(text: &str) -> Extraction {
    if text.trim().is_empty() {
        return Extraction::Failure(FailureRecord::new("empty response", text));
    }

    let fenced = strip_fence(text);
    let mut last_error = match parse_object(fenced) {
        Ok(map) => return Extraction::Record(map),
        Err(e) => e,
    };

    let mut candidates = vec![fenced];
    if fenced.len() != text.len() {
        candidates.push(text);
    }

    for candidate in candidates {
        let Some(start) = candidate.find('{') else {
            continue;
        };
        let Some(object) = balanced_prefix(&candidate[start..]) else {
            last_error = "unbalanced braces in response".to_string();
            continue;
        };
        match parse_object(object) {
            Ok(map) => return Extraction::Record(map),
            Err(e) => last_error = e,
        }
    }

    Extraction::Failure(FailureRecord::new(last_error, text))
}

fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, found {}", kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Return the inner content of the first fenced block, preferring a `json`
/// labelled fence. Text without a fence is returned unchanged.
fn strip_fence(text: &str) -> &str {
    let (open, labelled) = match find_ignore_case(text, "```json") {
        Some(idx) => (idx + "```json".len(), true),
        None => match text.find("```") {
            Some(idx) => (idx + 3, false),
            None => return text,
        },
    };

    let mut body = &text[open..];
    if !labelled {
        // Skip an info string such as "javascript" on the fence line.
        if let Some(newline) = body.find('\n') {
            let info = body[..newline].trim();
            if !info.is_empty() && info.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                body = &body[newline + 1..];
            }
        }
    }

    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

/// Slice of `text` (which starts at an opening brace) up to the point where
/// brace depth first returns to zero. Braces inside string literals are
/// ignored.
fn balanced_prefix(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}
