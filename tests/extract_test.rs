//! Response extraction over messy model output

use actualcode::schemas::{decode, CodeAnalysis, Decoded, ProblemSpec, ValidationResult};
use actualcode::{extract, Extraction};
use serde_json::{json, Value};

fn record(text: &str) -> Value {
    match extract(text) {
        Extraction::Record(map) => Value::Object(map),
        Extraction::Failure(failure) => panic!("expected a record, got {:?}", failure),
    }
}

#[test]
fn test_embedded_object_matches_direct_parse() {
    let body = json!({
        "title": "Add caching {with braces}",
        "requirements": ["a", "b \"quoted\""],
        "nested": {"depth": [1, {"x": null}]}
    });
    let raw = serde_json::to_string_pretty(&body).unwrap();

    let wrappers = [
        raw.clone(),
        format!("```json\n{}\n```", raw),
        format!("```JSON\n{}\n```\nHope this helps!", raw),
        format!("```\n{}\n```", raw),
        format!("Sure! Here is the problem:\n\n{}\n\nLet me know.", raw),
        format!("```json\n{}", raw),
        format!("{} trailing prose with a stray }} brace", raw),
    ];

    for text in &wrappers {
        assert_eq!(record(text), body, "failed on {:?}", text);
    }
}

#[test]
fn test_extract_is_total() {
    let inputs = [
        "",
        "   ",
        "no structure at all",
        "{",
        "{\"title\": \"cut off mid",
        "[1, 2, 3]",
        "```json\n```",
        "}{",
        "null",
        "\"just a string\"",
        "{\"a\": 1",
    ];

    for text in inputs {
        match extract(text) {
            Extraction::Record(_) => {}
            Extraction::Failure(failure) => {
                assert!(failure.parse_failed);
                assert!(!failure.error.is_empty(), "empty error for {:?}", text);
                assert!(failure.raw_response.chars().count() <= 1000);
            }
        }
    }
}

#[test]
fn test_raw_response_is_bounded() {
    let text = format!("{{\"title\": \"{}", "x".repeat(5000));
    let Extraction::Failure(failure) = extract(&text) else {
        panic!("truncated object must not parse");
    };
    assert_eq!(failure.raw_response.chars().count(), 1000);
}

#[test]
fn test_failed_decode_keeps_schema_keys() {
    let problem: Decoded<ProblemSpec> = decode("model went off the rails");
    let value = serde_json::to_value(&problem).unwrap();
    for key in ["title", "requirements", "evaluation_rubric", "difficulty", "parse_failed", "error"] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }

    let validation: Decoded<ValidationResult> = decode("```json\n{\"overall_score\": \n```");
    assert!(validation.is_failed());
    assert!(!validation.record().is_approved);

    let code: Decoded<CodeAnalysis> = decode("{\"code_quality\": {\"score\": \"91%\"}}");
    assert_eq!(code.record().code_quality.score, 91);
}
