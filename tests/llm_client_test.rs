//! Chat-completions client against a mock HTTP server

use actualcode::config::LlmSettings;
use actualcode::llm::BreakerState;
use actualcode::{ChatCompletionsClient, CompletionRequest, LlmError, TextCompletion};
use mockito::{Matcher, Server};
use serde_json::json;

const PATH: &str = "/v1/chat/completions";

fn settings(server: &Server, failures: usize) -> LlmSettings {
    LlmSettings {
        api_url: format!("{}{}", server.url(), PATH),
        retry_attempts: 2,
        retry_backoff_ms: 1,
        circuit_breaker_failures: failures,
        ..Default::default()
    }
}

fn request() -> CompletionRequest<'static> {
    CompletionRequest {
        agent: "qa_validator",
        model: "gemini-2.5-flash",
        system_instruction: "You are a reviewer.",
        prompt: "Validate this coding problem",
        temperature: 0.3,
        max_tokens: 512,
    }
}

#[tokio::test]
async fn test_successful_completion() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gemini-2.5-flash",
            "max_tokens": 512,
            "messages": [
                {"role": "system", "content": "You are a reviewer."},
                {"role": "user", "content": "Validate this coding problem"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"overall_score\": 91}"}, "finish_reason": "stop"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = ChatCompletionsClient::with_api_key(&settings(&server, 5), "test-key").unwrap();
    let text = client.generate(request()).await.unwrap();

    assert_eq!(text, "{\"overall_score\": 91}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(503)
        .with_body("overloaded")
        .expect(3)
        .create_async()
        .await;

    let client = ChatCompletionsClient::with_api_key(&settings(&server, 10), "test-key").unwrap();
    let err = client.generate(request()).await.unwrap_err();

    assert!(matches!(err, LlmError::Upstream { status: 503, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(401)
        .with_body("bad key")
        .expect(1)
        .create_async()
        .await;

    let client = ChatCompletionsClient::with_api_key(&settings(&server, 10), "wrong").unwrap();
    let err = client.generate(request()).await.unwrap_err();

    assert!(matches!(err, LlmError::Upstream { status: 401, ref body } if body == "bad key"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_choices() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let client = ChatCompletionsClient::with_api_key(&settings(&server, 10), "test-key").unwrap();
    assert!(matches!(
        client.generate(request()).await,
        Err(LlmError::EmptyCompletion)
    ));
}

#[tokio::test]
async fn test_open_breaker_short_circuits() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(400)
        .expect(1)
        .create_async()
        .await;

    let client = ChatCompletionsClient::with_api_key(&settings(&server, 1), "test-key").unwrap();
    assert!(client.generate(request()).await.is_err());
    assert_eq!(client.breaker().state(), BreakerState::Open);

    let err = client.generate(request()).await.unwrap_err();
    assert!(matches!(err, LlmError::CircuitOpen(_)));
    mock.assert_async().await;
}
