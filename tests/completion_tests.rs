use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use groqchat_backend::completion::{ChatTurn, CompletionClient, CompletionError};

fn client(base_url: String, api_key: Option<&str>) -> CompletionClient {
    CompletionClient::new(
        reqwest::Client::new(),
        base_url,
        api_key.map(|k| k.to_string()),
        "llama3-70b-8192".to_string(),
    )
}

fn history() -> Vec<ChatTurn> {
    vec![ChatTurn {
        role: "user".to_string(),
        content: "Hello".to_string(),
    }]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Success path
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn complete_parses_reply_and_usage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "llama3-70b-8192",
            "temperature": 0.7,
            "max_tokens": 2048,
            "messages": [{ "role": "user", "content": "Hello" }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "llama3-70b-8192",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Hi there!" },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 4,
                "total_tokens": 16
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = client(server.uri(), Some("test-key"))
        .complete(&history())
        .await
        .unwrap();

    assert_eq!(completion.content, "Hi there!");
    assert_eq!(completion.model, "llama3-70b-8192");
    assert_eq!(completion.prompt_tokens, 12);
    assert_eq!(completion.completion_tokens, 4);
    assert_eq!(completion.total_tokens, 16);
}

// ═══════════════════════════════════════════════════════════════════════════
//  Provider failures
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn provider_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429).set_body_string(r#"{"error":"rate limit exceeded"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(server.uri(), Some("test-key"))
        .complete(&history())
        .await
        .unwrap_err();

    match err {
        CompletionError::Provider { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limit exceeded"));
        }
        other => panic!("expected Provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_is_a_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3-70b-8192",
            "choices": [],
            "usage": { "prompt_tokens": 1, "completion_tokens": 0, "total_tokens": 1 }
        })))
        .mount(&server)
        .await;

    let err = client(server.uri(), Some("test-key"))
        .complete(&history())
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::Malformed(_)));
}

// ═══════════════════════════════════════════════════════════════════════════
//  Missing credential fails fast — no network call at all
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(server.uri(), None)
        .complete(&history())
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::MissingCredential));
}

// ═══════════════════════════════════════════════════════════════════════════
//  Model listing
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn list_models_returns_the_data_array() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                { "id": "llama3-70b-8192", "object": "model" },
                { "id": "llama3-8b-8192", "object": "model" }
            ]
        })))
        .mount(&server)
        .await;

    let models = client(server.uri(), Some("test-key"))
        .list_models()
        .await
        .unwrap();

    let list = models.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], "llama3-70b-8192");
}
