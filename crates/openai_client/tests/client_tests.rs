//! Classification tests for OpenAiClient against a mocked upstream.

use chat_core::{CompletionClient, CompletionError, Message};
use openai_client::OpenAiClient;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new("sk-test")
        .with_base_url(server.uri())
        .with_model("gpt-4o-mini")
}

fn transcript() -> Vec<Message> {
    vec![Message::system("You are a helpful assistant."), Message::user("Hello")]
}

#[tokio::test]
async fn success_returns_trimmed_reply_and_token_usage() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "\n\nHi there  "},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 3, "total_tokens": 23}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let completion = client_for(&mock_server)
        .complete(&transcript())
        .await
        .unwrap();

    assert_eq!(completion.reply, "Hi there");
    assert_eq!(completion.total_tokens, Some(23));
}

#[tokio::test]
async fn http_429_maps_to_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"error": {"message": "Rate limit reached", "type": "rate_limit_error"}}"#,
        ))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .complete(&transcript())
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::RateLimited));
    assert!(err.is_transient());
}

#[tokio::test]
async fn http_5xx_maps_to_transient_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .complete(&transcript())
        .await
        .unwrap_err();

    match err {
        CompletionError::Upstream { status, ref message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream overloaded");
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn oversized_multibyte_error_body_still_classifies_as_upstream() {
    let mock_server = MockServer::start().await;

    // A Polish diacritic straddles the snippet cut point.
    let body = format!("{}łódź overloaded", "a".repeat(199));
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string(body))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .complete(&transcript())
        .await
        .unwrap_err();

    match err {
        CompletionError::Upstream { status, ref message } => {
            assert_eq!(status, 500);
            assert!(message.len() <= 200);
            assert!(message.starts_with("aaa"));
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_maps_to_fatal_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .complete(&transcript())
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::InvalidResponse(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn empty_choices_map_to_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .complete(&transcript())
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::InvalidResponse(_)));
}
