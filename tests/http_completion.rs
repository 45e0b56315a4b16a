//! HTTP completion service against a mock server.

use mockito::{Matcher, Server};
use post_screener::client::{
    Choice, CompletionOutcome, CompletionRequest, CompletionService, GenerationParams,
};
use post_screener::transport::HttpCompletionService;
use post_screener::Error;
use serde_json::json;
use std::time::Duration;

fn request(prompts: &[&str]) -> CompletionRequest {
    CompletionRequest {
        model: "gpt-3.5-turbo-instruct".to_string(),
        prompts: prompts.iter().map(|p| p.to_string()).collect(),
        params: GenerationParams::default(),
    }
}

#[tokio::test]
async fn test_success_returns_choices_as_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-3.5-turbo-instruct",
            "prompt": ["first", "second"],
            "max_tokens": 60
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"id":"cmpl-1","choices":[
                {"index":1,"text":" No","finish_reason":"stop"},
                {"index":0,"text":" Yes","finish_reason":"stop"}
            ]}"#,
        )
        .create_async()
        .await;

    let service = HttpCompletionService::new(server.url(), Some("test-key")).unwrap();
    let outcome = service.complete(&request(&["first", "second"])).await.unwrap();

    assert_eq!(
        outcome,
        CompletionOutcome::Choices(vec![Choice::new(1, " No"), Choice::new(0, " Yes")])
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/completions")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_header("retry-after", "20")
        .with_body(
            r#"{"error":{"message":"slow down","type":"requests","code":"rate_limit_exceeded"}}"#,
        )
        .create_async()
        .await;

    let service = HttpCompletionService::new(server.url(), Some("test-key")).unwrap();
    let outcome = service.complete(&request(&["p"])).await.unwrap();

    assert_eq!(
        outcome,
        CompletionOutcome::RateLimited {
            retry_after: Some(Duration::from_secs(20))
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_exhausted_quota_is_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/completions")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error":{"message":"out of credit","type":"insufficient_quota",
                "code":"insufficient_quota"}}"#,
        )
        .create_async()
        .await;

    let service = HttpCompletionService::new(server.url(), Some("test-key")).unwrap();
    let err = service.complete(&request(&["p"])).await.unwrap_err();

    match err {
        Error::Remote { status, class, .. } => {
            assert_eq!(status, 429);
            assert_eq!(class, "quota_exhausted");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_propagates() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let service =
        HttpCompletionService::new(format!("{}/", server.url()), Some("test-key")).unwrap();
    let err = service.complete(&request(&["p"])).await.unwrap_err();

    match err {
        Error::Remote {
            status,
            class,
            message,
        } => {
            assert_eq!(status, 500);
            assert_eq!(class, "server_error");
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unindexed_choices_parse() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"text":"Yes"}]}"#)
        .create_async()
        .await;

    let service = HttpCompletionService::new(server.url(), Some("test-key")).unwrap();
    let outcome = service.complete(&request(&["p"])).await.unwrap();

    assert_eq!(
        outcome,
        CompletionOutcome::Choices(vec![Choice::unindexed("Yes")])
    );
}
