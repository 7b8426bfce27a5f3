//! Provider adapter tests against a mock HTTP server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vidforge_providers::{
    GenerationRequest, KlingProvider, ProviderConfig, ProviderError, RunwayProvider,
    VideoProvider,
};

fn config_for(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_kling_success_returns_video_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/videos/image2video"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "prompt": "a cat surfing" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "video_url": "https://cdn.kling/out.mp4",
                "thumbnail_url": "https://cdn.kling/thumb.jpg",
                "duration": 5.0
            }
        })))
        .mount(&server)
        .await;

    let provider = KlingProvider::new(config_for(&server)).unwrap();
    let request = GenerationRequest::new("a cat surfing")
        .with_source_media("https://example.com/cat.png");

    let output = provider.generate(&request).await.unwrap();
    assert_eq!(output.video_url, "https://cdn.kling/out.mp4");
    assert_eq!(output.thumbnail_url.as_deref(), Some("https://cdn.kling/thumb.jpg"));
}

#[tokio::test]
async fn test_kling_missing_source_media_fails_before_http() {
    let server = MockServer::start().await;
    // No mock mounted: the request must never reach the server.
    let provider = KlingProvider::new(config_for(&server)).unwrap();

    let err = provider
        .generate(&GenerationRequest::new("a cat"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::MissingInput("source_media_url")));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rejection_is_not_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/image_to_video"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("prompt violates content policy"),
        )
        .mount(&server)
        .await;

    let provider = RunwayProvider::new(config_for(&server)).unwrap();
    let err = provider
        .generate(&GenerationRequest::new("something unacceptable"))
        .await
        .unwrap_err();

    match &err {
        ProviderError::Rejected { status, message } => {
            assert_eq!(*status, 400);
            assert!(message.contains("content policy"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/image_to_video"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = RunwayProvider::new(config_for(&server)).unwrap();
    let err = provider
        .generate(&GenerationRequest::new("a dog in space"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Unavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_timeout_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/image_to_video"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(30))
                .set_body_json(json!({ "output": ["https://cdn/late.mp4"] })),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.timeout = Duration::from_millis(200);
    let provider = RunwayProvider::new(config).unwrap();

    let err = provider
        .generate(&GenerationRequest::new("a dog in space"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Timeout(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_response_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/image_to_video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": [] })))
        .mount(&server)
        .await;

    let provider = RunwayProvider::new(config_for(&server)).unwrap();
    let err = provider
        .generate(&GenerationRequest::new("a dog in space"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::InvalidResponse(_)));
    assert!(!err.is_retryable());
}
