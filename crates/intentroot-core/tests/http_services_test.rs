//! HTTP embedder and classifier against a mock OpenAI-compatible server

use intentroot_core::{
    ClassificationContext, Embedder, HttpEmbedder, HttpIntentClassifier, IntentClassifier,
    IntentRootError, LLMClient, LLMServiceConfig, Query, VLLMClient,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_config(server: &MockServer, dims: usize) -> LLMServiceConfig {
    LLMServiceConfig {
        url: server.uri(),
        model: "test-chat".to_string(),
        embedding_url: None,
        embedding_model: "test-embed".to_string(),
        embedding_dimensions: Some(dims),
        api_key: None,
        timeout_secs: 5,
    }
}

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

#[tokio::test]
async fn test_embed_batch_and_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({"model": "test-embed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"embedding": [1.0, 0.0, 0.0]},
                {"embedding": [0.0, 1.0, 0.0]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(VLLMClient::new(service_config(&server, 3)).unwrap());
    let embedder = HttpEmbedder::new(client.clone());
    let texts = vec!["refund".to_string(), "order".to_string()];

    let first = embedder.embed_batch(&texts).await.unwrap();
    assert_eq!(first, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);

    // Served from cache; the mock expects exactly one request
    let second = embedder.embed_batch(&texts).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(embedder.dimensions(), 3);

    let metrics = client.metrics();
    assert_eq!(metrics.cache_hits, 2);
    assert_eq!(metrics.cache_misses, 2);
}

#[tokio::test]
async fn test_embedding_width_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2]}]
        })))
        .mount(&server)
        .await;

    let embedder = HttpEmbedder::from_config(service_config(&server, 4)).unwrap();
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(
        err,
        IntentRootError::InvalidVectorSize {
            expected: 4,
            actual: 2
        }
    ));
}

#[tokio::test]
async fn test_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let embedder = HttpEmbedder::from_config(service_config(&server, 3)).unwrap();
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err, IntentRootError::RateLimited(_)));
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let classifier = HttpIntentClassifier::from_config(service_config(&server, 3)).unwrap();
    let err = classifier
        .classify(&Query::new("hi", "s1"), &ClassificationContext::default())
        .await
        .unwrap_err();
    match err {
        IntentRootError::ServiceUnavailable(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("model crashed"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_api_key_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(chat_reply("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = service_config(&server, 3);
    config.api_key = Some("secret".to_string());
    let client = VLLMClient::new(config).unwrap();
    let reply = client
        .chat_completion(vec![intentroot_core::llm::ChatMessage::user("ping")])
        .await
        .unwrap();
    assert_eq!(reply, "ok");
}

#[tokio::test]
async fn test_classifier_parses_fenced_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "test-chat", "temperature": 0.0})))
        .respond_with(chat_reply(
            "Sure!\n```json\n{\"intent\": \"order_management\", \"confidence\": 0.91}\n```",
        ))
        .mount(&server)
        .await;

    let classifier = HttpIntentClassifier::from_config(service_config(&server, 3)).unwrap();
    let verdict = classifier
        .classify(
            &Query::new("where is my parcel", "s1"),
            &ClassificationContext::default(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(verdict.intent, "order_management");
    assert!((verdict.confidence - 0.91).abs() < 1e-9);
}

#[tokio::test]
async fn test_classifier_unknown_is_no_opinion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_reply("{\"intent\": \"unknown\", \"confidence\": 0.2}"))
        .mount(&server)
        .await;

    let classifier = HttpIntentClassifier::from_config(service_config(&server, 3)).unwrap();
    let verdict = classifier
        .classify(&Query::new("blah", "s1"), &ClassificationContext::default())
        .await
        .unwrap();
    assert!(verdict.is_none());
}

#[tokio::test]
async fn test_unreachable_service() {
    let server = MockServer::start().await;
    let config = service_config(&server, 3);
    drop(server);

    let embedder = HttpEmbedder::from_config(config).unwrap();
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err, IntentRootError::ServiceUnavailable(_)));
}
