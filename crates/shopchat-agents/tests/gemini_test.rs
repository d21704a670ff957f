use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use shopchat_agents::conversation::DEFAULT_INSTRUCTION;
use shopchat_agents::{ChatRuntime, GeminiProvider, LlmProvider, LlmRequest};
use shopchat_catalog::{Catalog, CatalogSource, ProductRecord};
use shopchat_common::{Error, Result};
use shopchat_db::{HistoryStore, SqliteHistoryStore};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-test";

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5}
    })
}

fn provider_for(server: &MockServer) -> GeminiProvider {
    GeminiProvider::new("test-key".to_string(), Some(server.uri()))
}

struct OneLaptop;

#[async_trait]
impl CatalogSource for OneLaptop {
    fn source_id(&self) -> &str {
        "static"
    }

    async fn fetch_available_products(&self) -> Result<Catalog> {
        Ok(Catalog::from_records(vec![ProductRecord {
            id: 1,
            name: "Laptop X".to_string(),
            sku: None,
            price: 999.99,
            description: None,
        }]))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn test_complete_extracts_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/models/{MODEL}:generateContent")))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({"contents": [{"parts": [{"text": "hello"}]}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider_for(&server)
        .complete(&LlmRequest::new(MODEL, "hello"))
        .await
        .unwrap();

    assert_eq!(response.text, "Hi there");
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    let usage = response.usage.unwrap();
    assert_eq!((usage.input_tokens, usage.output_tokens), (12, 5));
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .complete(&LlmRequest::new(MODEL, "hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UpstreamStatus { status: 429, .. }));
    assert!(err.to_string().contains("429"));
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn test_missing_candidates_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .complete(&LlmRequest::new(MODEL, "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedPayload(_)), "got {err:?}");
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .with_timeout(Duration::from_millis(100))
        .complete(&LlmRequest::new(MODEL, "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_health_check_lists_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;

    assert!(provider_for(&server).health_check().await.unwrap());
}

#[tokio::test]
async fn test_laptop_question_carries_context_and_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/models/{MODEL}:generateContent")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_reply("Laptop X costs $999.99.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(SqliteHistoryStore::in_memory().unwrap());
    let runtime = ChatRuntime::new(
        Arc::new(OneLaptop),
        Arc::new(provider_for(&server)),
        store.clone(),
        MODEL,
    );

    let reply = runtime.process_query("15550001", "show me laptops").await.unwrap();
    assert_eq!(reply, "Laptop X costs $999.99.");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains(&format!("{DEFAULT_INSTRUCTION}\nUser: show me laptops")));
    assert!(prompt.contains("Product: Laptop X"));
    assert!(prompt.contains("Price: $999.99"));

    let turns = store.read_all("15550001").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].to_string(), "AI: Laptop X costs $999.99.");
}
