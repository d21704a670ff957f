use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use shopchat_channels::whatsapp::{
    FALLBACK_REPLY, WhatsAppOnMessageFn, WhatsAppState, whatsapp_router,
};
use shopchat_channels::{ChannelSender, OutboundMessage};
use shopchat_common::{Error, Result};
use tower::ServiceExt;

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<OutboundMessage>>,
}

#[async_trait]
impl ChannelSender for RecordingSender {
    fn channel_type(&self) -> &str {
        "recording"
    }

    async fn send_message(&self, message: &OutboundMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

fn state_with(sender: Arc<RecordingSender>, on_message: WhatsAppOnMessageFn) -> WhatsAppState {
    WhatsAppState {
        verify_token: Some("12345678".to_string()),
        sender,
        on_message,
    }
}

fn echo() -> WhatsAppOnMessageFn {
    Arc::new(|from, text| Box::pin(async move { Ok::<String, Error>(format!("{from} asked: {text}")) }))
}

fn text_event(from: &str, body: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{"changes": [{"value": {"messages": [{
            "from": from,
            "type": "text",
            "text": {"body": body}
        }]}}]}]
    })
}

async fn get(state: WhatsAppState, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(state, request).await
}

async fn post(state: WhatsAppState, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    send(state, request).await
}

async fn send(state: WhatsAppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = whatsapp_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_verify_returns_challenge_as_integer() {
    let state = state_with(Arc::default(), echo());
    let (status, body) = get(
        state,
        "/webhook?hub.mode=subscribe&hub.verify_token=12345678&hub.challenge=1158201444",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(1158201444));
}

#[tokio::test]
async fn test_verify_rejects_wrong_token_or_mode() {
    for uri in [
        "/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1",
        "/webhook?hub.mode=unsubscribe&hub.verify_token=12345678&hub.challenge=1",
        "/webhook?hub.challenge=1",
    ] {
        let (status, body) = get(state_with(Arc::default(), echo()), uri).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body, json!({"error": "Forbidden"}));
    }
}

#[tokio::test]
async fn test_verify_rejects_non_integer_challenge() {
    let (status, _) = get(
        state_with(Arc::default(), echo()),
        "/webhook?hub.mode=subscribe&hub.verify_token=12345678&hub.challenge=abc",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_text_message_is_answered_and_delivered() {
    let sender = Arc::new(RecordingSender::default());
    let (status, body) = post(
        state_with(sender.clone(), echo()),
        text_event("15551234567", "show me laptops").to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "Message processed"}));
    assert_eq!(
        *sender.sent.lock().unwrap(),
        vec![OutboundMessage::text(
            "15551234567",
            "15551234567 asked: show me laptops"
        )]
    );
}

#[tokio::test]
async fn test_payload_without_messages_reports_key() {
    let sender = Arc::new(RecordingSender::default());
    let payload = json!({"entry": [{"changes": [{"value": {"statuses": []}}]}]});
    let (status, body) = post(state_with(sender.clone(), echo()), payload.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Error");
    assert!(body["detail"].as_str().unwrap().contains("'messages'"));
    assert!(sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_error_status() {
    let (status, body) = post(
        state_with(Arc::default(), echo()),
        "not json".to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Error");
}

#[tokio::test]
async fn test_pipeline_failure_sends_fallback() {
    let sender = Arc::new(RecordingSender::default());
    let failing: WhatsAppOnMessageFn = Arc::new(|_, _| {
        Box::pin(async {
            Err::<String, Error>(Error::UpstreamStatus {
                status: 503,
                body: "unavailable".into(),
            })
        })
    });

    let (status, body) = post(
        state_with(sender.clone(), failing),
        text_event("1555", "hello").to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Error");
    assert!(body["detail"].as_str().unwrap().contains("503"));
    assert_eq!(
        *sender.sent.lock().unwrap(),
        vec![OutboundMessage::text("1555", FALLBACK_REPLY)]
    );
}
