use serde_json::json;
use shopchat_channels::whatsapp::WhatsAppCloudSender;
use shopchat_channels::{ChannelSender, OutboundMessage};
use shopchat_common::Error;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sender_for(server: &MockServer) -> WhatsAppCloudSender {
    WhatsAppCloudSender::new(Some("wa-token".into()), Some("1234".into()))
        .with_api_base_url(server.uri())
}

#[tokio::test]
async fn test_send_posts_text_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v15.0/1234/messages"))
        .and(header("authorization", "Bearer wa-token"))
        .and(body_json(json!({
            "messaging_product": "whatsapp",
            "to": "15551234567",
            "type": "text",
            "text": {"body": "Laptop X costs $999.99."}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messaging_product": "whatsapp",
            "messages": [{"id": "wamid.out"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    sender_for(&server)
        .send_message(&OutboundMessage::text("15551234567", "Laptop X costs $999.99."))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_send_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let err = sender_for(&server)
        .send_message(&OutboundMessage::text("1555", "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UpstreamStatus { status: 401, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_custom_api_version() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/1234/messages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    sender_for(&server)
        .with_api_version("v21.0")
        .send_message(&OutboundMessage::text("1555", "hi"))
        .await
        .unwrap();
}
