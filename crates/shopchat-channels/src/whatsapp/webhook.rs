use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use shopchat_security::verify_token_matches;
use tracing::{debug, error, info, warn};

use super::WhatsAppOnMessageFn;
use super::payload::parse_inbound;
use crate::traits::{ChannelSender, OutboundMessage};

/// Sent to the user when their message could not be answered.
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't process your message right now. Please try again later.";

/// Shared state for the WhatsApp webhook routes.
#[derive(Clone)]
pub struct WhatsAppState {
    pub verify_token: Option<String>,
    pub sender: Arc<dyn ChannelSender>,
    pub on_message: WhatsAppOnMessageFn,
}

/// `GET /webhook` and `POST /webhook` bound to `state`.
pub fn whatsapp_router(state: WhatsAppState) -> Router {
    Router::new()
        .route("/webhook", get(whatsapp_verify).post(whatsapp_webhook))
        .with_state(state)
}

/// Subscription handshake: echo `hub.challenge` as an integer when the mode
/// is `subscribe` and the verify token matches.
pub async fn whatsapp_verify(
    State(state): State<WhatsAppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);

    if mode != Some("subscribe") || !verify_token_matches(state.verify_token.as_deref(), token) {
        warn!("webhook verification rejected (mode: {mode:?})");
        return (StatusCode::FORBIDDEN, Json(json!({"error": "Forbidden"}))).into_response();
    }

    match params.get("hub.challenge").map(|c| c.parse::<i64>()) {
        Some(Ok(challenge)) => {
            info!("webhook verified");
            Json(challenge).into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "hub.challenge must be an integer"})),
        )
            .into_response(),
    }
}

/// Inbound notification: answer the first text message and post the reply
/// back through the sender. Always answers 200 so the provider does not
/// redeliver.
pub async fn whatsapp_webhook(State(state): State<WhatsAppState>, body: Bytes) -> Json<Value> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            error!("webhook body is not JSON: {e}");
            return error_status(format!("invalid JSON body: {e}"));
        }
    };
    debug!("received webhook event: {payload}");

    let inbound = match parse_inbound(&payload) {
        Ok(inbound) => inbound,
        Err(e) => {
            error!("{e}");
            return error_status(e.to_string());
        }
    };
    debug!("message from {}: {}", inbound.from, inbound.text);

    let reply = (state.on_message)(inbound.from.clone(), inbound.text).await;

    match reply {
        Ok(reply) => {
            deliver(&state, OutboundMessage::text(inbound.from, reply)).await;
            Json(json!({"status": "Message processed"}))
        }
        Err(e) => {
            error!("failed to answer {}: {e}", inbound.from);
            deliver(&state, OutboundMessage::text(inbound.from, FALLBACK_REPLY)).await;
            error_status(e.to_string())
        }
    }
}

async fn deliver(state: &WhatsAppState, message: OutboundMessage) {
    if let Err(e) = state.sender.send_message(&message).await {
        error!(
            "could not deliver {} reply to {}: {e}",
            state.sender.channel_type(),
            message.to
        );
    }
}

fn error_status(detail: String) -> Json<Value> {
    Json(json!({"status": "Error", "detail": detail}))
}
