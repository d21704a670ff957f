use serde_json::Value;
use shopchat_common::{Error, Result};

/// The first text message of a WhatsApp Cloud API webhook notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender phone number (wa_id).
    pub from: String,
    pub text: String,
    pub message_id: Option<String>,
    pub phone_number_id: Option<String>,
}

/// Extract `entry[0].changes[0].value.messages[0]` from a webhook body.
///
/// Any missing key fails with `MalformedPayload` naming that key, e.g.
/// status-only notifications fail on `'messages'`.
pub fn parse_inbound(payload: &Value) -> Result<InboundMessage> {
    let value = first(payload, "entry")
        .and_then(|entry| first(entry, "changes"))
        .and_then(|change| key(change, "value"))?;

    let message = first(value, "messages")?;
    let from = string(message, "from")?;
    let text = key(message, "text").and_then(|text| string(text, "body"))?;

    Ok(InboundMessage {
        from,
        text,
        message_id: message.get("id").and_then(Value::as_str).map(str::to_string),
        phone_number_id: value
            .get("metadata")
            .and_then(|m| m.get("phone_number_id"))
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn missing(name: &str) -> Error {
    Error::MalformedPayload(format!("missing key '{name}' in webhook payload"))
}

fn key<'a>(value: &'a Value, name: &str) -> Result<&'a Value> {
    value.get(name).ok_or_else(|| missing(name))
}

fn first<'a>(value: &'a Value, name: &str) -> Result<&'a Value> {
    key(value, name)?
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| missing(name))
}

fn string(value: &Value, name: &str) -> Result<String> {
    key(value, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::MalformedPayload(format!("key '{name}' is not a string")))
}
