use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shopchat_common::Result;

/// A text reply addressed to one recipient on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub to: String,
    pub body: String,
}

impl OutboundMessage {
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: body.into(),
        }
    }
}

/// Send-only interface for delivering replies through a channel.
///
/// Shared via `Arc` between request handlers.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Unique identifier for this channel type.
    fn channel_type(&self) -> &str;

    /// Deliver a message. Failures are returned, never retried.
    async fn send_message(&self, message: &OutboundMessage) -> Result<()>;
}
