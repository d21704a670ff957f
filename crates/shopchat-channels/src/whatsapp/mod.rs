pub mod cloud;
pub mod payload;
pub mod webhook;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use shopchat_common::Result;

pub use cloud::WhatsAppCloudSender;
pub use payload::{InboundMessage, parse_inbound};
pub use webhook::{FALLBACK_REPLY, WhatsAppState, whatsapp_router, whatsapp_verify, whatsapp_webhook};

/// Callback invoked for each inbound text: `(sender_id, text) -> reply`.
pub type WhatsAppOnMessageFn = Arc<
    dyn Fn(String, String) -> Pin<Box<dyn Future<Output = Result<String>> + Send>>
        + Send
        + Sync,
>;
