pub mod traits;
#[cfg(feature = "whatsapp")]
pub mod whatsapp;

pub use traits::{ChannelSender, OutboundMessage};
