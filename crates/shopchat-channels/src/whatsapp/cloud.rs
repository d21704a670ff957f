use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use shopchat_common::{Error, Result};
use tracing::{error, info};

use crate::traits::{ChannelSender, OutboundMessage};

pub const DEFAULT_API_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v15.0";

/// Sends text replies through the WhatsApp Business Cloud API.
#[derive(Clone)]
pub struct WhatsAppCloudSender {
    client: Client,
    api_token: Option<String>,
    phone_number_id: Option<String>,
    api_base_url: String,
    api_version: String,
    timeout: Option<Duration>,
}

impl WhatsAppCloudSender {
    pub fn new(api_token: Option<String>, phone_number_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_token,
            phone_number_id,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: None,
        }
    }

    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_token.is_some() && self.phone_number_id.is_some()
    }

    fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{phone_number_id}/messages",
            self.api_base_url, self.api_version
        )
    }
}

#[async_trait]
impl ChannelSender for WhatsAppCloudSender {
    fn channel_type(&self) -> &str {
        "whatsapp"
    }

    async fn send_message(&self, message: &OutboundMessage) -> Result<()> {
        let (Some(token), Some(phone_number_id)) = (&self.api_token, &self.phone_number_id)
        else {
            return Err(Error::Config(
                "WhatsApp api_token and phone_number_id must be set to send replies".into(),
            ));
        };

        let payload = json!({
            "messaging_product": "whatsapp",
            "to": message.to,
            "type": "text",
            "text": {"body": message.body},
        });

        let mut request = self
            .client
            .post(self.messages_url(phone_number_id))
            .bearer_auth(token)
            .json(&payload);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::from_request("WhatsApp send failed", e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            info!("message sent to {}: {body}", message.to);
            Ok(())
        } else {
            error!("failed to send message to {}: {status}, {body}", message.to);
            Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}
