use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use shopchat_agents::{ChatRuntime, ConversationAssembler, GeminiProvider};
use shopchat_catalog::OdooCatalog;
use shopchat_channels::whatsapp::{WhatsAppCloudSender, WhatsAppOnMessageFn, WhatsAppState};
use shopchat_common::{Error, Result};
use shopchat_config::{
    AppConfig, CatalogConfig, HistoryBackend, HistoryConfig, InferenceConfig, WhatsAppConfig,
};
use shopchat_db::{HistoryStore, RedisHistoryStore, SqliteHistoryStore};
use tracing::{info, warn};

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{name} is not set")))
}

pub fn build_catalog(config: &CatalogConfig) -> Result<OdooCatalog> {
    let catalog = OdooCatalog::new(
        required(&config.url, "catalog.url (ODOO_URL)")?.to_string(),
        required(&config.database, "catalog.database (ODOO_DB)")?.to_string(),
        required(&config.username, "catalog.username (ODOO_USERNAME)")?.to_string(),
        required(&config.api_key, "catalog.api_key (ODOO_API_KEY)")?.to_string(),
    )
    .with_model(config.model.clone())
    .with_timeout(config.timeout_secs.map(Duration::from_secs));
    Ok(catalog)
}

pub fn build_provider(config: &InferenceConfig) -> Result<GeminiProvider> {
    let api_key = required(&config.api_key, "inference.api_key (GOOGLE_API_KEY)")?;
    Ok(
        GeminiProvider::new(api_key.to_string(), Some(config.api_url.clone()))
            .with_timeout(Duration::from_secs(config.timeout_secs)),
    )
}

pub async fn build_history(config: &HistoryConfig) -> Result<Arc<dyn HistoryStore>> {
    let store: Arc<dyn HistoryStore> = match config.backend {
        HistoryBackend::Redis => Arc::new(
            RedisHistoryStore::connect(&config.redis_url)
                .await?
                .with_key_prefix(config.key_prefix.clone()),
        ),
        HistoryBackend::Sqlite => Arc::new(SqliteHistoryStore::open(Path::new(&config.sqlite_path))?),
    };
    info!("history backend: {}", store.backend());
    Ok(store)
}

pub fn build_sender(config: &WhatsAppConfig) -> WhatsAppCloudSender {
    let sender = WhatsAppCloudSender::new(config.api_token.clone(), config.phone_number_id.clone())
        .with_api_base_url(config.api_base_url.clone())
        .with_api_version(config.api_version.clone())
        .with_timeout(config.timeout_secs.map(Duration::from_secs));
    if !sender.is_configured() {
        warn!("WhatsApp api_token or phone_number_id missing; webhook replies will not be delivered");
    }
    sender
}

/// Build the query pipeline from configuration.
///
/// A failed initial catalog login is logged and retried on the next fetch.
pub async fn build_runtime(config: &AppConfig) -> Result<ChatRuntime> {
    let catalog = build_catalog(&config.catalog)?;
    match catalog.connect().await {
        Ok(uid) => info!("catalog session ready (uid {uid})"),
        Err(e) => warn!("failed to connect to catalog at startup: {e}"),
    }

    let provider = build_provider(&config.inference)?;
    let history = build_history(&config.history).await?;

    Ok(ChatRuntime::new(
        Arc::new(catalog),
        Arc::new(provider),
        history,
        config.inference.model.clone(),
    )
    .with_assembler(ConversationAssembler::new(config.inference.instruction.clone()))
    .with_persona(config.inference.persona.clone())
    .with_generation(
        config.inference.temperature,
        config.inference.max_output_tokens,
    )
    .with_max_turns(config.history.max_turns)
    .with_user_serialization(config.history.serialize_per_user))
}

/// Webhook state that answers each inbound text through `runtime`.
pub fn build_whatsapp_state(config: &WhatsAppConfig, runtime: Arc<ChatRuntime>) -> WhatsAppState {
    let on_message: WhatsAppOnMessageFn = Arc::new(move |from, text| {
        let runtime = Arc::clone(&runtime);
        Box::pin(async move { runtime.process_query(&from, &text).await })
    });

    WhatsAppState {
        verify_token: config.verify_token.clone(),
        sender: Arc::new(build_sender(config)),
        on_message,
    }
}
