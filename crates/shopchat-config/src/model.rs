use serde::{Deserialize, Serialize};
pub use shopchat_common::prompt::{DEFAULT_INSTRUCTION, DEFAULT_PERSONA};

/// Top-level configuration for the shopchat service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub catalog: CatalogConfig,
    pub inference: InferenceConfig,
    pub whatsapp: WhatsAppConfig,
    pub history: HistoryConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit: RateLimitConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-IP request limiting applied to every route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub per_second: u64,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_second: 1,
            burst_size: 60,
        }
    }
}

/// Odoo connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub url: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub api_key: Option<String>,
    /// Odoo model queried for products.
    pub model: String,
    pub timeout_secs: Option<u64>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            database: None,
            username: None,
            api_key: None,
            model: "product.template".to_string(),
            timeout_secs: None,
        }
    }
}

/// Gemini settings and the prompt text wrapped around every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    /// Prepended to the stored history when assembling the conversation.
    pub instruction: String,
    /// Opening line of the shopping prompt sent to the model.
    pub persona: String,
    /// Sent as `generationConfig`; unset leaves the model's own default.
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model: "gemini-2.5-pro-exp-03-25".to_string(),
            timeout_secs: 30,
            instruction: DEFAULT_INSTRUCTION.to_string(),
            persona: DEFAULT_PERSONA.to_string(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

/// WhatsApp Cloud API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    pub api_token: Option<String>,
    pub verify_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub api_base_url: String,
    pub api_version: String,
    pub timeout_secs: Option<u64>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            verify_token: None,
            phone_number_id: None,
            api_base_url: "https://graph.facebook.com".to_string(),
            api_version: "v15.0".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    #[default]
    Redis,
    Sqlite,
}

impl HistoryBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryBackend::Redis => "redis",
            HistoryBackend::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub backend: HistoryBackend,
    pub redis_url: String,
    pub key_prefix: String,
    pub sqlite_path: String,
    /// Keep only the newest N turns per user. Unset means unbounded.
    pub max_turns: Option<usize>,
    /// Serialize queries from the same user inside this process.
    pub serialize_per_user: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::Redis,
            redis_url: "redis://localhost:6379/0".to_string(),
            key_prefix: "chat_history".to_string(),
            sqlite_path: "shopchat-history.db".to_string(),
            max_turns: None,
            serialize_per_user: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
