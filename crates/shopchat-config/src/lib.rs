pub mod loader;
pub mod model;

pub use loader::ConfigLoader;
pub use model::{
    AppConfig, CatalogConfig, GatewayConfig, HistoryBackend, HistoryConfig, InferenceConfig,
    LogConfig, RateLimitConfig, WhatsAppConfig,
};
