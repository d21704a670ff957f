use std::sync::Arc;

use shopchat_agents::ChatRuntime;
use shopchat_config::AppConfig;

/// Shared gateway state, built once at startup.
pub struct AppState {
    pub config: AppConfig,
    pub runtime: Arc<ChatRuntime>,
}

impl AppState {
    pub fn new(config: AppConfig, runtime: Arc<ChatRuntime>) -> Self {
        Self { config, runtime }
    }
}

pub type SharedState = Arc<AppState>;
