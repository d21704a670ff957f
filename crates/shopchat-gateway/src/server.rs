use std::net::SocketAddr;
use std::sync::Arc;

use shopchat_common::{Error, Result};
use shopchat_config::AppConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::bootstrap;
use crate::router::build_router;
use crate::state::AppState;

/// Owns startup: builds components, binds the listener and serves until Ctrl-C.
pub struct GatewayServer {
    config: AppConfig,
}

impl GatewayServer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.gateway.host, self.config.gateway.port);

        let runtime = Arc::new(bootstrap::build_runtime(&self.config).await?);
        let whatsapp_state = bootstrap::build_whatsapp_state(&self.config.whatsapp, runtime.clone());
        let state = Arc::new(AppState::new(self.config, runtime));
        let app = build_router(state, whatsapp_state)?;

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind {addr}: {e}")))?;
        info!("shopchat gateway listening on {addr}");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
