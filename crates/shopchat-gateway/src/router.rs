use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use shopchat_channels::whatsapp::{WhatsAppState, whatsapp_router};
use shopchat_common::{Error, Result};
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::SharedState;

/// Build the application router with all routes.
pub fn build_router(state: SharedState, whatsapp_state: WhatsAppState) -> Result<Router> {
    let rate_limit = state.config.gateway.rate_limit.clone();

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/query", post(api::query))
        .route("/products", get(api::products))
        .route("/api/status", get(api::status))
        .with_state(state)
        .merge(whatsapp_router(whatsapp_state));

    if rate_limit.enabled {
        // Per-IP limit; needs the peer address from `into_make_service_with_connect_info`.
        let governor_conf = GovernorConfigBuilder::default()
            .per_second(rate_limit.per_second)
            .burst_size(rate_limit.burst_size)
            .finish()
            .ok_or_else(|| Error::Config("invalid rate limit settings".into()))?;
        let governor_limiter = governor_conf.limiter().clone();

        // Forget rate-limiter state for inactive IPs.
        tokio::spawn(async move {
            let interval = Duration::from_secs(60);
            loop {
                tokio::time::sleep(interval).await;
                governor_limiter.retain_recent();
            }
        });

        router = router.layer(GovernorLayer::new(governor_conf));
    }

    Ok(router.layer(TraceLayer::new_for_http()))
}

async fn health() -> &'static str {
    "ok"
}
