use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shopchat_catalog::{Catalog, NO_PRODUCTS};
use shopchat_common::Error;
use tracing::error;

use crate::state::SharedState;

/// Error rendered at the HTTP boundary as `{"detail": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// The caller sent a body we could not read.
    BadRequest(String),
    /// A failure from the pipeline or one of its upstreams.
    Pipeline(Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Pipeline(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// HTTP status for a pipeline error. Malformed payloads here come from an
/// upstream response, so they map to 502.
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::AuthFailure(_)
        | Error::UpstreamStatus { .. }
        | Error::Upstream(_)
        | Error::MalformedPayload(_) => StatusCode::BAD_GATEWAY,
        Error::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Config(_)
        | Error::Store(_)
        | Error::Channel(_)
        | Error::Serialization(_)
        | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Pipeline(e) => {
                error!(kind = e.kind(), "request failed: {e}");
                (status_for(&e), e.to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
}

/// POST /query: answer a query and record it in the user's history.
pub async fn query(
    State(state): State<SharedState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = body?;
    let response = state
        .runtime
        .process_query(&request.user_id, &request.query)
        .await?;
    Ok(Json(QueryResponse { response }))
}

/// GET /products: the published catalog as structured records.
pub async fn products(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let body = match state.runtime.available_products().await? {
        Catalog::Empty => json!({ "products": [], "detail": NO_PRODUCTS }),
        Catalog::Products(records) => json!({ "products": records }),
    };
    Ok(Json(body))
}

/// GET /api/status: upstream reachability and the history backend in use.
pub async fn status(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let health = state.runtime.upstream_health().await;
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.runtime.model(),
        "history_backend": state.runtime.history_backend(),
        "catalog": health.catalog,
        "inference": health.inference,
    }))
}
