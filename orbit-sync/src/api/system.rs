//! Health check and the catch-all 404.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use super::error::ApiError;
use crate::context::SyncContext;
use crate::storage::ConfigStore;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub subscribers: usize,
    pub buttons: usize,
    pub durable: bool,
}

pub(crate) async fn health(State(ctx): State<SyncContext>) -> Result<Json<HealthStatus>, ApiError> {
    Ok(Json(HealthStatus {
        status: "ok",
        subscribers: ctx.hub().subscriber_count().await,
        buttons: ctx.synchronizer().count().await?,
        durable: ctx.store().is_durable(),
    }))
}

pub(crate) async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not found",
            "message": "The requested resource does not exist"
        })),
    )
}
