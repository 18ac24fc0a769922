//! Headless browser capture, delegated to the configured [`Capturer`].
//!
//! [`Capturer`]: crate::hooks::Capturer

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;

use super::authorize;
use super::error::ApiError;
use crate::context::SyncContext;
use crate::error::SyncError;

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub status: &'static str,
    pub url: String,
    /// Captured bytes, base64 encoded
    pub content: String,
}

pub(crate) async fn capture_browser(
    State(ctx): State<SyncContext>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CaptureResponse>, ApiError> {
    authorize(&ctx, &headers).await?;

    let Json(raw) = body.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let url = match raw.get("url").and_then(Value::as_str).map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return Err(ApiError::validation("missing url")),
    };

    log::info!("Capturing content from URL: {url}");
    let bytes = ctx.capturer().capture(&url).await.map_err(|e| {
        log::error!("Error capturing browser content from {url}: {e}");
        ApiError::from(SyncError::from(e))
    })?;

    Ok(Json(CaptureResponse {
        status: "success",
        url,
        content: STANDARD.encode(bytes),
    }))
}
