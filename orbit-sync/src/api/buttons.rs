//! Button configuration endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::Value;
use std::collections::BTreeMap;

use super::error::ApiError;
use super::{authorize, ApiResponse};
use crate::context::SyncContext;
use crate::model::ButtonConfig;

pub(crate) async fn update_button_config(
    State(ctx): State<SyncContext>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<ButtonConfig>>, ApiError> {
    authorize(&ctx, &headers).await?;

    let Json(raw) = body.map_err(|rejection| {
        log::warn!("Rejected button config body: {}", rejection.body_text());
        ApiError::validation(rejection.body_text())
    })?;

    let stored = ctx.synchronizer().apply_update(raw).await?;
    Ok(Json(ApiResponse::success(stored)))
}

pub(crate) async fn list_button_configs(
    State(ctx): State<SyncContext>,
) -> Result<Json<ApiResponse<BTreeMap<String, ButtonConfig>>>, ApiError> {
    let all = ctx.synchronizer().list_all().await?;
    Ok(Json(ApiResponse::success(all)))
}

pub(crate) async fn get_button_config(
    State(ctx): State<SyncContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ButtonConfig>>, ApiError> {
    match ctx.synchronizer().get(&id).await? {
        Some(config) => Ok(Json(ApiResponse::success(config))),
        None => Err(ApiError::not_found(format!("button {id} not found"))),
    }
}
