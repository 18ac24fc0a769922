//! HTTP API.
//!
//! | Route                          | Method | Handler                 |
//! |--------------------------------|--------|-------------------------|
//! | `/api/button/config`           | POST   | apply one update        |
//! | `/api/button/config`           | GET    | list all records        |
//! | `/api/button/config/:id`       | GET    | one record              |
//! | `/api/browser/capture`         | POST   | delegate to capturer    |
//! | `/api/health`                  | GET    | liveness + counts       |

pub mod buttons;
pub mod capture;
pub mod error;
pub mod system;

use axum::extract::DefaultBodyLimit;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::context::SyncContext;
use crate::hooks::{Actor, Decision};
use error::ApiError;

/// `{status: "success", data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

pub fn build_router(ctx: SyncContext, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/button/config",
            get(buttons::list_button_configs).post(buttons::update_button_config),
        )
        .route("/api/button/config/:id", get(buttons::get_button_config))
        .route("/api/browser/capture", post(capture::capture_browser))
        .route("/api/health", get(system::health))
        .fallback(system::not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(ctx)
}

/// Run the authorization hook for the caller behind `headers`.
pub(crate) async fn authorize(ctx: &SyncContext, headers: &HeaderMap) -> Result<(), ApiError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let actor = Actor::from_authorization(header);
    match ctx.authorizer().authorize(&actor).await? {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            log::warn!("Unauthorized request rejected");
            Err(ApiError::unauthorized())
        }
    }
}
