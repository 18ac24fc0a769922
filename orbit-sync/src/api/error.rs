//! HTTP error responses.
//!
//! Every error body has the shape `{status: "error", message}`. The status
//! code tells the client whether the failure was theirs (4xx) or ours (5xx).

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::SyncError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Validation(message) => Self::validation(message),
            SyncError::Storage(e) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            SyncError::Collaborator(message) => Self::new(StatusCode::BAD_GATEWAY, message),
            SyncError::Unknown(detail) => {
                // Details stay in the server log.
                log::error!("Unexpected error while handling request: {detail}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "status": "error", "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;

    #[test]
    fn test_sync_error_mapping() {
        let e = ApiError::from(SyncError::Validation("missing id".into()));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.message, "missing id");

        let e = ApiError::from(SyncError::Storage(StoreError::Io("disk full".into())));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(e.message.contains("disk full"));

        let e = ApiError::from(SyncError::Collaborator("capture timed out".into()));
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);

        let e = ApiError::from(SyncError::Unknown("thread panicked at src/x.rs".into()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.message, "internal error");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(ApiError::unauthorized().status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found("x").status, StatusCode::NOT_FOUND);
    }
}
