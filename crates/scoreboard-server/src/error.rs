//! Error types for the HTTP layer.
//!
//! [`ApiError`] converts into an Axum response carrying a JSON body of
//! the form `{"success": false, "message": ..., "status": ...}`, which is
//! what the admin page expects from a failed login.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scoreboard_core::ScoreboardError;

/// Errors returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The supplied admin password was wrong.
    #[error("{0}")]
    Unauthorized(String),

    /// The scoreboard task is not running.
    #[error("scoreboard unavailable: {0}")]
    Unavailable(#[from] ScoreboardError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::json!({
            "success": false,
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
