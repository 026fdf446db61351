//! HTTP endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Viewer page |
//! | `GET` | `/admin` | Admin page |
//! | `POST` | `/admin/login` | Check the password, open a session |
//! | `POST` | `/admin/logout` | Close the caller's session |
//! | `GET` | `/admin/check` | Whether the caller is logged in |
//! | `GET` | `/api/state` | Current public projection |

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse};
use axum::Json;
use scoreboard_types::PublicView;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::pages;
use crate::session::{session_cookie, AdminGate};
use crate::state::AppState;

/// Body of `POST /admin/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Candidate admin password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Body returned by login and logout on success.
#[derive(Debug, Serialize)]
pub struct Outcome {
    /// Always `true`; failures go through [`ApiError`].
    pub success: bool,
}

/// Body of `GET /admin/check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Whether the request carries a live admin session.
    pub logged_in: bool,
}

/// `GET /`
pub async fn viewer() -> Html<&'static str> {
    Html(pages::VIEWER)
}

/// `GET /admin`
pub async fn admin() -> Html<&'static str> {
    Html(pages::ADMIN)
}

/// `POST /admin/login`
///
/// On success sets the session cookie and returns `{"success": true}`.
/// A wrong or missing password yields `401`.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let candidate = request.password.unwrap_or_default();
    let cookie = state
        .gate
        .login(&candidate)
        .await
        .ok_or_else(|| ApiError::Unauthorized(String::from("Incorrect password")))?;

    Ok((
        [(SET_COOKIE, state.gate.set_cookie(&cookie))],
        Json(Outcome { success: true }),
    ))
}

/// `POST /admin/logout`
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    state.gate.logout(session_cookie(&headers).as_deref()).await;
    (
        [(SET_COOKIE, AdminGate::clear_cookie())],
        Json(Outcome { success: true }),
    )
}

/// `GET /admin/check`
pub async fn check(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<SessionStatus> {
    let logged_in = state
        .gate
        .is_admin(session_cookie(&headers).as_deref())
        .await;
    Json(SessionStatus { logged_in })
}

/// `GET /api/state`
pub async fn current_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PublicView>, ApiError> {
    Ok(Json(state.scoreboard.snapshot().await?))
}
