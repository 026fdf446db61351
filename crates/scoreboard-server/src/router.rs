//! Axum router construction.
//!
//! Assembles the pages, the admin gate, the read-only state endpoint and
//! the `WebSocket` channel into a single [`Router`] with CORS and HTTP
//! tracing middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- viewer page
/// - `GET /admin` -- admin page
/// - `POST /admin/login`, `POST /admin/logout`, `GET /admin/check`
/// - `GET /api/state` -- current public projection
/// - `GET /ws` -- real-time channel
///
/// Any other path is served from [`AppState::public_dir`] when one is
/// set, and is a 404 otherwise.
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        // Pages
        .route("/", get(handlers::viewer))
        .route("/admin", get(handlers::admin))
        // Admin gate
        .route("/admin/login", post(handlers::login))
        .route("/admin/logout", post(handlers::logout))
        .route("/admin/check", get(handlers::check))
        // Read-only state
        .route("/api/state", get(handlers::current_state))
        // Real-time channel
        .route("/ws", get(ws::ws_channel));

    if let Some(dir) = &state.public_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
