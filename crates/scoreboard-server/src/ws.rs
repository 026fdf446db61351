//! `WebSocket` handler for the real-time channel.
//!
//! Clients connect to `GET /ws`. Each connection first receives an
//! `update` with the current projection, then every later `update` in the
//! order the scoreboard task published them. The initial projection and
//! the update stream are taken in one step, so nothing is skipped or
//! repeated at the seam.
//!
//! Control events from the client are accepted only when the session
//! cookie sent with the upgrade request still names a live admin
//! session. The check runs on every event, so logging out (or expiry)
//! takes effect on open connections too. Rejections go to the sender
//! alone as an `error` event.
//!
//! If a client falls behind, lagged updates are skipped; the next one is
//! a full projection anyway.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use scoreboard_types::{ClientFrame, Control, ServerEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::session::session_cookie;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_channel(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let cookie = session_cookie(&headers);
    ws.on_upgrade(move |socket| handle_ws(socket, state, cookie))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, cookie: Option<String>) {
    let Ok(subscription) = state.scoreboard.subscribe().await else {
        debug!("Scoreboard stopped, refusing WebSocket client");
        return;
    };
    debug!(has_session = cookie.is_some(), "WebSocket client connected");

    if !send_event(&mut socket, &ServerEvent::Update(subscription.current)).await {
        return;
    }
    let mut updates = subscription.updates;

    loop {
        tokio::select! {
            result = updates.recv() => {
                match result {
                    Ok(view) => {
                        if !send_event(&mut socket, &ServerEvent::Update(view)).await {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Update channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Some(reply) = dispatch(&state, cookie.as_deref(), text.as_str()).await else {
                            continue;
                        };
                        if !send_event(&mut socket, &reply).await {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Binary and pong frames carry nothing for us.
                    }
                }
            }
        }
    }
}

/// Handle one client text frame.
///
/// Returns the event to send back to this client only, if any. Accepted
/// control events produce no direct reply; their `update` arrives through
/// the broadcast like everyone else's.
pub async fn dispatch(state: &AppState, cookie: Option<&str>, text: &str) -> Option<ServerEvent> {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(error = %e, "Unparseable client frame");
            return Some(ServerEvent::error("malformed frame"));
        }
    };

    let control = match Control::try_from(frame) {
        Ok(control) => control,
        Err(e) => {
            debug!(error = %e, "Unknown client event");
            return Some(ServerEvent::error(e.to_string()));
        }
    };

    if !state.gate.is_admin(cookie).await {
        warn!(event = control.name(), "Rejected control event without admin session");
        return Some(ServerEvent::error("admin login required"));
    }

    match state.scoreboard.apply(control).await {
        Ok(_) => None,
        Err(e) => Some(ServerEvent::error(e.to_string())),
    }
}

/// Serialize and send one event. Returns `false` once the client is gone.
async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize server event: {e}");
            return true;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        debug!("WebSocket client disconnected (send failed)");
        return false;
    }
    true
}
