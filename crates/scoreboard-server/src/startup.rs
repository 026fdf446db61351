//! Server startup helper for the engine binary.
//!
//! [`spawn_server`] binds eagerly and then serves on a background Tokio
//! task, so a port conflict is reported at startup rather than lost
//! inside the task.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Bind `config` and serve on a background task until `shutdown`
/// resolves.
///
/// The returned handle yields the server's final result; await it during
/// clean shutdown.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or cannot be
/// bound.
pub async fn spawn_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<JoinHandle<Result<(), ServerError>>, ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    let handle = tokio::spawn(crate::server::serve(listener, state, shutdown));

    tracing::info!(%addr, "Scoreboard server spawned on background task");

    Ok(handle)
}
