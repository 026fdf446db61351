//! Safety scoreboard binary.
//!
//! Wires together configuration, the state file, the scoreboard task and
//! the HTTP server, then runs until `Ctrl-C` (or `SIGTERM` on Unix).
//!
//! # Startup Sequence
//!
//! 1. Load `.env` if present
//! 2. Initialize structured logging (tracing)
//! 3. Load configuration from `scoreboard-config.yaml` and the environment
//! 4. Load the state file
//! 5. Start the write-behind state writer
//! 6. Start the scoreboard task
//! 7. Start the HTTP server
//!
//! # Shutdown Sequence
//!
//! The server stops accepting connections, the scoreboard task is asked
//! for its final record, and the state writer flushes it before exit.
//! A failed server task is reported only after that flush.

mod error;
mod shutdown;

use std::path::Path;
use std::sync::Arc;

use scoreboard_core::config::ScoreboardConfig;
use scoreboard_core::persist::{self, StateFile};
use scoreboard_core::Scoreboard;
use scoreboard_server::{AdminGate, AppState, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the optional YAML configuration file.
const CONFIG_PATH: &str = "scoreboard-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the server cannot bind,
/// or a background task fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load .env before anything reads the environment.
    let dotenv = dotenvy::dotenv();

    // 2. Initialize structured logging.
    init_tracing();
    info!("scoreboard-engine starting");
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    // 3. Load configuration.
    let config = ScoreboardConfig::load(Path::new(CONFIG_PATH)).map_err(EngineError::from)?;
    info!(
        host = config.server.host,
        port = config.server.port,
        state_file = %config.storage.state_file.display(),
        tick_interval_ms = config.timer.tick_interval_ms,
        session_ttl_secs = config.admin.session_ttl_secs,
        "Configuration loaded"
    );
    if config.admin.password.is_none() {
        warn!("ADMIN_PASS is not set, admin login is disabled");
    }
    if config.admin.uses_default_secret() {
        warn!("SESSION_SECRET is not set, session cookies use the built-in secret");
    }

    // 4. Load the state file.
    let file = StateFile::new(&config.storage.state_file);
    let initial = file.load();

    // 5. Start the state writer.
    let (sink, writer) = persist::write_behind(file, initial.clone());
    let writer_task = tokio::spawn(writer.run());

    // 6. Start the scoreboard task.
    let (board, handle) = Scoreboard::new(initial, Box::new(sink), config.timer.tick_interval());
    let board_task = board.spawn();

    // 7. Start the HTTP server.
    let mut app_state = AppState::new(handle.clone(), AdminGate::new(&config.admin));
    if config.web.public_dir.is_dir() {
        app_state = app_state.with_public_dir(&config.web.public_dir);
    } else {
        info!(
            public_dir = %config.web.public_dir.display(),
            "Public directory not found, static assets disabled"
        );
    }
    let server = scoreboard_server::spawn_server(
        &ServerConfig::from(&config.server),
        Arc::new(app_state),
        shutdown_signal(),
    )
    .await
    .map_err(EngineError::from)?;

    // The scoreboard is stopped and the writer flushed even when the
    // server task failed; its outcome is reported afterwards.
    let served = server.await;
    let drained = shutdown::finish(served, handle, board_task, writer_task).await?;

    info!(
        days = drained.final_state.as_ref().map(|s| s.elapsed.days),
        incidents = drained.final_state.as_ref().map(|s| s.incidents.len()),
        write_failures = drained.write_failures,
        "scoreboard-engine shutdown complete"
    );

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` selects the filter (default `info`). `LOG_FORMAT=json`
/// switches to newline-delimited JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Resolve on `Ctrl-C`, or on `SIGTERM` where supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutdown signal received");
}
