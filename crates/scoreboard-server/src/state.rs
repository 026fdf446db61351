//! Shared application state for the HTTP server.

use std::path::PathBuf;

use scoreboard_core::ScoreboardHandle;

use crate::session::AdminGate;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. Holds no copy of the scoreboard record; every read and
/// write goes through the [`ScoreboardHandle`].
#[derive(Debug)]
pub struct AppState {
    /// Handle to the scoreboard task.
    pub scoreboard: ScoreboardHandle,
    /// Admin password check and sessions.
    pub gate: AdminGate,
    /// Directory of static assets served for unmatched paths.
    pub public_dir: Option<PathBuf>,
}

impl AppState {
    /// Create state with no static asset directory.
    pub const fn new(scoreboard: ScoreboardHandle, gate: AdminGate) -> Self {
        Self {
            scoreboard,
            gate,
            public_dir: None,
        }
    }

    /// Serve unmatched paths from `dir`.
    #[must_use]
    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = Some(dir.into());
        self
    }
}
