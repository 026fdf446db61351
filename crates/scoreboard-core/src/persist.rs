//! State file persistence.
//!
//! [`StateFile`] reads and writes the full [`ScoreboardState`] as
//! pretty-printed JSON. Loading fails soft: a missing or unreadable file
//! yields a fresh record. Saving writes a sibling temp file and renames
//! it over the target so a crash mid-write never leaves a torn file.
//!
//! Saves run write-behind. The scoreboard task hands each new state to a
//! [`PersistHandle`]; a [`PersistWriter`] task picks up the newest one,
//! coalescing bursts, and performs the blocking write off the async
//! workers. A failed save is logged and retried on the next change. The
//! in-memory record stays authoritative throughout.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use scoreboard_types::{Elapsed, ScoreboardState};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::scoreboard::StateSink;

/// Errors that can occur when saving the state file.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Writing or renaming the file failed.
    #[error("state file I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The record could not be serialized.
    #[error("state serialization error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// StateFile
// ---------------------------------------------------------------------------

/// The flat JSON file backing the scoreboard.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Point the adapter at `path`. Nothing is read or created yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, falling back to a fresh one on any failure.
    ///
    /// Out-of-range counter fields (a hand-edited file, say) are carried
    /// into range so the odometer invariant holds from the first tick.
    pub fn load(&self) -> ScoreboardState {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state file found, starting fresh");
                return ScoreboardState::new(Utc::now());
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read state file, starting fresh");
                return ScoreboardState::new(Utc::now());
            }
        };

        match serde_json::from_str::<ScoreboardState>(&contents) {
            Ok(mut state) => {
                state.elapsed = Elapsed::from_total_seconds(state.elapsed.total_seconds());
                info!(
                    path = %self.path.display(),
                    days = state.elapsed.days,
                    incidents = state.incidents.len(),
                    running = state.running,
                    "State file loaded"
                );
                state
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed state file, starting fresh");
                ScoreboardState::new(Utc::now())
            }
        }
    }

    /// Serialize the full record and atomically replace the file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Json`] if serialization fails or
    /// [`PersistError::Io`] if the temp file cannot be written or renamed.
    pub fn save(&self, state: &ScoreboardState) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.temp_path();
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

// ---------------------------------------------------------------------------
// Write-behind
// ---------------------------------------------------------------------------

/// Create a write-behind pair for `file`, seeded with the state that was
/// just loaded (which is therefore not rewritten).
pub fn write_behind(file: StateFile, initial: ScoreboardState) -> (PersistHandle, PersistWriter) {
    let (tx, rx) = watch::channel(initial.clone());
    (
        PersistHandle { tx },
        PersistWriter {
            file: Arc::new(file),
            rx,
            last_written: Some(initial),
        },
    )
}

/// Sending half of the write-behind channel. Cheap to call on every
/// mutation: it only replaces the pending value.
#[derive(Debug)]
pub struct PersistHandle {
    tx: watch::Sender<ScoreboardState>,
}

impl StateSink for PersistHandle {
    fn persist(&mut self, state: &ScoreboardState) {
        self.tx.send_replace(state.clone());
    }
}

/// Background task that writes the newest pending state to disk.
#[derive(Debug)]
pub struct PersistWriter {
    file: Arc<StateFile>,
    rx: watch::Receiver<ScoreboardState>,
    last_written: Option<ScoreboardState>,
}

impl PersistWriter {
    /// Write states as they arrive until the [`PersistHandle`] is dropped,
    /// then flush the final state if it has not been written yet.
    ///
    /// Returns the number of failed writes.
    pub async fn run(mut self) -> u64 {
        let mut failures: u64 = 0;

        while self.rx.changed().await.is_ok() {
            let pending = self.rx.borrow_and_update().clone();
            // Idle ticks republish an identical record; the file already holds it.
            if self.last_written.as_ref() == Some(&pending) {
                continue;
            }
            if !self.write(pending).await {
                failures = failures.saturating_add(1);
            }
        }

        let last = self.rx.borrow().clone();
        if self.last_written.as_ref() != Some(&last) {
            debug!("Flushing final state");
            if !self.write(last).await {
                failures = failures.saturating_add(1);
            }
        }

        info!(failures, "State writer stopped");
        failures
    }

    async fn write(&mut self, state: ScoreboardState) -> bool {
        let file = Arc::clone(&self.file);
        let snapshot = state.clone();
        let result = tokio::task::spawn_blocking(move || file.save(&snapshot)).await;

        match result {
            Ok(Ok(())) => {
                self.last_written = Some(state);
                true
            }
            Ok(Err(e)) => {
                error!(
                    path = %self.file.path().display(),
                    error = %e,
                    "Failed to save state, keeping in-memory state"
                );
                false
            }
            Err(e) => {
                error!(error = %e, "State write task failed");
                false
            }
        }
    }
}
