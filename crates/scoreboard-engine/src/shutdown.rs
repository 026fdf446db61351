//! Shutdown sequence.
//!
//! Once the server task has finished, for whatever reason, the scoreboard
//! task is stopped and the state writer is awaited so the final record
//! reaches disk. Only then is the server's outcome reported.

use scoreboard_core::ScoreboardHandle;
use scoreboard_server::ServerError;
use scoreboard_types::ScoreboardState;
use tokio::task::{JoinError, JoinHandle};
use tracing::warn;

use crate::error::EngineError;

/// What was left when the engine stopped.
#[derive(Debug)]
pub struct Drained {
    /// Final record, if the scoreboard task was still running.
    pub final_state: Option<ScoreboardState>,
    /// Failed state file writes over the whole run.
    pub write_failures: u64,
}

/// Stop the scoreboard and flush the writer, then report `served`.
///
/// `served` is the server task's join result. A server failure or panic
/// is returned only after the writer has flushed.
///
/// # Errors
///
/// Returns [`EngineError::Task`] if any task panicked or was cancelled,
/// or [`EngineError::Server`] if the server stopped with an error.
pub async fn finish(
    served: Result<Result<(), ServerError>, JoinError>,
    handle: ScoreboardHandle,
    board_task: JoinHandle<ScoreboardState>,
    writer_task: JoinHandle<u64>,
) -> Result<Drained, EngineError> {
    let final_state = match handle.shutdown().await {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, "Scoreboard task already stopped");
            None
        }
    };
    drop(handle);

    let board = board_task.await;
    let writer = writer_task.await;

    served
        .map_err(|e| EngineError::Task {
            message: format!("server task failed: {e}"),
        })??;
    board.map_err(|e| EngineError::Task {
        message: format!("scoreboard task failed: {e}"),
    })?;
    let write_failures = writer.map_err(|e| EngineError::Task {
        message: format!("state writer task failed: {e}"),
    })?;

    Ok(Drained {
        final_state,
        write_failures,
    })
}
