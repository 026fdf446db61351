//! State transitions, persistence, and the timer/broadcast loop for the
//! safety scoreboard.
//!
//! # Modules
//!
//! - [`transition`] -- Pure functions that mutate the
//!   [`ScoreboardState`](scoreboard_types::ScoreboardState) record.
//! - [`persist`] -- The state file adapter and its write-behind writer.
//! - [`config`] -- Configuration loading from `scoreboard-config.yaml`
//!   and environment variables.
//! - [`scoreboard`] -- The single task that owns the record, runs the
//!   timer, applies control events, and fans out updates.

pub mod config;
pub mod persist;
pub mod scoreboard;
pub mod transition;

pub use scoreboard::{Scoreboard, ScoreboardError, ScoreboardHandle, StateSink, Subscription};
