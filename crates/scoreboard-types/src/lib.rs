//! Shared type definitions for the safety scoreboard.
//!
//! This crate is the single source of truth for the shapes that cross a
//! boundary: the persisted state file, the public projection pushed to
//! viewers, and the control events clients send back. Outbound types
//! flow to `TypeScript` via `ts-rs` for the browser pages.
//!
//! # Modules
//!
//! - [`ids`] -- Timestamp-derived incident identifier
//! - [`structs`] -- The state record, its elapsed counter, incidents, and
//!   the public projection
//! - [`events`] -- Client control events and server push events

pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use events::{ClientFrame, Control, ErrorPayload, ServerEvent, UnknownEvent};
pub use ids::IncidentId;
pub use structs::{Elapsed, Incident, PublicView, ScoreboardState};
