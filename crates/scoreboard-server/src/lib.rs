//! HTTP and real-time server for the safety scoreboard.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **Viewer and admin pages** (`GET /`, `GET /admin`) that talk to the
//!   real-time channel from the browser
//! - **Admin gate** (`POST /admin/login`, `POST /admin/logout`,
//!   `GET /admin/check`) backed by signed session cookies
//! - **`WebSocket` channel** (`GET /ws`) that pushes the public state on
//!   connect and after every mutation, and accepts control events from
//!   admin sessions
//! - **Read-only state** (`GET /api/state`)
//!
//! # Architecture
//!
//! Handlers never touch the scoreboard record. They hold a
//! [`ScoreboardHandle`](scoreboard_core::ScoreboardHandle) and send
//! commands to the single task that owns it, so every mutation is
//! serialized there and fanned out in one order to every connection.
//! `WebSocket` connections are bound to the session cookie they were
//! opened with; control events are checked against that session each
//! time one arrives.

pub mod error;
pub mod handlers;
pub mod pages;
pub mod router;
pub mod server;
pub mod session;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{serve, ServerConfig, ServerError};
pub use session::AdminGate;
pub use startup::spawn_server;
pub use state::AppState;
