//! Real-time channel events.
//!
//! Every frame on the channel is a JSON object `{"event": <name>, "data":
//! <payload>}`. Clients send [`ClientFrame`]s naming one of five control
//! events; the server pushes [`ServerEvent`]s.
//!
//! Payloads are deliberately loose. An `addIncident` note is stored as
//! given, and a `deleteIncident` id that is not a number simply matches
//! nothing.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::IncidentId;
use crate::structs::{note_text, PublicView};

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Raw client frame as received over the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFrame {
    /// Event name (`start`, `stop`, `reset`, `addIncident`, `deleteIncident`).
    pub event: String,
    /// Optional payload; `null` when absent.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The event name of a [`ClientFrame`] did not match any control event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event: {0}")]
pub struct UnknownEvent(pub String);

/// A control event after its name has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Start the timer.
    Start,
    /// Stop the timer.
    Stop,
    /// Zero the counter and stop the timer.
    Reset,
    /// Log an incident with the given note.
    AddIncident {
        /// Free-text note.
        note: String,
    },
    /// Delete the incident with the given id. `None` matches nothing.
    DeleteIncident {
        /// Target incident, if the payload named one.
        id: Option<IncidentId>,
    },
}

impl Control {
    /// Wire name of this control event.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reset => "reset",
            Self::AddIncident { .. } => "addIncident",
            Self::DeleteIncident { .. } => "deleteIncident",
        }
    }
}

impl TryFrom<ClientFrame> for Control {
    type Error = UnknownEvent;

    fn try_from(frame: ClientFrame) -> Result<Self, Self::Error> {
        match frame.event.as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "reset" => Ok(Self::Reset),
            "addIncident" => Ok(Self::AddIncident {
                note: note_text(frame.data),
            }),
            "deleteIncident" => Ok(Self::DeleteIncident {
                id: id_from_payload(&frame.data),
            }),
            _ => Err(UnknownEvent(frame.event)),
        }
    }
}

fn id_from_payload(data: &serde_json::Value) -> Option<IncidentId> {
    match data {
        serde_json::Value::Number(n) => n.as_i64().map(IncidentId),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok().map(IncidentId),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Payload of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ErrorPayload {
    /// Human-readable reason.
    pub message: String,
}

/// Event pushed from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ServerEvent {
    /// Full public projection after a mutation (or on connect).
    Update(PublicView),
    /// The sender's last frame was rejected.
    Error(ErrorPayload),
}

impl ServerEvent {
    /// Build an `error` event from a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }
}
