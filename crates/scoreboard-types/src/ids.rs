//! Incident identifiers.
//!
//! Incidents are keyed by the wall-clock millisecond at which they were
//! logged, matching the numeric ids already present in deployed state
//! files. Uniqueness within a record is enforced by
//! [`IncidentId::next_after`], not by the clock.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Unique identifier for a logged incident (milliseconds since the Unix epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct IncidentId(pub i64);

impl IncidentId {
    /// Derive an id from a timestamp in milliseconds, bumping it past
    /// `previous` when the clock has not moved forward.
    pub fn next_after(now_millis: i64, previous: Option<Self>) -> Self {
        match previous {
            Some(prev) if now_millis <= prev.0 => Self(prev.0.saturating_add(1)),
            _ => Self(now_millis),
        }
    }
}

impl core::fmt::Display for IncidentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn takes_clock_value_when_ahead() {
        let id = IncidentId::next_after(2_000, Some(IncidentId(1_000)));
        assert_eq!(id, IncidentId(2_000));
    }

    #[test]
    fn bumps_past_previous_on_same_millisecond() {
        let id = IncidentId::next_after(1_000, Some(IncidentId(1_000)));
        assert_eq!(id, IncidentId(1_001));
    }

    #[test]
    fn bumps_past_previous_when_clock_went_backwards() {
        let id = IncidentId::next_after(500, Some(IncidentId(1_000)));
        assert_eq!(id, IncidentId(1_001));
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&IncidentId(1_700_000_000_000)).unwrap();
        assert_eq!(json, "1700000000000");
    }
}
