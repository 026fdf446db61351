//! The scoreboard state record and its projections.
//!
//! [`ScoreboardState`] is what lives in memory and on disk. Field names
//! on the wire are camelCase and match the layout of state files written
//! by earlier deployments, so an existing `state.json` reloads without
//! migration. [`PublicView`] is the read-only projection pushed to every
//! connected client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::IncidentId;

// ---------------------------------------------------------------------------
// Elapsed
// ---------------------------------------------------------------------------

/// Time since the last reset or incident, decomposed odometer-style.
///
/// `seconds` and `minutes` stay below 60 and `hours` below 24; `days` is
/// unbounded. The carry logic lives with the state transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct Elapsed {
    /// Whole days.
    pub days: u64,
    /// Hours within the current day (0--23).
    pub hours: u32,
    /// Minutes within the current hour (0--59).
    pub minutes: u32,
    /// Seconds within the current minute (0--59).
    pub seconds: u32,
}

impl Elapsed {
    /// The zeroed counter.
    pub const ZERO: Self = Self {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Total elapsed time in seconds, saturating at `u64::MAX`.
    #[allow(clippy::cast_lossless)]
    pub const fn total_seconds(&self) -> u64 {
        let hours = self.days.saturating_mul(24).saturating_add(self.hours as u64);
        let minutes = hours.saturating_mul(60).saturating_add(self.minutes as u64);
        minutes.saturating_mul(60).saturating_add(self.seconds as u64)
    }

    /// Decompose a number of seconds into a carried counter.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn from_total_seconds(total: u64) -> Self {
        let seconds = total % 60;
        let minutes = (total / 60) % 60;
        let hours = (total / 3_600) % 24;
        Self {
            days: total / 86_400,
            hours: u32::try_from(hours).unwrap_or(0),
            minutes: u32::try_from(minutes).unwrap_or(0),
            seconds: u32::try_from(seconds).unwrap_or(0),
        }
    }

    /// Whether every component is zero.
    pub const fn is_zero(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

// ---------------------------------------------------------------------------
// Incident
// ---------------------------------------------------------------------------

/// A logged safety incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Incident {
    /// Unique, timestamp-derived identifier.
    pub id: IncidentId,
    /// When the incident was logged.
    pub date: DateTime<Utc>,
    /// Free-text note supplied by the admin. Not validated.
    #[serde(default, deserialize_with = "deserialize_note")]
    pub note: String,
}

/// Render an arbitrary JSON note as text.
///
/// Strings are kept verbatim, `null` becomes empty, anything else is
/// kept as its compact JSON text. Files written by earlier deployments
/// may hold any of these, as may an `addIncident` payload.
pub fn note_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(note) => note,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn deserialize_note<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(note_text)
}

// ---------------------------------------------------------------------------
// ScoreboardState
// ---------------------------------------------------------------------------

/// The single mutable record behind the scoreboard.
///
/// Serialized verbatim to the state file. Every field is defaulted on
/// load so partially written or older files still restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardState {
    /// Running duration since the last reset or incident.
    #[serde(flatten)]
    pub elapsed: Elapsed,
    /// Whether the timer advances `elapsed`.
    #[serde(default)]
    pub running: bool,
    /// Incident log in insertion order.
    #[serde(default)]
    pub incidents: Vec<Incident>,
    /// When tracking began. Not touched by reset or incidents.
    #[serde(default = "Utc::now")]
    pub start_date: DateTime<Utc>,
    /// Best streak: the largest `elapsed.days` seen when an incident was logged.
    #[serde(default, alias = "bestStreak")]
    pub best_days: u64,
}

impl ScoreboardState {
    /// Create a zeroed, stopped record whose tracking began at `start_date`.
    pub const fn new(start_date: DateTime<Utc>) -> Self {
        Self {
            elapsed: Elapsed::ZERO,
            running: false,
            incidents: Vec::new(),
            start_date,
            best_days: 0,
        }
    }

    /// Id of the most recently logged incident, if any.
    pub fn last_incident_id(&self) -> Option<IncidentId> {
        self.incidents.iter().map(|incident| incident.id).max()
    }

    /// Build the read-only projection sent to clients.
    pub fn public_view(&self) -> PublicView {
        PublicView::from(self)
    }
}

impl Default for ScoreboardState {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

// ---------------------------------------------------------------------------
// PublicView
// ---------------------------------------------------------------------------

/// Projection of [`ScoreboardState`] pushed to every client as the
/// payload of the `update` event.
///
/// Structurally a copy: clients never hold a handle to the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PublicView {
    /// Elapsed counter, flattened into `days`/`hours`/`minutes`/`seconds`.
    #[serde(flatten)]
    pub elapsed: Elapsed,
    /// Whether the timer is running.
    pub running: bool,
    /// Full incident log.
    pub incidents: Vec<Incident>,
    /// Number of incidents logged.
    pub incidents_count: usize,
    /// Best streak in days.
    pub best_days: u64,
    /// When tracking began.
    pub start_date: DateTime<Utc>,
}

impl From<&ScoreboardState> for PublicView {
    fn from(state: &ScoreboardState) -> Self {
        Self {
            elapsed: state.elapsed,
            running: state.running,
            incidents: state.incidents.clone(),
            incidents_count: state.incidents.len(),
            best_days: state.best_days,
            start_date: state.start_date,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn total_seconds_composes_all_fields() {
        let elapsed = Elapsed {
            days: 2,
            hours: 3,
            minutes: 4,
            seconds: 5,
        };
        assert_eq!(elapsed.total_seconds(), ((2 * 24 + 3) * 60 + 4) * 60 + 5);
    }

    #[test]
    fn from_total_seconds_carries() {
        let elapsed = Elapsed::from_total_seconds(90_061);
        assert_eq!(
            elapsed,
            Elapsed {
                days: 1,
                hours: 1,
                minutes: 1,
                seconds: 1,
            }
        );
        assert_eq!(elapsed.total_seconds(), 90_061);
    }

    #[test]
    fn state_serializes_with_flat_elapsed_fields() {
        let state = ScoreboardState::new(fixed_date());
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["days"], 0);
        assert_eq!(json["seconds"], 0);
        assert_eq!(json["running"], false);
        assert_eq!(json["bestDays"], 0);
        assert_eq!(json["startDate"], "2024-03-01T08:00:00Z");
        assert!(json.get("elapsed").is_none());
    }

    #[test]
    fn loads_file_written_by_earlier_deployment() {
        let raw = r#"{
          "days": 12,
          "hours": 5,
          "minutes": 30,
          "seconds": 9,
          "running": true,
          "incidents": [
            { "id": 1709280000000, "date": "2024-03-01T08:00:00.000Z", "note": "slip" }
          ],
          "startDate": "2024-02-01T00:00:00.000Z",
          "bestDays": 7
        }"#;

        let state: ScoreboardState = serde_json::from_str(raw).unwrap();

        assert_eq!(state.elapsed.days, 12);
        assert_eq!(state.elapsed.seconds, 9);
        assert!(state.running);
        assert_eq!(state.best_days, 7);
        assert_eq!(state.incidents.len(), 1);
        assert_eq!(state.incidents[0].id, IncidentId(1_709_280_000_000));
        assert_eq!(state.incidents[0].note, "slip");
    }

    #[test]
    fn best_streak_alias_is_accepted() {
        let raw = r#"{ "bestStreak": 4, "startDate": "2024-02-01T00:00:00Z" }"#;
        let state: ScoreboardState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.best_days, 4);
        assert!(state.elapsed.is_zero());
        assert!(!state.running);
    }

    #[test]
    fn public_view_counts_incidents() {
        let mut state = ScoreboardState::new(fixed_date());
        state.incidents.push(Incident {
            id: IncidentId(1),
            date: fixed_date(),
            note: String::from("a"),
        });
        state.incidents.push(Incident {
            id: IncidentId(2),
            date: fixed_date(),
            note: String::from("b"),
        });

        let json = serde_json::to_value(state.public_view()).unwrap();

        assert_eq!(json["incidentsCount"], 2);
        assert_eq!(json["incidents"][1]["note"], "b");
        assert_eq!(json["minutes"], 0);
    }

    #[test]
    fn last_incident_id_is_the_largest() {
        let mut state = ScoreboardState::new(fixed_date());
        assert_eq!(state.last_incident_id(), None);
        for id in [5, 9, 7] {
            state.incidents.push(Incident {
                id: IncidentId(id),
                date: fixed_date(),
                note: String::new(),
            });
        }
        assert_eq!(state.last_incident_id(), Some(IncidentId(9)));
    }

    #[test]
    fn non_string_notes_load_as_text() {
        let raw = r#"{
          "incidents": [
            { "id": 1, "date": "2024-03-01T08:00:00.000Z", "note": null },
            { "id": 2, "date": "2024-03-01T08:00:00.000Z", "note": {"text": "x"} },
            { "id": 3, "date": "2024-03-01T08:00:00.000Z", "note": 42 },
            { "id": 4, "date": "2024-03-01T08:00:00.000Z" }
          ],
          "bestDays": 4
        }"#;

        let state: ScoreboardState = serde_json::from_str(raw).unwrap();

        let notes: Vec<&str> = state.incidents.iter().map(|i| i.note.as_str()).collect();
        assert_eq!(notes, ["", r#"{"text":"x"}"#, "42", ""]);
        assert_eq!(state.best_days, 4);
    }
}
