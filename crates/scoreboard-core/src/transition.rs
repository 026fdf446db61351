//! State record transitions.
//!
//! Every function here is total and side-effect free beyond the record
//! it is handed. Persisting and broadcasting the result is the caller's
//! job (see [`Scoreboard`](crate::Scoreboard)).
//!
//! The `running` flag has two states, stopped (initial) and running.
//! [`start`] and [`stop`] move between them, [`reset`] forces stopped,
//! and the incident transitions leave it alone.

use chrono::{DateTime, Utc};
use scoreboard_types::{Control, Elapsed, Incident, IncidentId, ScoreboardState};

/// Let the timer advance the counter.
pub const fn start(state: &mut ScoreboardState) {
    state.running = true;
}

/// Freeze the counter.
pub const fn stop(state: &mut ScoreboardState) {
    state.running = false;
}

/// Zero the counter and stop the timer.
///
/// Incidents, best streak, and start date are kept.
pub const fn reset(state: &mut ScoreboardState) {
    state.elapsed = Elapsed::ZERO;
    state.running = false;
}

/// Log an incident and restart the streak.
///
/// The best streak absorbs the current day count before the counter is
/// zeroed. The run flag is not changed. Returns the new incident's id,
/// which is derived from `now` and guaranteed to exceed every id already
/// in the log.
pub fn add_incident(state: &mut ScoreboardState, note: String, now: DateTime<Utc>) -> IncidentId {
    let id = IncidentId::next_after(now.timestamp_millis(), state.last_incident_id());
    state.incidents.push(Incident {
        id,
        date: now,
        note,
    });
    state.best_days = state.best_days.max(state.elapsed.days);
    state.elapsed = Elapsed::ZERO;
    id
}

/// Remove the incident with the given id.
///
/// Returns `false` (and leaves the log untouched) if no incident matches.
pub fn delete_incident(state: &mut ScoreboardState, id: IncidentId) -> bool {
    let before = state.incidents.len();
    state.incidents.retain(|incident| incident.id != id);
    state.incidents.len() != before
}

/// Advance the counter by one second if the timer is running.
///
/// Returns whether `elapsed` changed.
pub fn tick(state: &mut ScoreboardState) -> bool {
    if !state.running {
        return false;
    }
    advance_one_second(&mut state.elapsed);
    true
}

/// Add one second with odometer carry: 60 seconds, 60 minutes, 24 hours.
pub fn advance_one_second(elapsed: &mut Elapsed) {
    elapsed.seconds = elapsed.seconds.saturating_add(1);
    if elapsed.seconds >= 60 {
        elapsed.seconds = 0;
        elapsed.minutes = elapsed.minutes.saturating_add(1);
    }
    if elapsed.minutes >= 60 {
        elapsed.minutes = 0;
        elapsed.hours = elapsed.hours.saturating_add(1);
    }
    if elapsed.hours >= 24 {
        elapsed.hours = 0;
        elapsed.days = elapsed.days.saturating_add(1);
    }
}

/// Apply a control event to the record.
pub fn apply(state: &mut ScoreboardState, control: Control, now: DateTime<Utc>) {
    match control {
        Control::Start => start(state),
        Control::Stop => stop(state),
        Control::Reset => reset(state),
        Control::AddIncident { note } => {
            add_incident(state, note, now);
        }
        Control::DeleteIncident { id: Some(id) } => {
            delete_incident(state, id);
        }
        Control::DeleteIncident { id: None } => {}
    }
}
