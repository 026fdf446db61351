//! The scoreboard loop: timer, control events, and update fan-out.
//!
//! A single [`Scoreboard`] task owns the [`ScoreboardState`] for the life
//! of the process. It `select!`s between the timer and a command channel,
//! so the timer and every control event are serialized: each runs to
//! completion before the next one is looked at, and no lock guards the
//! record.
//!
//! After every mutation (including idle ticks) the task hands the record
//! to its [`StateSink`] and publishes a [`PublicView`] on a broadcast
//! channel. All subscribers therefore observe the same total order of
//! updates.
//!
//! Everything else talks to the task through a cloneable
//! [`ScoreboardHandle`].

use std::time::Duration;

use chrono::Utc;
use scoreboard_types::{Control, PublicView, ScoreboardState};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::transition;

/// Capacity of the update broadcast channel.
///
/// A subscriber that falls further behind than this receives
/// [`broadcast::error::RecvError::Lagged`] and should skip to the newest
/// update. Every update is a full projection, so nothing is lost.
const BROADCAST_CAPACITY: usize = 256;

/// Capacity of the command channel feeding the task.
const COMMAND_CAPACITY: usize = 128;

/// Errors returned by [`ScoreboardHandle`] calls.
#[derive(Debug, thiserror::Error)]
pub enum ScoreboardError {
    /// The scoreboard task has shut down.
    #[error("scoreboard task is not running")]
    Closed,
}

/// Destination for every new version of the record.
///
/// Implemented by the write-behind persistence handle. Called on the
/// scoreboard task, so implementations must not block.
pub trait StateSink: Send {
    /// Record the new state.
    fn persist(&mut self, state: &ScoreboardState);
}

/// A sink that discards every state, for tests and ephemeral runs.
pub struct NoOpSink;

impl StateSink for NoOpSink {
    fn persist(&mut self, _state: &ScoreboardState) {}
}

/// Current projection plus a receiver for every later update, taken
/// atomically so nothing is missed or repeated in between.
#[derive(Debug)]
pub struct Subscription {
    /// The projection at the moment of subscribing.
    pub current: PublicView,
    /// Updates published after `current`.
    pub updates: broadcast::Receiver<PublicView>,
}

enum Command {
    Apply {
        control: Control,
        reply: oneshot::Sender<PublicView>,
    },
    Subscribe {
        reply: oneshot::Sender<Subscription>,
    },
    Snapshot {
        reply: oneshot::Sender<PublicView>,
    },
    Shutdown {
        reply: oneshot::Sender<ScoreboardState>,
    },
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable handle to a running [`Scoreboard`] task.
#[derive(Debug, Clone)]
pub struct ScoreboardHandle {
    tx: mpsc::Sender<Command>,
}

impl ScoreboardHandle {
    /// Apply a control event and return the projection published for it.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Closed`] if the task has stopped.
    pub async fn apply(&self, control: Control) -> Result<PublicView, ScoreboardError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Apply { control, reply }).await?;
        rx.await.map_err(|_closed| ScoreboardError::Closed)
    }

    /// Subscribe to updates, receiving the current projection first.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Closed`] if the task has stopped.
    pub async fn subscribe(&self) -> Result<Subscription, ScoreboardError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe { reply }).await?;
        rx.await.map_err(|_closed| ScoreboardError::Closed)
    }

    /// Read the current projection without subscribing.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Closed`] if the task has stopped.
    pub async fn snapshot(&self) -> Result<PublicView, ScoreboardError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_closed| ScoreboardError::Closed)
    }

    /// Stop the task and return the final record.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreboardError::Closed`] if the task had already stopped.
    pub async fn shutdown(&self) -> Result<ScoreboardState, ScoreboardError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply }).await?;
        rx.await.map_err(|_closed| ScoreboardError::Closed)
    }

    async fn send(&self, command: Command) -> Result<(), ScoreboardError> {
        self.tx
            .send(command)
            .await
            .map_err(|_closed| ScoreboardError::Closed)
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// The task that owns the scoreboard record.
pub struct Scoreboard {
    state: ScoreboardState,
    sink: Box<dyn StateSink>,
    commands: mpsc::Receiver<Command>,
    updates: broadcast::Sender<PublicView>,
    tick_interval: Duration,
}

impl Scoreboard {
    /// Build the task around an initial record. Nothing runs until
    /// [`run`](Self::run) is awaited.
    pub fn new(
        state: ScoreboardState,
        sink: Box<dyn StateSink>,
        tick_interval: Duration,
    ) -> (Self, ScoreboardHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let (updates, _) = broadcast::channel(BROADCAST_CAPACITY);
        (
            Self {
                state,
                sink,
                commands,
                updates,
                tick_interval,
            },
            ScoreboardHandle { tx },
        )
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<ScoreboardState> {
        tokio::spawn(self.run())
    }

    /// Run the timer and command loop until shutdown is requested or
    /// every handle is dropped. Returns the final record.
    ///
    /// The first tick fires one interval after start. Missed ticks are
    /// replayed in a burst so the counter keeps pace with wall-clock time.
    pub async fn run(mut self) -> ScoreboardState {
        let start = Instant::now()
            .checked_add(self.tick_interval)
            .unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(start, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        info!(
            tick_interval_ms = self.tick_interval.as_millis(),
            running = self.state.running,
            days = self.state.elapsed.days,
            "Scoreboard loop starting"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_tick(),
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        info!("Scoreboard shutdown requested");
                        let _ = reply.send(self.state.clone());
                        return self.state;
                    }
                    Some(command) => self.handle(command),
                    None => {
                        info!("All scoreboard handles dropped, stopping");
                        return self.state;
                    }
                },
            }
        }
    }

    fn on_tick(&mut self) {
        let advanced = transition::tick(&mut self.state);
        trace!(advanced, "Tick");
        self.publish();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Apply { control, reply } => {
                let event = control.name();
                transition::apply(&mut self.state, control, Utc::now());
                let view = self.publish();
                info!(
                    event,
                    running = view.running,
                    incidents = view.incidents_count,
                    best_days = view.best_days,
                    "Control event applied"
                );
                let _ = reply.send(view);
            }
            Command::Subscribe { reply } => {
                let subscription = Subscription {
                    current: self.state.public_view(),
                    updates: self.updates.subscribe(),
                };
                if reply.send(subscription).is_ok() {
                    debug!(
                        subscribers = self.updates.receiver_count(),
                        "Subscriber added"
                    );
                }
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.public_view());
            }
            Command::Shutdown { .. } => {}
        }
    }

    /// Persist, then fan out. Returns the published projection.
    fn publish(&mut self) -> PublicView {
        self.sink.persist(&self.state);
        let view = self.state.public_view();
        // Err only means nobody is subscribed right now.
        let _ = self.updates.send(view.clone());
        view
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::{Arc, Mutex};

    use scoreboard_types::Elapsed;

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<ScoreboardState>>>);

    impl StateSink for RecordingSink {
        fn persist(&mut self, state: &ScoreboardState) {
            self.0.lock().unwrap().push(state.clone());
        }
    }

    fn spawn_with(sink: Box<dyn StateSink>) -> ScoreboardHandle {
        let (board, handle) = Scoreboard::new(
            ScoreboardState::new(Utc::now()),
            sink,
            Duration::from_secs(1),
        );
        board.spawn();
        handle
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_gets_current_state_first() {
        let handle = spawn_with(Box::new(NoOpSink));
        let sub = handle.subscribe().await.unwrap();
        assert!(sub.current.elapsed.is_zero());
        assert!(!sub.current.running);
        assert_eq!(sub.current.incidents_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn every_control_event_is_persisted_then_broadcast() {
        let sink = RecordingSink::default();
        let handle = spawn_with(Box::new(sink.clone()));
        let mut sub = handle.subscribe().await.unwrap();

        let view = handle.apply(Control::Start).await.unwrap();
        assert!(view.running);

        let update = sub.updates.recv().await.unwrap();
        assert_eq!(update, view);

        let persisted = sink.0.lock().unwrap().clone();
        assert_eq!(persisted.len(), 1);
        assert!(persisted[0].running);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_ticks_persist_the_unchanged_record() {
        let sink = RecordingSink::default();
        let initial = ScoreboardState::new(Utc::now());
        let (board, handle) = Scoreboard::new(
            initial.clone(),
            Box::new(sink.clone()),
            Duration::from_secs(1),
        );
        board.spawn();
        let mut sub = handle.subscribe().await.unwrap();

        for _ in 0..3 {
            let idle = sub.updates.recv().await.unwrap();
            assert!(!idle.running);
            assert!(idle.elapsed.is_zero());
        }

        let persisted = sink.0.lock().unwrap().clone();
        assert_eq!(persisted.len(), 3);
        assert!(persisted.iter().all(|state| *state == initial));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_advances_only_while_running() {
        let handle = spawn_with(Box::new(NoOpSink));
        let mut sub = handle.subscribe().await.unwrap();

        // Idle tick still publishes, unchanged.
        let idle = sub.updates.recv().await.unwrap();
        assert!(idle.elapsed.is_zero());

        handle.apply(Control::Start).await.unwrap();
        let started = sub.updates.recv().await.unwrap();
        assert!(started.running);

        let mut last = started;
        for _ in 0..61 {
            last = sub.updates.recv().await.unwrap();
        }
        assert_eq!(
            last.elapsed,
            Elapsed {
                days: 0,
                hours: 0,
                minutes: 1,
                seconds: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn two_subscribers_see_the_same_reset() {
        let handle = spawn_with(Box::new(NoOpSink));
        handle.apply(Control::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10_500)).await;

        let mut first = handle.subscribe().await.unwrap();
        let mut second = handle.subscribe().await.unwrap();
        assert_eq!(first.current.elapsed.seconds, 10);

        handle.apply(Control::Reset).await.unwrap();

        let a = first.updates.recv().await.unwrap();
        let b = second.updates.recv().await.unwrap();
        assert_eq!(a, b);
        assert!(!a.running);
        assert!(a.elapsed.is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_returns_final_state() {
        let handle = spawn_with(Box::new(NoOpSink));
        handle
            .apply(Control::AddIncident {
                note: String::from("spill"),
            })
            .await
            .unwrap();

        let state = handle.shutdown().await.unwrap();

        assert_eq!(state.incidents.len(), 1);
        assert!(matches!(
            handle.snapshot().await,
            Err(ScoreboardError::Closed)
        ));
    }
}
