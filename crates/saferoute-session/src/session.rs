//! Navigation session task.
//!
//! One spawned task owns the tracker for the whole session. Every
//! incoming event (sample, tick, command) is applied against the
//! tracker's current committed state; there are no values captured at
//! subscription time. Consumers read snapshots through a watch channel
//! and edge-triggered events through a broadcast channel, so the
//! engine's update path never awaits them.

use crate::feed::{FeedError, PositionFeed};
use saferoute_core::tracker::{RouteProgressTracker, TrackerRules};
use saferoute_core::{PositionSample, RouteError, RoutePlan, TripEvent, TripState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

const COMMAND_BUFFER: usize = 16;
const EVENT_BUFFER: usize = 64;

/// Fire-and-forget announcement output. The session decides *when* and
/// *what* to announce; the sink decides how.
pub trait AnnouncementSink: Send + Sync {
    fn announce(&self, instruction: &str, language: &str);
}

/// Caller-tunable session options.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Language tag passed through to the announcement sink.
    pub language: String,
    /// Start with announcements muted.
    pub muted: bool,
    pub rules: TrackerRules,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            muted: false,
            rules: TrackerRules::default(),
        }
    }
}

/// Control commands accepted by a running session.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Pause,
    Resume,
    SetMuted(bool),
    Stop,
}

/// Handle to a running navigation session.
///
/// Dropping the handle closes the command channel and ends the task.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<TripState>,
    events_tx: broadcast::Sender<TripEvent>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Latest published trip state.
    pub fn state(&self) -> TripState {
        self.state_rx.borrow().clone()
    }

    /// Watch channel receiving a snapshot after every applied
    /// sample or tick.
    pub fn watch_state(&self) -> watch::Receiver<TripState> {
        self.state_rx.clone()
    }

    /// Subscribe to edge-triggered trip events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<TripEvent> {
        self.events_tx.subscribe()
    }

    pub async fn pause(&self) {
        let _ = self.commands.send(SessionCommand::Pause).await;
    }

    pub async fn resume(&self) {
        let _ = self.commands.send(SessionCommand::Resume).await;
    }

    pub async fn set_muted(&self, muted: bool) {
        let _ = self.commands.send(SessionCommand::SetMuted(muted)).await;
    }

    /// Stop the session and wait for the task to finish. Idempotent:
    /// calling it again (or after arrival) is a no-op. After it
    /// returns, no further trip state mutation occurs.
    pub async fn stop(&mut self) {
        let _ = self.commands.send(SessionCommand::Stop).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Entry point for starting a tracking session.
pub struct NavigationSession;

impl NavigationSession {
    /// Validate the plan and spawn the session task.
    pub fn start(
        plan: RoutePlan,
        feed: PositionFeed,
        options: SessionOptions,
        announcer: Option<Arc<dyn AnnouncementSink>>,
    ) -> Result<SessionHandle, RouteError> {
        let mut tracker = RouteProgressTracker::new(plan, options.rules.clone())?;
        tracker.set_muted(options.muted);

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(tracker.state().clone());
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        let task = tokio::spawn(run_session(
            tracker,
            feed,
            options,
            announcer,
            cmd_rx,
            state_tx,
            events_tx.clone(),
        ));

        Ok(SessionHandle {
            commands: cmd_tx,
            state_rx,
            events_tx,
            task: Some(task),
        })
    }
}

enum FeedSource {
    Live(mpsc::Receiver<Result<PositionSample, FeedError>>),
    Simulated(tokio::time::Interval),
}

enum FeedInput {
    Sample(PositionSample),
    Tick,
    Failed(FeedError),
    Closed,
}

async fn next_input(feed: &mut FeedSource) -> FeedInput {
    match feed {
        FeedSource::Live(rx) => match rx.recv().await {
            Some(Ok(sample)) => FeedInput::Sample(sample),
            Some(Err(err)) => FeedInput::Failed(err),
            None => FeedInput::Closed,
        },
        FeedSource::Simulated(ticker) => {
            ticker.tick().await;
            FeedInput::Tick
        }
    }
}

async fn run_session(
    mut tracker: RouteProgressTracker,
    feed: PositionFeed,
    options: SessionOptions,
    announcer: Option<Arc<dyn AnnouncementSink>>,
    mut commands: mpsc::Receiver<SessionCommand>,
    state_tx: watch::Sender<TripState>,
    events_tx: broadcast::Sender<TripEvent>,
) {
    let mut feed = match feed {
        PositionFeed::Live(rx) => {
            tracing::info!("navigation session started (live feed)");
            FeedSource::Live(rx)
        }
        PositionFeed::Simulated { interval } => {
            tracing::info!(?interval, "navigation session started (simulated feed)");
            FeedSource::Simulated(tokio::time::interval(interval.max(Duration::from_millis(1))))
        }
    };

    // One-shot: recommend the simulator on the first live failure only.
    let mut fallback_recommended = false;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SessionCommand::Pause) => {
                    tracker.pause();
                    let _ = state_tx.send(tracker.state().clone());
                }
                Some(SessionCommand::Resume) => {
                    tracker.resume();
                    let _ = state_tx.send(tracker.state().clone());
                }
                Some(SessionCommand::SetMuted(muted)) => {
                    tracker.set_muted(muted);
                    let _ = state_tx.send(tracker.state().clone());
                }
                Some(SessionCommand::Stop) | None => {
                    tracing::info!("navigation session stopped");
                    break;
                }
            },
            input = next_input(&mut feed) => match input {
                FeedInput::Sample(sample) => {
                    let events = tracker.apply_sample(&sample);
                    tracing::debug!(
                        lat = sample.lat,
                        lon = sample.lon,
                        step = tracker.state().step_index,
                        "applied sample"
                    );
                    if publish(&tracker, events, &state_tx, &events_tx, &announcer, &options) {
                        break;
                    }
                }
                FeedInput::Tick => {
                    let events = tracker.apply_tick();
                    if publish(&tracker, events, &state_tx, &events_tx, &announcer, &options) {
                        break;
                    }
                }
                FeedInput::Failed(err) => {
                    tracing::warn!(error = %err, "position feed error");
                    if !fallback_recommended {
                        fallback_recommended = true;
                        let _ = events_tx.send(TripEvent::SimulatorFallback);
                    }
                }
                FeedInput::Closed => {
                    tracing::info!("position feed closed, ending session");
                    break;
                }
            },
        }
    }
}

/// Publish the post-update snapshot and events. Returns true when the
/// session reached its terminal state.
fn publish(
    tracker: &RouteProgressTracker,
    events: Vec<TripEvent>,
    state_tx: &watch::Sender<TripState>,
    events_tx: &broadcast::Sender<TripEvent>,
    announcer: &Option<Arc<dyn AnnouncementSink>>,
    options: &SessionOptions,
) -> bool {
    let _ = state_tx.send(tracker.state().clone());

    let mut arrived = false;
    for event in events {
        if let TripEvent::AnnouncementDue { instruction } = &event {
            if let Some(sink) = announcer {
                sink.announce(instruction, &options.language);
            }
        }
        if matches!(event, TripEvent::Arrived) {
            arrived = true;
        }
        let _ = events_tx.send(event);
    }

    if arrived {
        tracing::info!("arrived at destination, ending session");
    }
    arrived
}
