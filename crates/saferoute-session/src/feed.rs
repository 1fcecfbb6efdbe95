//! Position feed abstraction: a live platform source or the simulator.

use saferoute_core::PositionSample;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Feed-level failures. The session never retries the live source
/// itself; it recommends the simulator once and keeps listening.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The live location source could not be started (denied/missing).
    /// Not fatal: the caller should start a simulated feed instead.
    #[error("live location source unavailable")]
    Unavailable,
    /// One sample delivery failed. Logged, not retried.
    #[error("sample delivery failed: {0}")]
    Sample(String),
}

/// Source of position updates for one navigation session.
pub enum PositionFeed {
    /// Push-based samples from a platform location service. The sender
    /// side is owned by the platform collaborator.
    Live(mpsc::Receiver<Result<PositionSample, FeedError>>),
    /// Internal simulator: one tick per interval, no external samples.
    Simulated { interval: Duration },
}

impl PositionFeed {
    /// Create a live feed plus the sender half for the platform source.
    pub fn live_channel(
        buffer: usize,
    ) -> (
        mpsc::Sender<Result<PositionSample, FeedError>>,
        PositionFeed,
    ) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, PositionFeed::Live(rx))
    }

    /// Create a simulated feed ticking at `interval`.
    pub fn simulated(interval: Duration) -> PositionFeed {
        PositionFeed::Simulated { interval }
    }
}
