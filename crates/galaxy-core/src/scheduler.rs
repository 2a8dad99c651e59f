//! Fixed-interval tick loop.
//!
//! The [`Scheduler`] owns the only timer in the process. Every tick it
//! locks the shared simulation and, in strict order:
//!
//! 1. removes expired events,
//! 2. flips the trigger coin and appends any new event,
//! 3. publishes the full active list through a [`StateSink`].
//!
//! The publish step runs while the simulation lock is still held, so a
//! concurrent manual trigger can never interleave a stale snapshot
//! between this tick's mutation and its broadcast. A failing publish is
//! logged and the loop carries on with the next tick.

use std::sync::Arc;
use std::time::Duration;

use galaxy_types::{ActiveEvent, EventId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::now_millis;
use crate::simulation::GalaxySimulation;

/// Error returned by a [`StateSink`] that could not publish.
#[derive(Debug, thiserror::Error)]
#[error("publish failed: {0}")]
pub struct PublishError(pub String);

/// Destination for the active-event list after each state change.
///
/// The observer crate implements this by serializing one
/// `GALAXY_STATE_UPDATE` frame and fanning it out to every open socket.
pub trait StateSink: Send + Sync {
    /// Publish `events` to every subscriber.
    ///
    /// Returns the number of subscribers the payload was handed to.
    fn publish(&self, events: &[ActiveEvent]) -> Result<usize, PublishError>;
}

impl<T: StateSink + ?Sized> StateSink for Arc<T> {
    fn publish(&self, events: &[ActiveEvent]) -> Result<usize, PublishError> {
        (**self).publish(events)
    }
}

/// Summary of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Wall-clock time the tick ran at (epoch milliseconds).
    pub now: i64,
    /// Number of events removed by cleanup.
    pub expired: usize,
    /// Id of the event created this tick, if any.
    pub spawned: Option<EventId>,
    /// Number of active events published.
    pub active: usize,
    /// Subscribers reached, or `None` if publishing failed.
    pub delivered: Option<usize>,
}

/// Drives the simulation at a fixed interval.
pub struct Scheduler<S> {
    simulation: Arc<Mutex<GalaxySimulation>>,
    sink: S,
    interval: Duration,
    rng: StdRng,
}

impl<S: StateSink> Scheduler<S> {
    /// Create a scheduler seeded from the operating system.
    pub fn new(simulation: Arc<Mutex<GalaxySimulation>>, sink: S, interval: Duration) -> Self {
        Self::with_rng(simulation, sink, interval, StdRng::from_os_rng())
    }

    /// Create a scheduler with an explicit random source.
    pub const fn with_rng(
        simulation: Arc<Mutex<GalaxySimulation>>,
        sink: S,
        interval: Duration,
        rng: StdRng,
    ) -> Self {
        Self {
            simulation,
            sink,
            interval,
            rng,
        }
    }

    /// The configured tick period.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run ticks forever.
    ///
    /// The first tick fires one full interval after the call. If the
    /// runtime falls behind, missed ticks are not replayed in a burst.
    /// The loop only ends when its task is aborted.
    pub async fn run(mut self) {
        info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "Galaxy scheduler starting"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick_at(now_millis()).await;
        }
    }

    /// Execute one cleanup, generate, publish pass at `now`.
    pub async fn tick_at(&mut self, now: i64) -> TickReport {
        let mut simulation = self.simulation.lock().await;
        let outcome = simulation.tick(&mut self.rng, now);

        let delivered = match self.sink.publish(simulation.active()) {
            Ok(delivered) => Some(delivered),
            Err(e) => {
                warn!(error = %e, "Tick publish failed, continuing with next tick");
                None
            }
        };
        drop(simulation);

        let report = TickReport {
            now,
            expired: outcome.expired,
            spawned: outcome.spawned.map(|e| e.id),
            active: outcome.active,
            delivered,
        };
        debug!(
            expired = report.expired,
            spawned = report.spawned.is_some(),
            active = report.active,
            delivered = report.delivered,
            "Tick complete"
        );
        report
    }
}
