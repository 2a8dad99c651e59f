//! The galaxy simulation service object.
//!
//! [`GalaxySimulation`] combines the generator and the store behind one
//! explicitly constructed value. Nothing here is global: tests and the
//! server build independent instances with their own catalog and limits.
//! Callers that share a simulation across tasks wrap it in a mutex; every
//! method takes `now` so behaviour is reproducible.

use std::sync::Arc;

use galaxy_types::{ActiveEvent, EventTypeDefinition};
use rand::Rng;
use tracing::{debug, info};

use crate::catalog::EventCatalog;
use crate::generator::EventGenerator;
use crate::store::EventStore;

/// What happened during one call to [`GalaxySimulation::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Number of events removed by the cleanup step.
    pub expired: usize,
    /// Event created by the trigger step, if the coin succeeded.
    pub spawned: Option<ActiveEvent>,
    /// Number of active events after the tick.
    pub active: usize,
}

/// Explicitly constructed simulation state: catalog, generator, store.
#[derive(Debug, Clone)]
pub struct GalaxySimulation {
    generator: EventGenerator,
    store: EventStore,
}

impl GalaxySimulation {
    /// Create a simulation with an empty store.
    pub fn new(catalog: Arc<EventCatalog>, trigger_probability: f64, history_limit: usize) -> Self {
        Self {
            generator: EventGenerator::new(catalog, trigger_probability),
            store: EventStore::new(history_limit),
        }
    }

    /// Run the state-changing part of one scheduler tick.
    ///
    /// Cleanup always runs before generation, so an event created here
    /// is never removed in the same tick and an expired one is never
    /// visible afterwards.
    pub fn tick<R: Rng>(&mut self, rng: &mut R, now: i64) -> TickOutcome {
        let expired = self.store.cleanup_expired(now);
        if expired > 0 {
            debug!(expired, "Expired galaxy events removed");
        }

        let spawned = self.generator.maybe_trigger(rng, now);
        if let Some(event) = &spawned {
            info!(
                event_id = %event.id,
                event_type = %event.event_type,
                severity = %event.severity,
                end_time = event.end_time,
                "New galaxy event"
            );
            self.store.append(event.clone());
        }

        TickOutcome {
            expired,
            spawned,
            active: self.store.active().len(),
        }
    }

    /// Create and store an event for the definition named by `key`.
    ///
    /// Returns `None`, leaving the store untouched, when no definition
    /// matches. See [`EventCatalog::find`] for the matching rules.
    pub fn trigger(&mut self, key: &str, now: i64) -> Option<ActiveEvent> {
        let definition = self.generator.catalog().find(key)?;
        let event = self.generator.create_event(definition, now);
        info!(
            event_id = %event.id,
            event_type = %event.event_type,
            "Galaxy event triggered manually"
        );
        self.store.append(event.clone());
        Some(event)
    }

    /// Append an already created event.
    pub fn append(&mut self, event: ActiveEvent) {
        self.store.append(event);
    }

    /// Remove expired events; see [`EventStore::cleanup_expired`].
    pub fn cleanup_expired(&mut self, now: i64) -> usize {
        self.store.cleanup_expired(now)
    }

    /// Currently active events.
    pub fn active(&self) -> &[ActiveEvent] {
        self.store.active()
    }

    /// Recently created events, oldest first.
    pub fn history(&self) -> Vec<ActiveEvent> {
        self.store.history().cloned().collect()
    }

    /// Every definition in the catalog.
    pub fn event_types(&self) -> Vec<EventTypeDefinition> {
        self.generator.catalog().iter().cloned().collect()
    }

    /// The generator driving this simulation.
    pub const fn generator(&self) -> &EventGenerator {
        &self.generator
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use galaxy_types::{EventId, Severity};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn catalog() -> Arc<EventCatalog> {
        Arc::new(EventCatalog::builtin())
    }

    #[test]
    fn tick_with_zero_probability_only_cleans_up() {
        let mut sim = GalaxySimulation::new(catalog(), 0.0, 10);
        let flare = sim.trigger("SOLAR_FLARE", 0).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);

        let outcome = sim.tick(&mut rng, flare.end_time);
        assert_eq!(outcome.expired, 1);
        assert!(outcome.spawned.is_none());
        assert_eq!(outcome.active, 0);
    }

    #[test]
    fn spawned_event_is_active_after_tick() {
        let mut sim = GalaxySimulation::new(catalog(), 1.0, 10);
        let mut rng = SmallRng::seed_from_u64(2);

        let outcome = sim.tick(&mut rng, 1_000);
        let spawned = outcome.spawned.unwrap();
        assert_eq!(outcome.active, 1);
        assert_eq!(sim.active().first().map(|e| e.id), Some(spawned.id));
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn tick_cleans_before_it_generates() {
        let mut sim = GalaxySimulation::new(catalog(), 1.0, 10);
        sim.append(ActiveEvent {
            id: EventId::new(),
            event_type: String::from("OLD"),
            name: String::from("Old"),
            description: String::new(),
            icon: String::new(),
            severity: Severity::Low,
            start_time: 0,
            end_time: 500,
        });
        let mut rng = SmallRng::seed_from_u64(3);

        let outcome = sim.tick(&mut rng, 500);
        assert_eq!(outcome.expired, 1);
        assert!(sim.active().iter().all(|e| e.end_time > 500));
        assert_eq!(sim.active().len(), 1);
    }

    #[test]
    fn manual_trigger_accepts_name_or_type() {
        let mut sim = GalaxySimulation::new(catalog(), 0.0, 10);
        assert!(sim.trigger("COMET_FLYBY", 0).is_some());
        assert!(sim.trigger("geomagnetic storm", 0).is_some());
        assert_eq!(sim.active().len(), 2);
    }

    #[test]
    fn unknown_manual_trigger_leaves_store_untouched() {
        let mut sim = GalaxySimulation::new(catalog(), 0.0, 10);
        sim.trigger("COMET_FLYBY", 0);
        let before = sim.active().to_vec();
        assert!(sim.trigger("WORMHOLE", 0).is_none());
        assert_eq!(sim.active(), before.as_slice());
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn independent_instances_do_not_share_state() {
        let mut a = GalaxySimulation::new(catalog(), 0.0, 10);
        let b = GalaxySimulation::new(catalog(), 0.0, 10);
        a.trigger("COMET_FLYBY", 0);
        assert_eq!(a.active().len(), 1);
        assert!(b.active().is_empty());
    }
}
