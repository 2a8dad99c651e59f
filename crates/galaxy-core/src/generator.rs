//! Event generation with two independent layers of randomness.
//!
//! Each tick first flips a coin with the configured trigger probability
//! ("does anything happen at all?"). Only when that succeeds is a second
//! uniform draw used to pick the event type by catalog weight ("which
//! kind?"). Keeping the layers apart lets operators tune event cadence
//! without disturbing the event mix, and vice versa.

use std::sync::Arc;

use galaxy_types::{ActiveEvent, EventId, EventTypeDefinition};
use rand::Rng;

use crate::catalog::EventCatalog;

/// Produces new [`ActiveEvent`]s from a shared [`EventCatalog`].
#[derive(Debug, Clone)]
pub struct EventGenerator {
    catalog: Arc<EventCatalog>,
    trigger_probability: f64,
}

impl EventGenerator {
    /// Create a generator over `catalog`.
    ///
    /// `trigger_probability` is clamped into `[0, 1]`; `NaN` is treated
    /// as zero (never trigger).
    pub fn new(catalog: Arc<EventCatalog>, trigger_probability: f64) -> Self {
        let trigger_probability = if trigger_probability.is_nan() {
            0.0
        } else {
            trigger_probability.clamp(0.0, 1.0)
        };
        Self {
            catalog,
            trigger_probability,
        }
    }

    /// The catalog this generator draws from.
    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Per-tick probability that an event is generated.
    pub const fn trigger_probability(&self) -> f64 {
        self.trigger_probability
    }

    /// Draw one definition by catalog weight.
    pub fn select_event_type<R: Rng>(&self, rng: &mut R) -> &EventTypeDefinition {
        self.catalog.select_with_draw(rng.random::<f64>())
    }

    /// Instantiate `definition` at `now` with a fresh id.
    pub fn create_event(&self, definition: &EventTypeDefinition, now: i64) -> ActiveEvent {
        ActiveEvent::from_definition(definition, EventId::new(), now)
    }

    /// Run one tick's worth of generation.
    ///
    /// Returns a new event when the trigger coin succeeds, `None`
    /// otherwise. The type draw is consumed only when the coin succeeds.
    pub fn maybe_trigger<R: Rng>(&self, rng: &mut R, now: i64) -> Option<ActiveEvent> {
        let coin = rng.random::<f64>();
        if coin >= self.trigger_probability {
            return None;
        }
        let draw = rng.random::<f64>();
        self.trigger_from_draws(coin, draw, now)
    }

    /// Deterministic core of [`EventGenerator::maybe_trigger`].
    ///
    /// `coin` decides whether anything happens (`coin < trigger_probability`)
    /// and `draw` selects the type. Both are expected in `[0, 1)`.
    pub fn trigger_from_draws(&self, coin: f64, draw: f64, now: i64) -> Option<ActiveEvent> {
        if coin >= self.trigger_probability {
            return None;
        }
        let definition = self.catalog.select_with_draw(draw);
        Some(self.create_event(definition, now))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use galaxy_types::Severity;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn two_type_catalog() -> Arc<EventCatalog> {
        let def = |t: &str, p: f64| EventTypeDefinition {
            event_type: t.to_owned(),
            name: t.to_owned(),
            description: String::new(),
            icon: String::new(),
            probability: p,
            duration: 1_000,
            severity: Severity::Low,
        };
        Arc::new(EventCatalog::new(vec![def("A", 0.9), def("B", 0.1)]).unwrap())
    }

    #[test]
    fn forced_coin_and_low_draw_yield_type_a() {
        let generator = EventGenerator::new(two_type_catalog(), 1.0);
        let event = generator.trigger_from_draws(0.0, 0.05, 10_000).unwrap();
        assert_eq!(event.event_type, "A");
        assert_eq!(event.start_time, 10_000);
        assert_eq!(event.end_time, event.start_time + 1_000);
    }

    #[test]
    fn failed_coin_yields_nothing() {
        let generator = EventGenerator::new(two_type_catalog(), 0.1);
        assert!(generator.trigger_from_draws(0.5, 0.05, 0).is_none());
        assert!(generator.trigger_from_draws(0.1, 0.05, 0).is_none());
        assert!(generator.trigger_from_draws(0.09, 0.05, 0).is_some());
    }

    #[test]
    fn zero_probability_never_triggers() {
        let generator = EventGenerator::new(two_type_catalog(), 0.0);
        let mut rng = SmallRng::seed_from_u64(7);
        assert!((0..1_000).all(|_| generator.maybe_trigger(&mut rng, 0).is_none()));
    }

    #[test]
    fn certain_probability_always_triggers() {
        let generator = EventGenerator::new(two_type_catalog(), 1.0);
        let mut rng = SmallRng::seed_from_u64(7);
        assert!((0..1_000).all(|_| generator.maybe_trigger(&mut rng, 0).is_some()));
    }

    #[test]
    fn probability_is_clamped() {
        assert!(EventGenerator::new(two_type_catalog(), 7.0).trigger_probability() <= 1.0);
        assert!(EventGenerator::new(two_type_catalog(), -1.0).trigger_probability() >= 0.0);
        assert!(EventGenerator::new(two_type_catalog(), f64::NAN).trigger_probability() <= 0.0);
    }

    #[test]
    fn selection_only_returns_catalog_members() {
        let generator = EventGenerator::new(Arc::new(EventCatalog::builtin()), 1.0);
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..5_000 {
            let chosen = generator.select_event_type(&mut rng);
            assert!(generator.catalog().find(&chosen.event_type).is_some());
        }
    }

    #[test]
    fn selection_frequencies_follow_weights() {
        let generator = EventGenerator::new(Arc::new(EventCatalog::builtin()), 1.0);
        let total = generator.catalog().total_weight();
        let mut rng = SmallRng::seed_from_u64(1234);
        let draws = 100_000_u32;

        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for _ in 0..draws {
            let chosen = generator.select_event_type(&mut rng);
            *counts.entry(chosen.event_type.clone()).or_default() += 1;
        }

        for def in generator.catalog().iter() {
            let expected = def.probability / total;
            let observed = f64::from(counts.get(&def.event_type).copied().unwrap_or(0))
                / f64::from(draws);
            assert!(
                (observed - expected).abs() < 0.01,
                "{}: observed {observed}, expected {expected}",
                def.event_type
            );
        }
    }

    #[test]
    fn trigger_rate_follows_probability() {
        let generator = EventGenerator::new(Arc::new(EventCatalog::builtin()), 0.1);
        let mut rng = SmallRng::seed_from_u64(99);
        let ticks = 100_000_u32;
        let fired = (0..ticks)
            .filter(|_| generator.maybe_trigger(&mut rng, 0).is_some())
            .count();
        let rate = f64::from(u32::try_from(fired).unwrap()) / f64::from(ticks);
        assert!((rate - 0.1).abs() < 0.01, "rate {rate}");
    }

    #[test]
    fn created_events_have_distinct_ids() {
        let generator = EventGenerator::new(two_type_catalog(), 1.0);
        let def = generator.catalog().find("A").unwrap().clone();
        let a = generator.create_event(&def, 5);
        let b = generator.create_event(&def, 5);
        assert_ne!(a.id, b.id);
        assert_eq!(a.start_time, b.start_time);
    }
}
