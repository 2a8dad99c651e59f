//! Event simulation core for the Galaxy Events server.
//!
//! This crate owns everything that decides *what* the galaxy looks like:
//!
//! - [`catalog`] -- the static, validated set of event type definitions
//! - [`generator`] -- two-stage randomness (tick trigger, then weighted type)
//! - [`store`] -- active events plus a bounded creation history
//! - [`simulation`] -- the service object combining generator and store
//! - [`scheduler`] -- the fixed-interval cleanup, generate, publish loop
//! - [`config`] -- environment-driven configuration
//!
//! Transport concerns (sockets, HTTP) live in `galaxy-observer`; the
//! scheduler reaches them only through the [`scheduler::StateSink`] trait.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod generator;
pub mod scheduler;
pub mod simulation;
pub mod store;

pub use catalog::{CatalogError, EventCatalog};
pub use config::{ConfigError, GalaxyConfig, RuntimeMode};
pub use generator::EventGenerator;
pub use scheduler::{PublishError, Scheduler, StateSink, TickReport};
pub use simulation::{GalaxySimulation, TickOutcome};
pub use store::EventStore;
