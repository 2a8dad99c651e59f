//! Catalog entries and live event instances.
//!
//! An [`EventTypeDefinition`] is a static description of a category of
//! galactic event. An [`ActiveEvent`] is one occurrence of such a
//! category with a fixed lifetime window `[start_time, end_time)`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Severity;
use crate::ids::EventId;

/// Static catalog entry describing a category of event.
///
/// `probability` is a relative weight among all catalog entries, not an
/// absolute per-tick chance. Whether anything happens on a given tick is
/// decided separately by the generator's trigger probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EventTypeDefinition {
    /// Stable identifier (e.g. `SOLAR_FLARE`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Human-readable display name.
    pub name: String,
    /// Flavour text shown alongside the event.
    #[serde(default)]
    pub description: String,
    /// Glyph the browser widgets render next to the name.
    #[serde(default)]
    pub icon: String,
    /// Relative selection weight in `[0, 1]`.
    pub probability: f64,
    /// Lifetime of a spawned event in milliseconds.
    #[ts(type = "number")]
    pub duration: u64,
    /// Severity copied onto every spawned event.
    pub severity: Severity,
}

impl EventTypeDefinition {
    /// Whether `key` names this definition.
    ///
    /// Matches the identifier exactly or the display name ignoring case.
    pub fn matches(&self, key: &str) -> bool {
        self.event_type == key || self.name.eq_ignore_ascii_case(key)
    }
}

/// One occurrence of a catalog event with a defined lifetime window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ActiveEvent {
    /// Unique identifier.
    pub id: EventId,
    /// Identifier of the originating definition.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Display name copied from the definition.
    pub name: String,
    /// Description copied from the definition.
    pub description: String,
    /// Icon copied from the definition.
    #[serde(default)]
    pub icon: String,
    /// Severity copied from the definition.
    pub severity: Severity,
    /// Creation time in milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub start_time: i64,
    /// Expiry time in milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub end_time: i64,
}

impl ActiveEvent {
    /// Instantiate `definition` at `now` (epoch milliseconds).
    ///
    /// `end_time` saturates at `i64::MAX` for absurdly long durations.
    pub fn from_definition(definition: &EventTypeDefinition, id: EventId, now: i64) -> Self {
        let duration = i64::try_from(definition.duration).unwrap_or(i64::MAX);
        Self {
            id,
            event_type: definition.event_type.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            icon: definition.icon.clone(),
            severity: definition.severity,
            start_time: now,
            end_time: now.saturating_add(duration),
        }
    }

    /// Whether the event has expired at `now`.
    ///
    /// An event is expired from the instant `end_time` is reached.
    pub const fn is_expired_at(&self, now: i64) -> bool {
        self.end_time <= now
    }
}
