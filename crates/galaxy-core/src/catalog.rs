//! The static catalog of event type definitions.
//!
//! The catalog is built once at process start, either from the built-in
//! defaults or from a YAML file, and never changes afterwards. It is
//! non-empty by construction: the first definition is stored apart from
//! the rest, so weighted selection always has something to return.

use std::collections::BTreeSet;
use std::path::Path;

use galaxy_types::{EventTypeDefinition, Severity};
use serde::Deserialize;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Errors that can occur when building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog contains no definitions.
    #[error("event catalog is empty")]
    Empty,

    /// Two definitions share the same `type` identifier.
    #[error("duplicate event type: {0}")]
    DuplicateType(String),

    /// A definition is malformed.
    #[error("invalid event type {event_type}: {reason}")]
    InvalidDefinition {
        /// Identifier of the offending definition.
        event_type: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Every weight is zero, so nothing could ever be selected fairly.
    #[error("event catalog weights sum to zero")]
    ZeroTotalWeight,

    /// Failed to read the catalog file.
    #[error("failed to read catalog file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse catalog YAML.
    #[error("failed to parse catalog YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for CatalogError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// On-disk layout of a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    events: Vec<EventTypeDefinition>,
}

/// Immutable, non-empty set of event type definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCatalog {
    first: EventTypeDefinition,
    rest: Vec<EventTypeDefinition>,
}

impl EventCatalog {
    /// Build a catalog from `definitions`, validating every entry.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the list is empty, contains duplicate
    /// identifiers, blank names, zero durations, weights outside `[0, 1]`,
    /// or weights that sum to zero.
    pub fn new(definitions: Vec<EventTypeDefinition>) -> Result<Self, CatalogError> {
        {
            let mut seen = BTreeSet::new();
            for def in &definitions {
                validate_definition(def)?;
                if !seen.insert(def.event_type.as_str()) {
                    return Err(CatalogError::DuplicateType(def.event_type.clone()));
                }
            }
        }

        let total: f64 = definitions.iter().map(|d| d.probability).sum();
        if total <= 0.0 {
            if definitions.is_empty() {
                return Err(CatalogError::Empty);
            }
            return Err(CatalogError::ZeroTotalWeight);
        }

        let mut iter = definitions.into_iter();
        let first = iter.next().ok_or(CatalogError::Empty)?;
        Ok(Self {
            first,
            rest: iter.collect(),
        })
    }

    /// Parse and validate a catalog from YAML (`events: [...]`).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Yaml`] on malformed YAML, or any validation
    /// error from [`EventCatalog::new`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yml::from_str(yaml)?;
        Self::new(file.events)
    }

    /// Load and validate a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`EventCatalog::from_yaml_str`].
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// The built-in catalog used when no file is configured.
    pub fn builtin() -> Self {
        Self {
            first: definition(
                "SOLAR_FLARE",
                "Solar Flare",
                "A massive burst of energy from the host star. Increases energy output but damages unshielded electronics.",
                "☀️",
                0.3,
                3 * DAY_MS,
                Severity::Medium,
            ),
            rest: vec![
                definition(
                    "GEOMAGNETIC_STORM",
                    "Geomagnetic Storm",
                    "Disturbance in the planetary magnetosphere.",
                    "⚡",
                    0.25,
                    5 * DAY_MS,
                    Severity::Low,
                ),
                definition(
                    "SUPERNOVA_PRECURSOR",
                    "Supernova Precursor",
                    "A nearby star exhibits signs of imminent collapse. Massive scientific data potential.",
                    "💥",
                    0.05,
                    30 * DAY_MS,
                    Severity::Critical,
                ),
                definition(
                    "COMET_FLYBY",
                    "Comet Flyby",
                    "A rare comet passes through the system. Harvestable resources available.",
                    "☄️",
                    0.15,
                    14 * DAY_MS,
                    Severity::Low,
                ),
            ],
        }
    }

    /// Iterate over every definition in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &EventTypeDefinition> {
        core::iter::once(&self.first).chain(self.rest.iter())
    }

    /// Number of definitions (always at least one).
    pub fn len(&self) -> usize {
        self.rest.len().saturating_add(1)
    }

    /// Always `false`; present for API symmetry with [`EventCatalog::len`].
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Sum of all selection weights.
    pub fn total_weight(&self) -> f64 {
        self.iter().map(|d| d.probability).sum()
    }

    /// Find the definition named by `key`.
    ///
    /// `key` matches an identifier exactly or a display name ignoring
    /// case; surrounding whitespace is ignored. The first match in
    /// catalog order wins.
    pub fn find(&self, key: &str) -> Option<&EventTypeDefinition> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.iter().find(|d| d.matches(key))
    }

    /// Pick a definition from a uniform draw in `[0, 1)`.
    ///
    /// The draw is scaled by the total weight and walked against the
    /// cumulative weights. If rounding pushes it past every band, the
    /// last definition is returned.
    pub fn select_with_draw(&self, draw: f64) -> &EventTypeDefinition {
        let target = draw * self.total_weight();
        let mut cumulative = 0.0;
        for def in self.iter() {
            cumulative += def.probability;
            if target <= cumulative {
                return def;
            }
        }
        self.rest.last().unwrap_or(&self.first)
    }
}

fn validate_definition(def: &EventTypeDefinition) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidDefinition {
        event_type: def.event_type.clone(),
        reason: reason.to_owned(),
    };

    if def.event_type.trim().is_empty() {
        return Err(invalid("type must not be blank"));
    }
    if def.name.trim().is_empty() {
        return Err(invalid("name must not be blank"));
    }
    if !def.probability.is_finite() || !(0.0..=1.0).contains(&def.probability) {
        return Err(invalid("probability must be within [0, 1]"));
    }
    if def.duration == 0 {
        return Err(invalid("duration must be positive"));
    }
    Ok(())
}

fn definition(
    event_type: &str,
    name: &str,
    description: &str,
    icon: &str,
    probability: f64,
    duration: u64,
    severity: Severity,
) -> EventTypeDefinition {
    EventTypeDefinition {
        event_type: event_type.to_owned(),
        name: name.to_owned(),
        description: description.to_owned(),
        icon: icon.to_owned(),
        probability,
        duration,
        severity,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn def(event_type: &str, probability: f64) -> EventTypeDefinition {
        definition(event_type, event_type, "", "", probability, 1_000, Severity::Low)
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let builtin = EventCatalog::builtin();
        let rebuilt = EventCatalog::new(builtin.iter().cloned().collect()).unwrap();
        assert_eq!(rebuilt, builtin);
        assert_eq!(builtin.len(), 4);
    }

    #[test]
    fn builtin_entries_carry_icons() {
        let builtin = EventCatalog::builtin();
        assert!(builtin.iter().all(|d| !d.icon.is_empty()));
        assert_eq!(builtin.find("COMET_FLYBY").map(|d| d.icon.as_str()), Some("☄️"));
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(matches!(EventCatalog::new(Vec::new()), Err(CatalogError::Empty)));
    }

    #[test]
    fn rejects_duplicate_types() {
        let err = EventCatalog::new(vec![def("A", 0.5), def("A", 0.5)]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateType(t) if t == "A"));
    }

    #[test]
    fn rejects_out_of_range_weight() {
        assert!(EventCatalog::new(vec![def("A", 1.5)]).is_err());
        assert!(EventCatalog::new(vec![def("A", -0.1)]).is_err());
        assert!(EventCatalog::new(vec![def("A", f64::NAN)]).is_err());
    }

    #[test]
    fn rejects_all_zero_weights() {
        let err = EventCatalog::new(vec![def("A", 0.0), def("B", 0.0)]).unwrap_err();
        assert!(matches!(err, CatalogError::ZeroTotalWeight));
    }

    #[test]
    fn rejects_zero_duration() {
        let mut d = def("A", 0.5);
        d.duration = 0;
        assert!(EventCatalog::new(vec![d]).is_err());
    }

    #[test]
    fn draw_lands_in_cumulative_bands() {
        let catalog = EventCatalog::new(vec![def("A", 0.9), def("B", 0.1)]).unwrap();
        assert_eq!(catalog.select_with_draw(0.0).event_type, "A");
        assert_eq!(catalog.select_with_draw(0.05).event_type, "A");
        assert_eq!(catalog.select_with_draw(0.89).event_type, "A");
        assert_eq!(catalog.select_with_draw(0.95).event_type, "B");
    }

    #[test]
    fn weights_are_normalized() {
        // 2:1:1 after normalisation regardless of the absolute values.
        let catalog =
            EventCatalog::new(vec![def("A", 0.2), def("B", 0.1), def("C", 0.1)]).unwrap();
        assert_eq!(catalog.select_with_draw(0.49).event_type, "A");
        assert_eq!(catalog.select_with_draw(0.51).event_type, "B");
        assert_eq!(catalog.select_with_draw(0.76).event_type, "C");
    }

    #[test]
    fn draw_past_every_band_falls_back_to_last() {
        let catalog = EventCatalog::new(vec![def("A", 0.5), def("B", 0.5)]).unwrap();
        assert_eq!(catalog.select_with_draw(1.5).event_type, "B");
    }

    #[test]
    fn zero_weight_entries_are_never_chosen_by_interior_draws() {
        let catalog =
            EventCatalog::new(vec![def("A", 0.5), def("Z", 0.0), def("B", 0.5)]).unwrap();
        for draw in [0.1, 0.3, 0.6, 0.9] {
            assert_ne!(catalog.select_with_draw(draw).event_type, "Z");
        }
    }

    #[test]
    fn find_by_type_or_name() {
        let catalog = EventCatalog::builtin();
        assert_eq!(catalog.find("COMET_FLYBY").unwrap().name, "Comet Flyby");
        assert_eq!(catalog.find("comet flyby").unwrap().event_type, "COMET_FLYBY");
        assert_eq!(catalog.find("  Solar Flare ").unwrap().event_type, "SOLAR_FLARE");
        assert!(catalog.find("BLACK_HOLE").is_none());
        assert!(catalog.find("   ").is_none());
    }

    #[test]
    fn parses_yaml_catalog() {
        let yaml = r#"
events:
  - type: ION_STORM
    name: Ion Storm
    description: Charged particles sweep the sector.
    icon: "🌩️"
    probability: 0.6
    duration: 60000
    severity: medium
  - type: GAMMA_BURST
    name: Gamma Burst
    probability: 0.4
    duration: 120000
    severity: critical
"#;
        let catalog = EventCatalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.len(), 2);
        let burst = catalog.find("GAMMA_BURST").unwrap();
        assert_eq!(burst.severity, Severity::Critical);
        assert_eq!(burst.duration, 120_000);
        assert!(burst.description.is_empty());
        assert!(burst.icon.is_empty());
        assert_eq!(catalog.find("ION_STORM").unwrap().icon, "🌩️");
    }

    #[test]
    fn yaml_catalog_is_validated() {
        let yaml = "events: []\n";
        assert!(matches!(EventCatalog::from_yaml_str(yaml), Err(CatalogError::Empty)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EventCatalog::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
