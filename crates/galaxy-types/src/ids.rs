//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Event identifiers use UUID v7 (time-ordered), so two events created in
//! the same millisecond by the scheduler and a manual trigger still get
//! distinct ids. On the wire the id is a plain string (serde serializes
//! the newtype as its inner value).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for an active galaxy event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventId(pub Uuid);

impl EventId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn ids_are_unique_in_a_tight_loop() {
        let ids: BTreeSet<EventId> = (0..10_000).map(|_| EventId::new()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = EventId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
