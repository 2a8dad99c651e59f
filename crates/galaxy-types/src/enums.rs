//! Enumeration types for the Galaxy Events server.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// How disruptive an event is for the systems it affects.
///
/// Serialized in lowercase (`"low"`, `"medium"`, `"critical"`), which is
/// what the browser widgets key their colour scheme on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Cosmetic or mildly inconvenient.
    Low,
    /// Noticeable impact on energy or equipment.
    Medium,
    /// Rare, high-impact event.
    Critical,
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Critical => "critical",
        };
        f.write_str(label)
    }
}
