//! Identity tags for worker units.

use std::fmt;

/// Probabilistically unique identifier attached to each worker unit.
///
/// Four independent random 64-bit segments rendered as dash-joined hex.
/// Tags exist for diagnostics only (thread names, log fields); call
/// correlation never depends on them, and collisions are harmless.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitTag(String);

impl UnitTag {
    /// Generate a fresh tag.
    pub fn generate() -> Self {
        let tag = (0..4)
            .map(|_| format!("{:x}", rand::random::<u64>()))
            .collect::<Vec<_>>()
            .join("-");
        Self(tag)
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
