//! Scene components shared by placement sinks.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Links a placed entity to the footprint root that owns it.
/// Wiping a footprint despawns every entity whose parent is that root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Human-readable name for a scene entity (footprint roots, roads).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label(pub String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Tag for the root entity of one generated footprint (house, ring house, road).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FootprintRoot;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_exposes_name() {
        assert_eq!(Label::new("House_0").as_str(), "House_0");
    }
}
