//! Component catalog: which interchangeable variants exist for each role.
//!
//! The core never sees concrete assets. A [`VariantHandle`] is an opaque name
//! resolved by the placement collaborator, and variants of the same visual
//! "type" (a double window, a type-A balcony) share a [`Variant::group`] tag.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Rounded or straight building corners; chosen once per footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CornerStyle {
    Rounded,
    Straight,
}

/// Where a neighbour-facing edge piece sits along the shared boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgePosition {
    /// Boundary cell at a corner column.
    Corner,
    /// Boundary cell between the corner columns.
    Middle,
}

/// Wall level or roof level of a piece that exists at both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Wall,
    Roof,
}

/// Role a component plays in a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentRole {
    NormalWall,
    DecoratedWall,
    Window,
    Door,
    Balcony,
    CornerWall(CornerStyle),
    /// Wall piece where a house meets its neighbour.
    EdgeWall(EdgePosition),
    SideRoof,
    CornerRoof(CornerStyle),
    /// Plain roof fill for middle cells.
    TopRoof,
    /// Roof piece where a house meets its neighbour.
    EdgeRoof(EdgePosition),
    /// Roof component spanning two width cells.
    SpecialRoof,
    InnerCorner(Tier),
}

impl ComponentRole {
    pub fn is_roof(self) -> bool {
        matches!(
            self,
            ComponentRole::SideRoof
                | ComponentRole::CornerRoof(_)
                | ComponentRole::TopRoof
                | ComponentRole::EdgeRoof(_)
                | ComponentRole::SpecialRoof
                | ComponentRole::InnerCorner(Tier::Roof)
        )
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Opaque reference to a concrete asset, resolved outside the core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantHandle(pub String);

impl VariantHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One interchangeable option for a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub handle: VariantHandle,
    /// Visual type this variant belongs to. Variants sharing a group are
    /// interchangeable within one building.
    #[serde(default)]
    pub group: u16,
}

impl Variant {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: VariantHandle::new(handle),
            group: 0,
        }
    }

    pub fn grouped(handle: impl Into<String>, group: u16) -> Self {
        Self {
            handle: VariantHandle::new(handle),
            group,
        }
    }
}

/// Role-keyed variant lists. A missing or empty role is a valid "unused" entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    roles: BTreeMap<ComponentRole, Vec<Variant>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of one variant.
    pub fn with(mut self, role: ComponentRole, variant: Variant) -> Self {
        self.insert(role, variant);
        self
    }

    pub fn insert(&mut self, role: ComponentRole, variant: Variant) {
        self.roles.entry(role).or_default().push(variant);
    }

    /// Variants registered for `role`, in insertion order.
    pub fn variants(&self, role: ComponentRole) -> &[Variant] {
        self.roles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, role: ComponentRole) -> bool {
        !self.variants(role).is_empty()
    }

    /// Number of variants across all roles.
    pub fn len(&self) -> usize {
        self.roles.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A catalog with one variant (or a few grouped ones) for every role.
    /// Used by the demo scene and tests.
    pub fn demo() -> Self {
        use ComponentRole::*;
        let mut catalog = Catalog::new();
        let single = [
            NormalWall,
            DecoratedWall,
            Door,
            CornerWall(CornerStyle::Rounded),
            CornerWall(CornerStyle::Straight),
            EdgeWall(EdgePosition::Corner),
            EdgeWall(EdgePosition::Middle),
            SideRoof,
            CornerRoof(CornerStyle::Rounded),
            CornerRoof(CornerStyle::Straight),
            TopRoof,
            EdgeRoof(EdgePosition::Corner),
            EdgeRoof(EdgePosition::Middle),
            SpecialRoof,
            InnerCorner(Tier::Wall),
            InnerCorner(Tier::Roof),
        ];
        for role in single {
            catalog.insert(role, Variant::new(format!("{role}")));
        }
        catalog.insert(Door, Variant::new("Door_arched"));
        catalog.insert(SideRoof, Variant::new("SideRoof_tiled"));
        for (group, name) in [(0, "single"), (1, "double")] {
            for shade in ["a", "b"] {
                catalog.insert(Window, Variant::grouped(format!("Window_{name}_{shade}"), group));
            }
        }
        for (group, name) in [(0, "iron"), (1, "stone")] {
            catalog.insert(Balcony, Variant::grouped(format!("Balcony_{name}"), group));
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_role_is_empty_not_error() {
        let catalog = Catalog::new();
        assert!(catalog.variants(ComponentRole::Window).is_empty());
        assert!(!catalog.has(ComponentRole::Window));
    }

    #[test]
    fn insertion_order_preserved() {
        let catalog = Catalog::new()
            .with(ComponentRole::Door, Variant::new("a"))
            .with(ComponentRole::Door, Variant::new("b"));
        let names: Vec<_> = catalog
            .variants(ComponentRole::Door)
            .iter()
            .map(|v| v.handle.as_str())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn roof_roles_classified() {
        assert!(ComponentRole::SpecialRoof.is_roof());
        assert!(ComponentRole::InnerCorner(Tier::Roof).is_roof());
        assert!(!ComponentRole::InnerCorner(Tier::Wall).is_roof());
        assert!(!ComponentRole::Door.is_roof());
    }

    #[test]
    fn catalog_parses_from_ron() {
        let text = r#"{
            NormalWall: [(handle: "wall")],
            Window: [(handle: "win_a", group: 1), (handle: "win_b", group: 1)],
            CornerWall(Rounded): [(handle: "corner")],
        }"#;
        let catalog: Catalog = ron::from_str(text).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.variants(ComponentRole::Window)[1].group, 1);
        assert!(catalog.has(ComponentRole::CornerWall(CornerStyle::Rounded)));
    }

    #[test]
    fn demo_covers_every_role() {
        let catalog = Catalog::demo();
        assert!(catalog.has(ComponentRole::SpecialRoof));
        assert_eq!(catalog.variants(ComponentRole::Window).len(), 4);
    }
}
