//! Placement commands and the owned occupancy index.
//!
//! Generators never touch a scene. They emit [`PlacementCommand`]s, keep an
//! index from slot key to command so "is this slot occupied" is a map lookup,
//! and hand the final list to a [`PlacementSink`].

use crate::catalog::{ComponentRole, Variant, VariantHandle};
use engine_core::Transform;
use std::collections::BTreeMap;

/// One component to instantiate, in the footprint root's local space.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementCommand {
    pub role: ComponentRole,
    pub variant: VariantHandle,
    pub transform: Transform,
}

impl PlacementCommand {
    pub fn new(role: ComponentRole, variant: &Variant, transform: Transform) -> Self {
        Self {
            role,
            variant: variant.handle.clone(),
            transform,
        }
    }
}

/// Identifier of a command inside one [`PlacementIndex`].
pub type CommandId = usize;

/// Commands of one footprint, keyed by slot so occupancy checks and eviction
/// are lookups instead of spatial searches.
#[derive(Debug, Clone)]
pub struct PlacementIndex<K: Ord> {
    commands: Vec<Option<PlacementCommand>>,
    by_slot: BTreeMap<K, CommandId>,
}

impl<K: Ord> Default for PlacementIndex<K> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            by_slot: BTreeMap::new(),
        }
    }
}

impl<K: Ord> PlacementIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `command` at `slot`. A command already in that slot is evicted.
    pub fn place(&mut self, slot: K, command: PlacementCommand) -> CommandId {
        let id = self.commands.len();
        self.commands.push(Some(command));
        if let Some(previous) = self.by_slot.insert(slot, id) {
            self.commands[previous] = None;
        }
        id
    }

    pub fn is_occupied(&self, slot: &K) -> bool {
        self.by_slot.contains_key(slot)
    }

    pub fn get(&self, slot: &K) -> Option<&PlacementCommand> {
        let id = *self.by_slot.get(slot)?;
        self.commands.get(id).and_then(Option::as_ref)
    }

    /// Remove and return whatever occupies `slot`.
    pub fn evict(&mut self, slot: &K) -> Option<PlacementCommand> {
        let id = self.by_slot.remove(slot)?;
        self.commands.get_mut(id).and_then(Option::take)
    }

    /// Live commands in emission order.
    pub fn commands(&self) -> impl Iterator<Item = &PlacementCommand> {
        self.commands.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slot.is_empty()
    }

    pub fn into_commands(self) -> Vec<PlacementCommand> {
        self.commands.into_iter().flatten().collect()
    }
}

/// Consumer of generated commands: the scene-side collaborator.
///
/// `wipe` must finish destroying everything previously placed under `root`
/// before the next `place` for that root.
pub trait PlacementSink {
    type Root: Copy;

    /// Create (or reuse) the root that owns one footprint's pieces.
    fn root(&mut self, label: &str, transform: Transform) -> Self::Root;

    /// Destroy every piece previously placed under `root`.
    fn wipe(&mut self, root: Self::Root);

    /// Instantiate one piece under `root`.
    fn place(&mut self, root: Self::Root, command: &PlacementCommand);
}

/// Wipe `root` and replay `commands` into it.
pub fn replace_all<S: PlacementSink>(sink: &mut S, root: S::Root, commands: &[PlacementCommand]) {
    sink.wipe(root);
    for command in commands {
        sink.place(root, command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn cmd(name: &str) -> PlacementCommand {
        PlacementCommand::new(
            ComponentRole::NormalWall,
            &Variant::new(name),
            Transform::from_position(Vec3::ZERO),
        )
    }

    #[test]
    fn evict_frees_slot_and_keeps_order() {
        let mut index = PlacementIndex::new();
        index.place((0, 0), cmd("a"));
        index.place((0, 1), cmd("b"));
        index.place((0, 2), cmd("c"));
        assert!(index.evict(&(0, 1)).is_some());
        assert!(!index.is_occupied(&(0, 1)));
        index.place((0, 1), cmd("door"));
        let names: Vec<_> = index.commands().map(|c| c.variant.as_str()).collect();
        assert_eq!(names, ["a", "c", "door"]);
    }

    #[test]
    fn placing_into_occupied_slot_replaces() {
        let mut index = PlacementIndex::new();
        index.place(1, cmd("a"));
        index.place(1, cmd("b"));
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&1).map(|c| c.variant.as_str()), Some("b"));
        assert_eq!(index.into_commands().len(), 1);
    }

    #[derive(Default)]
    struct Recorder {
        placed: Vec<String>,
        wipes: usize,
    }

    impl PlacementSink for Recorder {
        type Root = ();
        fn root(&mut self, _label: &str, _transform: Transform) {}
        fn wipe(&mut self, _root: ()) {
            self.wipes += 1;
            self.placed.clear();
        }
        fn place(&mut self, _root: (), command: &PlacementCommand) {
            self.placed.push(command.variant.to_string());
        }
    }

    #[test]
    fn replace_all_wipes_first() {
        let mut sink = Recorder::default();
        replace_all(&mut sink, (), &[cmd("a"), cmd("b")]);
        replace_all(&mut sink, (), &[cmd("c")]);
        assert_eq!(sink.wipes, 2);
        assert_eq!(sink.placed, ["c"]);
    }
}
