//! `hecs`-backed scene: the placement and wipe collaborator for the generators.
//!
//! Every footprint gets one root entity `(FootprintRoot, Label, Transform)`.
//! Placed pieces carry `(Transform, Parent, Piece)` with the transform in the
//! root's local space. Roots are reused by label, so regenerating a footprint
//! wipes its old pieces instead of stacking new ones on top. Roots not reused
//! between `begin_build` and `finish_build` are removed with their pieces.

use std::collections::{HashMap, HashSet};

use engine_core::{FootprintRoot, Label, Parent, Transform, TransformRaw};
use hecs::{Entity, World};
use procgen::{ComponentRole, PlacementCommand, PlacementSink, RoadMesh, VariantHandle};

/// What a placed entity is.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub role: ComponentRole,
    pub variant: VariantHandle,
}

/// Road mesh attached to a road entity.
#[derive(Debug, Clone)]
pub struct RoadSurface(pub RoadMesh);

#[derive(Default)]
pub struct TownScene {
    pub world: World,
    roots: HashMap<String, Entity>,
    touched: HashSet<String>,
}

impl TownScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a build pass. Every root must be asked for again before
    /// `finish_build` or it is treated as stale.
    pub fn begin_build(&mut self) {
        self.touched.clear();
    }

    /// Despawn every root (and its pieces) not reused since `begin_build`.
    /// Returns how many roots were removed.
    pub fn finish_build(&mut self) -> usize {
        let stale: Vec<String> = self
            .roots
            .keys()
            .filter(|label| !self.touched.contains(*label))
            .cloned()
            .collect();
        for label in &stale {
            if let Some(root) = self.roots.remove(label) {
                self.wipe(root);
                self.world.despawn(root).ok();
                log::debug!("Removed stale root {label}");
            }
        }
        stale.len()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn piece_count(&self) -> usize {
        self.world.query::<&Piece>().iter().count()
    }

    pub fn children(&self, root: Entity) -> Vec<Entity> {
        self.world
            .query::<&Parent>()
            .iter()
            .filter(|(_, parent)| parent.0 == root)
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Number of placed pieces per role, across the whole scene.
    pub fn role_counts(&self) -> HashMap<ComponentRole, usize> {
        let mut counts = HashMap::new();
        for (_, piece) in self.world.query::<&Piece>().iter() {
            *counts.entry(piece.role).or_insert(0) += 1;
        }
        counts
    }

    pub fn distinct_variants(&self) -> usize {
        self.world
            .query::<&Piece>()
            .iter()
            .map(|(_, piece)| piece.variant.clone())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Replace (or create) the road entity labelled `label`.
    pub fn set_road_mesh(&mut self, label: &str, mesh: RoadMesh) -> Entity {
        let root = self.root(label, Transform::default());
        self.world.insert_one(root, RoadSurface(mesh)).ok();
        root
    }

    pub fn road_vertex_count(&self) -> usize {
        self.world
            .query::<&RoadSurface>()
            .iter()
            .map(|(_, surface)| surface.0.vertices.len())
            .sum()
    }

    /// World-space instance matrices for every placed piece, ready for upload.
    pub fn instance_data(&self) -> Vec<TransformRaw> {
        let mut instances = Vec::new();
        for (_, (local, parent, _)) in self.world.query::<(&Transform, &Parent, &Piece)>().iter() {
            let Ok(root) = self.world.get::<&Transform>(parent.0) else {
                continue;
            };
            instances.push(TransformRaw::from(root.compose(local)));
        }
        instances
    }
}

impl PlacementSink for TownScene {
    type Root = Entity;

    fn root(&mut self, label: &str, transform: Transform) -> Entity {
        self.touched.insert(label.to_string());
        if let Some(&root) = self.roots.get(label) {
            if let Ok(mut current) = self.world.get::<&mut Transform>(root) {
                *current = transform;
            }
            return root;
        }
        let root = self.world.spawn((FootprintRoot, Label::new(label), transform));
        self.roots.insert(label.to_string(), root);
        root
    }

    fn wipe(&mut self, root: Entity) {
        for child in self.children(root) {
            self.world.despawn(child).ok();
        }
    }

    fn place(&mut self, root: Entity, command: &PlacementCommand) {
        self.world.spawn((
            command.transform,
            Parent(root),
            Piece {
                role: command.role,
                variant: command.variant.clone(),
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use procgen::{replace_all, Variant};

    fn wall_at(x: f32) -> PlacementCommand {
        PlacementCommand::new(
            ComponentRole::NormalWall,
            &Variant::new("wall"),
            Transform::from_position(Vec3::new(x, 0.0, 0.0)),
        )
    }

    #[test]
    fn regenerating_wipes_previous_pieces() {
        let mut scene = TownScene::new();
        let root = scene.root("House_0", Transform::default());
        replace_all(&mut scene, root, &[wall_at(0.0), wall_at(2.0), wall_at(4.0)]);
        assert_eq!(scene.piece_count(), 3);

        let again = scene.root("House_0", Transform::from_position(Vec3::X));
        assert_eq!(again, root);
        replace_all(&mut scene, again, &[wall_at(0.0)]);
        assert_eq!(scene.piece_count(), 1);
        assert_eq!(scene.root_count(), 1);
    }

    #[test]
    fn wipe_only_touches_its_root() {
        let mut scene = TownScene::new();
        let a = scene.root("A", Transform::default());
        let b = scene.root("B", Transform::default());
        replace_all(&mut scene, a, &[wall_at(0.0)]);
        replace_all(&mut scene, b, &[wall_at(0.0), wall_at(2.0)]);
        scene.wipe(a);
        assert!(scene.children(a).is_empty());
        assert_eq!(scene.children(b).len(), 2);
    }

    #[test]
    fn finish_build_drops_roots_not_reused() {
        let mut scene = TownScene::new();
        scene.begin_build();
        for label in ["House_0", "House_1", "House_2"] {
            let root = scene.root(label, Transform::default());
            replace_all(&mut scene, root, &[wall_at(0.0), wall_at(2.0)]);
        }
        assert_eq!(scene.finish_build(), 0);
        assert_eq!(scene.piece_count(), 6);

        scene.begin_build();
        let kept = scene.root("House_0", Transform::default());
        replace_all(&mut scene, kept, &[wall_at(0.0)]);
        assert_eq!(scene.finish_build(), 2);
        assert_eq!(scene.root_count(), 1);
        assert_eq!(scene.piece_count(), 1);
        assert_eq!(scene.world.query::<&FootprintRoot>().iter().count(), 1);
        assert!(scene.world.contains(kept));
    }

    #[test]
    fn instances_are_in_world_space() {
        let mut scene = TownScene::new();
        let root = scene.root("R", Transform::from_position_yaw(Vec3::new(10.0, 0.0, 0.0), 90.0));
        replace_all(&mut scene, root, &[wall_at(0.0)]);
        let instances = scene.instance_data();
        assert_eq!(instances.len(), 1);
        assert!((instances[0].model[3][0] - 10.0).abs() < 1e-5);
    }

    #[test]
    fn road_mesh_replaced_by_label() {
        let mut scene = TownScene::new();
        let mesh = RoadMesh {
            vertices: vec![Vec3::ZERO; 4],
            indices: vec![0, 2, 1, 2, 3, 1],
            uvs: vec![glam::Vec2::ZERO; 4],
        };
        scene.set_road_mesh("Road_0", mesh.clone());
        scene.set_road_mesh("Road_0", mesh);
        assert_eq!(scene.road_vertex_count(), 4);
    }
}
