//! townbuilder: generate a town from a RON description into an ECS scene.

mod config;
mod scene;

use anyhow::Result;
use config::TownConfig;
use engine_core::TransformRaw;
use procgen::{
    replace_all, MeshWarper, NeighborhoodDistributor, PlacementSink, RingHousePlanner, RoadNetwork,
};
use scene::TownScene;

/// Seed stride between generator families, so neighborhoods and ring houses
/// never share a stream.
const RING_SEED_OFFSET: u64 = 10_000;
const NEIGHBORHOOD_SEED_STRIDE: u64 = 1_000;

/// What one build produced.
#[derive(Debug, Default, Clone, PartialEq)]
struct TownSummary {
    houses: usize,
    failed_footprints: usize,
    forced_doors: usize,
    ring_houses: usize,
    roads: usize,
    intersections: usize,
}

fn build_town(config: &TownConfig, scene: &mut TownScene) -> TownSummary {
    let mut summary = TownSummary::default();
    scene.begin_build();

    let distributor = NeighborhoodDistributor::new(&config.catalog, &config.layout);
    for (n, spec) in config.neighborhoods.iter().enumerate() {
        let label = format!("Neighborhood_{n}");
        let seed = config.seed.wrapping_add(n as u64 * NEIGHBORHOOD_SEED_STRIDE);
        let neighborhood = match distributor.generate(&label, spec, seed) {
            Ok(neighborhood) => neighborhood,
            Err(err) => {
                log::error!("{label}: {err}");
                summary.failed_footprints += 1;
                continue;
            }
        };
        for (i, house) in neighborhood.houses.iter().enumerate() {
            match house {
                Ok(layout) => {
                    let root = scene.root(&layout.label, layout.root);
                    replace_all(scene, root, &layout.commands);
                    summary.houses += 1;
                    summary.forced_doors += usize::from(layout.forced_door);
                    if let Some(failure) = &layout.failure {
                        log::error!("{failure}");
                        summary.failed_footprints += 1;
                    }
                }
                Err(err) => {
                    log::error!("{label} house {i}: {err}");
                    summary.failed_footprints += 1;
                }
            }
        }
    }

    let ring_planner = RingHousePlanner::new(&config.catalog, &config.ring);
    for (i, footprint) in config.ring_houses.iter().enumerate() {
        let label = format!("RingHouse_{i}");
        let seed = config.seed.wrapping_add(RING_SEED_OFFSET + i as u64);
        match ring_planner.plan(&label, footprint, seed) {
            Ok(layout) => {
                let root = scene.root(&label, Default::default());
                replace_all(scene, root, &layout.commands);
                summary.ring_houses += 1;
                summary.forced_doors += layout.forced_doors.len();
            }
            Err(err) => {
                log::error!("{label}: {err}");
                summary.failed_footprints += 1;
            }
        }
    }

    let mut network = RoadNetwork::new(config.network.clone());
    for road in &config.roads {
        network.add_polyline(road.to_polyline(&config.network));
    }
    summary.intersections = network.detect_all();
    summary.roads = network.len();

    let mut meshes = network.meshes();
    if let Some(frame) = config.warp {
        let mut warper = MeshWarper::new(frame);
        let handles: Vec<_> = meshes
            .iter()
            .map(|(_, mesh)| warper.register(mesh.vertices.clone()))
            .collect();
        warper.warp_all();
        for ((_, mesh), handle) in meshes.iter_mut().zip(handles) {
            if let Some(live) = warper.live(handle) {
                mesh.vertices = live.to_vec();
            }
        }
    }
    for (id, mesh) in meshes {
        scene.set_road_mesh(&format!("Road_{}", id.0), mesh);
    }

    let stale = scene.finish_build();
    if stale > 0 {
        log::info!("Removed {stale} roots left over from the previous build");
    }
    summary
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = config::town_path();
    let config = TownConfig::load(&path)?;
    log::info!("Building town from {:?} (seed {})", path, config.seed);

    let mut scene = TownScene::new();
    let summary = build_town(&config, &mut scene);

    let instances = scene.instance_data();
    let instance_bytes = bytemuck::cast_slice::<TransformRaw, u8>(&instances).len();
    log::info!(
        "Town ready: {} houses, {} ring houses, {} pieces from {} variants ({} KiB of instance data)",
        summary.houses,
        summary.ring_houses,
        scene.piece_count(),
        scene.distinct_variants(),
        instance_bytes / 1024
    );
    log::info!(
        "Roads: {} roads, {} intersections, {} vertices",
        summary.roads,
        summary.intersections,
        scene.road_vertex_count()
    );
    let mut roles: Vec<_> = scene.role_counts().into_iter().collect();
    roles.sort();
    for (role, count) in roles {
        log::debug!("  {role}: {count}");
    }
    if summary.forced_doors > 0 {
        log::info!("{} doors were forced", summary.forced_doors);
    }
    if summary.failed_footprints > 0 {
        log::warn!("{} footprints failed", summary.failed_footprints);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_town_builds_cleanly() {
        let mut scene = TownScene::new();
        let summary = build_town(&TownConfig::demo(), &mut scene);
        assert_eq!(summary.houses, 4);
        assert_eq!(summary.ring_houses, 1);
        assert_eq!(summary.failed_footprints, 0);
        assert_eq!(summary.roads, 2);
        assert_eq!(summary.intersections, 1);
        assert!(scene.piece_count() > 0);
        assert_eq!(scene.instance_data().len(), scene.piece_count());
        assert!(scene.road_vertex_count() > 0);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let config = TownConfig::demo();
        let mut scene = TownScene::new();
        build_town(&config, &mut scene);
        let pieces = scene.piece_count();
        let roots = scene.root_count();
        build_town(&config, &mut scene);
        assert_eq!(scene.piece_count(), pieces);
        assert_eq!(scene.root_count(), roots);
    }

    #[test]
    fn rebuilding_smaller_town_removes_leftovers() {
        let big = TownConfig::demo();
        let mut small = TownConfig::demo();
        small.neighborhoods[0].house_count = 2;
        small.ring_houses.clear();
        small.roads.truncate(1);

        let mut fresh = TownScene::new();
        build_town(&small, &mut fresh);

        let mut scene = TownScene::new();
        build_town(&big, &mut scene);
        build_town(&small, &mut scene);
        assert_eq!(scene.root_count(), fresh.root_count());
        assert_eq!(scene.piece_count(), fresh.piece_count());
        assert_eq!(scene.road_vertex_count(), fresh.road_vertex_count());
        assert_eq!(scene.instance_data().len(), scene.piece_count());
    }
}
