//! Town description. Loaded from `town.ron` (path from the first CLI argument).

use anyhow::{Context, Result};
use glam::Vec3;
use procgen::{
    Catalog, LayoutConfig, NeighborhoodSpec, NetworkConfig, Polyline, RingConfig, RingFootprint, RoadClass,
    WarpFrame,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One road as written in the town file. Width falls back to the class default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSpec {
    pub points: Vec<Vec3>,
    #[serde(default)]
    pub class: RoadClass,
    #[serde(default)]
    pub curve_strengths: Vec<f32>,
    #[serde(default)]
    pub width: Option<f32>,
}

impl RoadSpec {
    pub fn to_polyline(&self, network: &NetworkConfig) -> Polyline {
        let width = self.width.unwrap_or_else(|| network.width_for(self.class));
        Polyline::new(self.points.clone(), width, self.class).with_strengths(self.curve_strengths.clone())
    }
}

/// Everything the builder generates in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TownConfig {
    /// Base seed. Each generator derives its own seed from it.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "Catalog::demo")]
    pub catalog: Catalog,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub neighborhoods: Vec<NeighborhoodSpec>,
    #[serde(default)]
    pub ring: RingConfig,
    #[serde(default)]
    pub ring_houses: Vec<RingFootprint>,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub roads: Vec<RoadSpec>,
    /// Optional warp applied to every road mesh.
    #[serde(default)]
    pub warp: Option<WarpFrame>,
}

fn default_seed() -> u64 {
    42
}

impl Default for TownConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            catalog: Catalog::demo(),
            layout: LayoutConfig::default(),
            neighborhoods: Vec::new(),
            ring: RingConfig::default(),
            ring_houses: Vec::new(),
            network: NetworkConfig::default(),
            roads: Vec::new(),
            warp: None,
        }
    }
}

impl TownConfig {
    /// Built-in scene: one row of houses, one ring house, a small crossroads.
    pub fn demo() -> Self {
        let ring = RingFootprint {
            corners: vec![
                Vec3::new(30.0, 0.0, 30.0),
                Vec3::new(50.0, 0.0, 30.0),
                Vec3::new(50.0, 0.0, 10.0),
                Vec3::new(30.0, 0.0, 10.0),
            ],
            ..RingFootprint::default()
        };
        Self {
            neighborhoods: vec![NeighborhoodSpec {
                start: Vec3::new(-6.0, 0.0, 0.0),
                end: Vec3::new(-6.0, 0.0, 40.0),
                ..NeighborhoodSpec::default()
            }],
            ring_houses: vec![ring],
            roads: vec![
                RoadSpec {
                    points: vec![Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 45.0)],
                    class: RoadClass::Major,
                    curve_strengths: Vec::new(),
                    width: None,
                },
                RoadSpec {
                    points: vec![
                        Vec3::new(-2.0, 0.0, 20.0),
                        Vec3::new(20.0, 0.0, 20.0),
                        Vec3::new(26.0, 0.0, 34.0),
                    ],
                    class: RoadClass::Minor,
                    curve_strengths: vec![0.0, 1.0, 0.0],
                    width: None,
                },
            ],
            warp: Some(WarpFrame {
                bottom_left: Vec3::new(-30.0, 0.0, -30.0),
                bottom_right: Vec3::new(32.0, 0.0, -28.0),
                top_right: Vec3::new(30.0, 0.0, 50.0),
                top_left: Vec3::new(-28.0, 0.0, 50.0),
                min_x: -30.0,
                max_x: 30.0,
                min_z: -30.0,
                max_z: 50.0,
            }),
            ..Self::default()
        }
    }

    /// Load from `path`. A missing file falls back to the demo scene; an
    /// unreadable or invalid one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!("No town file at {:?}, using the demo scene", path);
            return Ok(Self::demo());
        }
        let data = std::fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        let config = ron::from_str(&data).with_context(|| format!("parsing {:?}", path))?;
        Ok(config)
    }
}

/// First CLI argument, or `town.ron` in the current directory.
pub fn town_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("town.ron"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config: TownConfig = ron::from_str(
            r#"(
                seed: 7,
                roads: [(points: [(0.0, 0.0, 0.0), (0.0, 0.0, 10.0)], class: Minor)],
            )"#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.catalog, Catalog::demo());
        assert_eq!(config.layout, LayoutConfig::default());
        let road = config.roads[0].to_polyline(&config.network);
        assert_eq!(road.width, 0.8);
    }

    #[test]
    fn missing_file_gives_demo() {
        let config = TownConfig::load(Path::new("/definitely/not/here/town.ron")).unwrap();
        assert_eq!(config.neighborhoods.len(), 1);
        assert_eq!(config.ring_houses.len(), 1);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let path = std::env::temp_dir().join("townbuilder_invalid_town.ron");
        std::fs::write(&path, "(seed: \"not a number\")").unwrap();
        assert!(TownConfig::load(&path).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn sample_town_file_parses() {
        let config: TownConfig = ron::from_str(include_str!("../../../town.ron")).unwrap();
        assert_eq!(config.seed, 2024);
        assert_eq!(config.neighborhoods.len(), 2);
        assert_eq!(config.roads[2].to_polyline(&config.network).width, 1.2);
        assert!(config.warp.is_none());
    }

    #[test]
    fn demo_round_trips_through_ron() {
        let text = ron::ser::to_string_pretty(&TownConfig::demo(), ron::ser::PrettyConfig::default()).unwrap();
        let back: TownConfig = ron::from_str(&text).unwrap();
        assert_eq!(back.roads.len(), 2);
        assert_eq!(back.warp, TownConfig::demo().warp);
    }
}
