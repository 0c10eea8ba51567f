//! Neighborhood distribution: a row of houses along one path.
//!
//! The path length is split into `house_count` lengths that are each a whole
//! number of grid units and at least the minimum length. Houses are laid end
//! to end from the path start and generated independently, each with its own
//! seed, so one bad house never takes the rest of the row down with it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::ConfigError;
use crate::grid::GridPitch;
use crate::house::{HouseLayout, HousePlanner, HouseRole, LayoutConfig, PathFootprint};
use crate::rng::VariantRng;

/// Leftover below this is float noise, not length to hand out.
const LENGTH_EPSILON: f32 = 0.01;
/// Minimum house length in grid units.
const MIN_LENGTH_UNITS: f32 = 3.0;

/// A straight path to fill with houses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodSpec {
    pub start: Vec3,
    pub end: Vec3,
    pub house_count: usize,
    /// House width in world units.
    pub width: u32,
    /// Minimum house length in world units.
    pub min_length: f32,
    pub min_floors: u32,
    pub max_floors: u32,
}

impl Default for NeighborhoodSpec {
    fn default() -> Self {
        Self {
            start: Vec3::ZERO,
            end: Vec3::new(0.0, 0.0, 40.0),
            house_count: 4,
            width: 4,
            min_length: 6.0,
            min_floors: 3,
            max_floors: 5,
        }
    }
}

/// Result of one neighborhood pass. Per-house errors are kept next to the
/// houses that did generate.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    pub footprints: Vec<PathFootprint>,
    pub houses: Vec<Result<HouseLayout, ConfigError>>,
}

impl Neighborhood {
    pub fn generated(&self) -> impl Iterator<Item = &HouseLayout> {
        self.houses.iter().filter_map(|h| h.as_ref().ok())
    }

    pub fn failed(&self) -> usize {
        self.houses.iter().filter(|h| h.is_err()).count()
    }
}

pub struct NeighborhoodDistributor<'a> {
    catalog: &'a Catalog,
    config: &'a LayoutConfig,
}

impl<'a> NeighborhoodDistributor<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a LayoutConfig) -> Self {
        Self { catalog, config }
    }

    pub fn validate(&self, spec: &NeighborhoodSpec) -> Result<(), ConfigError> {
        let pitch = &self.config.pitch;
        pitch.validate()?;
        if spec.house_count == 0 {
            return Err(ConfigError::NoHouses);
        }
        self.config.validate_width(spec.width)?;

        let min = pitch.unit * MIN_LENGTH_UNITS;
        let units = spec.min_length / pitch.unit;
        if (units - units.round()).abs() > 1e-4 || spec.min_length < min {
            return Err(ConfigError::InvalidMinimumLength {
                length: spec.min_length,
                unit: pitch.unit,
                min,
            });
        }

        if spec.min_floors > spec.max_floors {
            return Err(ConfigError::InvertedHeightRange {
                min: spec.min_floors,
                max: spec.max_floors,
            });
        }
        if spec.min_floors < self.config.min_floors || spec.max_floors > self.config.max_floors {
            return Err(ConfigError::HeightOutOfRange {
                min: spec.min_floors,
                max: spec.max_floors,
                lo: self.config.min_floors,
                hi: self.config.max_floors,
            });
        }

        let available = spec.start.distance(spec.end);
        if available < LENGTH_EPSILON {
            return Err(ConfigError::DegeneratePath);
        }
        let required = spec.house_count as f32 * spec.min_length;
        if required > available {
            return Err(ConfigError::PathTooShort { available, required });
        }
        Ok(())
    }

    /// Split the path into footprints without generating any house.
    pub fn footprints(&self, spec: &NeighborhoodSpec, seed: u64) -> Result<Vec<PathFootprint>, ConfigError> {
        self.validate(spec)?;
        let mut rng = VariantRng::from_seed(seed);
        let total = spec.start.distance(spec.end);
        let lengths = distribute_lengths(total, spec.house_count, spec.min_length, &self.config.pitch, &mut rng);

        let direction = (spec.end - spec.start).normalize_or_zero();
        let mut cursor = spec.start;
        let mut footprints = Vec::with_capacity(lengths.len());
        for (i, length) in lengths.iter().enumerate() {
            let height = rng.range_inclusive(spec.min_floors, spec.max_floors);
            let end = cursor + direction * *length;
            footprints.push(PathFootprint {
                start: cursor,
                end,
                width: spec.width,
                height,
                role: HouseRole::for_index(i, spec.house_count),
            });
            cursor = end;
        }
        Ok(footprints)
    }

    /// Distribute the path and generate every house. House `i` is seeded with
    /// `seed + i + 1`.
    pub fn generate(&self, label: &str, spec: &NeighborhoodSpec, seed: u64) -> Result<Neighborhood, ConfigError> {
        let footprints = self.footprints(spec, seed)?;
        Ok(self.plan_houses(label, footprints, seed))
    }

    /// Generate one house per footprint. A house that fails is logged and kept
    /// as its error; the others still generate.
    pub fn plan_houses(&self, label: &str, footprints: Vec<PathFootprint>, seed: u64) -> Neighborhood {
        let planner = HousePlanner::new(self.catalog, self.config);
        let houses: Vec<_> = footprints
            .iter()
            .enumerate()
            .map(|(i, footprint)| {
                let house_seed = seed.wrapping_add(i as u64 + 1);
                let result = planner.plan(&format!("{label}_House_{i}"), footprint, house_seed);
                if let Err(err) = &result {
                    log::warn!("{label}: house {i} skipped: {err}");
                }
                result
            })
            .collect();

        let neighborhood = Neighborhood { footprints, houses };
        log::info!(
            "Generated neighborhood {label}: {} houses ({} failed)",
            neighborhood.houses.len(),
            neighborhood.failed()
        );
        neighborhood
    }
}

/// Split `total` into `count` lengths, each a whole number of `pitch.unit` and
/// at least `min_length`. The last length absorbs what the draws left over.
pub fn distribute_lengths(total: f32, count: usize, min_length: f32, pitch: &GridPitch, rng: &mut VariantRng) -> Vec<f32> {
    let mut remaining = total - count as f32 * min_length;
    let mut lengths = Vec::with_capacity(count);
    for i in 0..count {
        let mut extra = 0.0;
        if remaining > 0.0 {
            extra = pitch.floor_to_unit(rng.up_to(remaining / (count - i) as f32));
            remaining -= extra;
        }
        lengths.push(pitch.floor_to_unit(min_length + extra).max(min_length));
    }

    let diff = total - lengths.iter().sum::<f32>();
    if diff.abs() > LENGTH_EPSILON {
        if let Some(last) = lengths.last_mut() {
            *last = pitch.floor_to_unit(*last + diff).max(min_length);
        }
    }
    lengths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ComponentRole, Variant};

    fn distributor_parts() -> (Catalog, LayoutConfig) {
        (Catalog::demo(), LayoutConfig::default())
    }

    #[test]
    fn lengths_are_whole_units_above_minimum() {
        let pitch = GridPitch::default();
        for seed in 0..50 {
            let mut rng = VariantRng::from_seed(seed);
            let lengths = distribute_lengths(41.3, 5, 6.0, &pitch, &mut rng);
            assert_eq!(lengths.len(), 5);
            for l in &lengths {
                assert!(*l >= 6.0);
                assert_eq!(l % 2.0, 0.0);
            }
            let total: f32 = lengths.iter().sum();
            assert!(total <= 41.3 && total > 41.3 - 2.0, "seed {seed}: {lengths:?}");
        }
    }

    #[test]
    fn exact_fit_gives_minimum_lengths() {
        let mut rng = VariantRng::from_seed(3);
        let lengths = distribute_lengths(18.0, 3, 6.0, &GridPitch::default(), &mut rng);
        assert_eq!(lengths, [6.0, 6.0, 6.0]);
    }

    #[test]
    fn houses_are_laid_end_to_end() {
        let (catalog, config) = distributor_parts();
        let spec = NeighborhoodSpec::default();
        let footprints = NeighborhoodDistributor::new(&catalog, &config)
            .footprints(&spec, 10)
            .unwrap();
        assert_eq!(footprints.len(), 4);
        assert_eq!(footprints[0].start, spec.start);
        for pair in footprints.windows(2) {
            assert!(pair[0].end.distance(pair[1].start) < 1e-5);
        }
        let roles: Vec<_> = footprints.iter().map(|f| f.role).collect();
        assert_eq!(
            roles,
            [HouseRole::First, HouseRole::Middle, HouseRole::Middle, HouseRole::Last]
        );
        assert!(footprints.iter().all(|f| (3..=5).contains(&f.height)));
    }

    #[test]
    fn single_house_row() {
        let (catalog, config) = distributor_parts();
        let spec = NeighborhoodSpec {
            house_count: 1,
            end: Vec3::new(10.0, 0.0, 0.0),
            ..NeighborhoodSpec::default()
        };
        let hood = NeighborhoodDistributor::new(&catalog, &config)
            .generate("Solo", &spec, 0)
            .unwrap();
        assert_eq!(hood.footprints[0].role, HouseRole::Single);
        assert_eq!(hood.generated().count(), 1);
    }

    #[test]
    fn every_house_has_a_door() {
        let (catalog, config) = distributor_parts();
        let spec = NeighborhoodSpec::default();
        let hood = NeighborhoodDistributor::new(&catalog, &config)
            .generate("Row", &spec, 77)
            .unwrap();
        assert_eq!(hood.failed(), 0);
        for house in hood.generated() {
            assert!(house.door_count() >= 1, "{}", house.label);
        }
    }

    #[test]
    fn bad_house_does_not_stop_the_row() {
        let (catalog, config) = distributor_parts();
        let distributor = NeighborhoodDistributor::new(&catalog, &config);
        let mut footprints = distributor.footprints(&NeighborhoodSpec::default(), 4).unwrap();
        footprints[1].height = 0;

        let hood = distributor.plan_houses("Row", footprints, 4);
        assert_eq!(hood.houses.len(), 4);
        assert_eq!(hood.failed(), 1);
        assert_eq!(hood.houses[1], Err(ConfigError::InvalidHeight));
        let labels: Vec<_> = hood.generated().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, ["Row_House_0", "Row_House_2", "Row_House_3"]);
    }

    #[test]
    fn catalog_without_doors_fails_every_house_but_not_the_row() {
        let config = LayoutConfig::default();
        let catalog = Catalog::new().with(ComponentRole::NormalWall, Variant::new("wall"));
        let spec = NeighborhoodSpec::default();
        let hood = NeighborhoodDistributor::new(&catalog, &config)
            .generate("Bare", &spec, 1)
            .unwrap();
        assert_eq!(hood.footprints.len(), spec.house_count);
        assert_eq!(hood.failed(), spec.house_count);
        assert_eq!(hood.generated().count(), 0);
    }

    #[test]
    fn same_seed_same_row() {
        let (catalog, config) = distributor_parts();
        let distributor = NeighborhoodDistributor::new(&catalog, &config);
        let spec = NeighborhoodSpec::default();
        let a = distributor.generate("Row", &spec, 5).unwrap();
        let b = distributor.generate("Row", &spec, 5).unwrap();
        assert_eq!(a.footprints, b.footprints);
        assert_eq!(a.houses, b.houses);
    }

    #[test]
    fn validation() {
        let (catalog, config) = distributor_parts();
        let distributor = NeighborhoodDistributor::new(&catalog, &config);
        let base = NeighborhoodSpec::default();

        let spec = NeighborhoodSpec { house_count: 0, ..base.clone() };
        assert_eq!(distributor.validate(&spec), Err(ConfigError::NoHouses));

        let spec = NeighborhoodSpec { min_length: 7.0, ..base.clone() };
        assert!(matches!(distributor.validate(&spec), Err(ConfigError::InvalidMinimumLength { .. })));

        let spec = NeighborhoodSpec { min_length: 4.0, ..base.clone() };
        assert!(matches!(distributor.validate(&spec), Err(ConfigError::InvalidMinimumLength { .. })));

        let spec = NeighborhoodSpec { min_floors: 2, ..base.clone() };
        assert!(matches!(distributor.validate(&spec), Err(ConfigError::HeightOutOfRange { .. })));

        let spec = NeighborhoodSpec { house_count: 10, ..base.clone() };
        assert!(matches!(distributor.validate(&spec), Err(ConfigError::PathTooShort { .. })));

        let spec = NeighborhoodSpec { end: base.start, ..base.clone() };
        assert_eq!(distributor.validate(&spec), Err(ConfigError::DegeneratePath));

        let spec = NeighborhoodSpec { width: 3, ..base };
        assert!(matches!(distributor.validate(&spec), Err(ConfigError::InvalidWidth { .. })));
    }
}
