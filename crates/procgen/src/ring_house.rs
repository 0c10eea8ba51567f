//! Ring house generation: a closed building around a courtyard.
//!
//! The footprint is a quadrilateral given by four corner points. Each corner
//! gets a 2x2 block (outer rounded corner, inner corner, two side pieces) and
//! each side between corners gets two rows of wall segments. One side can carry
//! a centred gap into the courtyard.

use engine_core::{look_along, yaw, Transform};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ComponentRole, CornerStyle, Tier, Variant};
use crate::error::ConfigError;
use crate::grid::GridPitch;
use crate::placement::{PlacementCommand, PlacementIndex};
use crate::rng::VariantRng;

const CORNERS: usize = 4;
/// Chance per ground-floor outer segment to hold the side's door.
const DOOR_CHANCE: f32 = 0.2;
/// Chance per ground-floor inner segment to be a window.
const INNER_WINDOW_CHANCE: f32 = 0.2;
/// Chance that an upper floor (or corner side piece) uses windows.
const WINDOW_FLOOR_CHANCE: f32 = 0.5;

const REQUIRED_ROLES: [ComponentRole; 8] = [
    ComponentRole::NormalWall,
    ComponentRole::Door,
    ComponentRole::Window,
    ComponentRole::CornerWall(CornerStyle::Rounded),
    ComponentRole::CornerRoof(CornerStyle::Rounded),
    ComponentRole::SideRoof,
    ComponentRole::InnerCorner(Tier::Wall),
    ComponentRole::InnerCorner(Tier::Roof),
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub pitch: GridPitch,
}

/// Polygon footprint of a ring house, in the root's local space.
///
/// Side `i` runs from `corners[i]` to `corners[(i + 1) % 4]`. The outer row of
/// a side lies at `-right` and the inner row at `+right`, with
/// `right = direction x up`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingFootprint {
    pub corners: Vec<Vec3>,
    pub min_floors: u32,
    pub max_floors: u32,
    /// Side index (0..4) that opens into the courtyard.
    pub gap_side: usize,
    /// Gap width in world units; must be even.
    pub gap_width: u32,
}

impl Default for RingFootprint {
    fn default() -> Self {
        Self {
            corners: vec![
                Vec3::new(-10.0, 0.0, 10.0),
                Vec3::new(10.0, 0.0, 10.0),
                Vec3::new(10.0, 0.0, -10.0),
                Vec3::new(-10.0, 0.0, -10.0),
            ],
            min_floors: 2,
            max_floors: 5,
            gap_side: 3,
            gap_width: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CornerPiece {
    Outer,
    Inner,
    SidePrev,
    SideNext,
}

impl CornerPiece {
    const ALL: [CornerPiece; 4] = [
        CornerPiece::Outer,
        CornerPiece::Inner,
        CornerPiece::SidePrev,
        CornerPiece::SideNext,
    ];

    /// Offset inside the block in half-units, and local yaw. Local +Z points
    /// at the next corner.
    fn local(self) -> (f32, f32, f32) {
        match self {
            CornerPiece::Outer => (-1.0, -1.0, 270.0),
            CornerPiece::Inner => (1.0, 1.0, 90.0),
            CornerPiece::SidePrev => (1.0, -1.0, 270.0),
            CornerPiece::SideNext => (-1.0, 1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Face {
    Outer,
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RingSlot {
    Corner {
        corner: usize,
        piece: CornerPiece,
        h: u32,
    },
    Wall {
        side: usize,
        segment: usize,
        face: Face,
        h: u32,
    },
}

/// Generated ring house.
#[derive(Debug, Clone, PartialEq)]
pub struct RingLayout {
    pub label: String,
    /// Floors including the roof level.
    pub height: u32,
    pub commands: Vec<PlacementCommand>,
    /// Sides whose door had to be forced.
    pub forced_doors: Vec<usize>,
    /// The requested gap did not fit its side and was not cut.
    pub gap_skipped: bool,
}

impl RingLayout {
    pub fn door_count(&self) -> usize {
        self.commands.iter().filter(|c| c.role == ComponentRole::Door).count()
    }
}

pub struct RingHousePlanner<'a> {
    catalog: &'a Catalog,
    config: &'a RingConfig,
}

impl<'a> RingHousePlanner<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a RingConfig) -> Self {
        Self { catalog, config }
    }

    pub fn validate(&self, footprint: &RingFootprint) -> Result<(), ConfigError> {
        let pitch = &self.config.pitch;
        pitch.validate()?;
        if footprint.corners.len() != CORNERS {
            return Err(ConfigError::CornerCount(footprint.corners.len()));
        }
        if footprint.min_floors > footprint.max_floors {
            return Err(ConfigError::InvertedHeightRange {
                min: footprint.min_floors,
                max: footprint.max_floors,
            });
        }
        if footprint.min_floors == 0 {
            return Err(ConfigError::InvalidHeight);
        }
        if footprint.gap_width < 2 || footprint.gap_width % 2 != 0 {
            return Err(ConfigError::OddGapWidth(footprint.gap_width));
        }
        if footprint.gap_side >= CORNERS {
            return Err(ConfigError::InvalidGapSide(footprint.gap_side));
        }
        if let Some(role) = REQUIRED_ROLES.into_iter().find(|role| !self.catalog.has(*role)) {
            return Err(ConfigError::MissingRole(role));
        }
        let min = pitch.unit * 3.0;
        for side in 0..CORNERS {
            let length = footprint.corners[side].distance(footprint.corners[(side + 1) % CORNERS]);
            if length < min {
                return Err(ConfigError::SideTooShort { side, length, min });
            }
        }
        Ok(())
    }

    pub fn plan(&self, label: &str, footprint: &RingFootprint, seed: u64) -> Result<RingLayout, ConfigError> {
        self.validate(footprint)?;

        let mut rng = VariantRng::from_seed(seed);
        let height = rng.range_inclusive(footprint.min_floors, footprint.max_floors);
        let mut build = RingBuild {
            catalog: self.catalog,
            pitch: self.config.pitch,
            height,
            rng,
            index: PlacementIndex::new(),
            forced_doors: Vec::new(),
            gap_skipped: false,
        };

        let corners = &footprint.corners;
        for side in 0..CORNERS {
            let start = corners[side];
            let end = corners[(side + 1) % CORNERS];
            let next = corners[(side + 2) % CORNERS];
            build.corner_block((side + 1) % CORNERS, end, next);
            build.side_walls(label, side, start, end, footprint);
        }

        let commands = build.index.into_commands();
        log::info!(
            "Generated ring house {label}: {} floors, {} pieces, {} forced doors",
            height,
            commands.len(),
            build.forced_doors.len()
        );

        Ok(RingLayout {
            label: label.to_string(),
            height,
            commands,
            forced_doors: build.forced_doors,
            gap_skipped: build.gap_skipped,
        })
    }
}

struct RingBuild<'c> {
    catalog: &'c Catalog,
    pitch: GridPitch,
    height: u32,
    rng: VariantRng,
    index: PlacementIndex<RingSlot>,
    forced_doors: Vec<usize>,
    gap_skipped: bool,
}

impl<'c> RingBuild<'c> {
    fn pick(&mut self, role: ComponentRole) -> Option<&'c Variant> {
        self.rng.pick(self.catalog.variants(role))
    }

    fn emit(&mut self, slot: RingSlot, role: ComponentRole, variant: Option<&Variant>, position: Vec3, rotation: Quat) {
        if let Some(variant) = variant {
            let transform = Transform::from_position_rotation(position, rotation);
            self.index.place(slot, PlacementCommand::new(role, variant, transform));
        }
    }

    fn is_roof(&self, h: u32) -> bool {
        h + 1 == self.height
    }

    fn lift(&self, h: u32) -> Vec3 {
        Vec3::Y * (h as f32 * self.pitch.floor_height)
    }

    /// The 2x2 corner block at `corner`, turned so local +Z points at `next`.
    fn corner_block(&mut self, corner_index: usize, corner: Vec3, next: Vec3) {
        let block = look_along(next - corner);
        let half = self.pitch.unit / 2.0;

        for h in 0..self.height {
            let (side_role, outer_role, inner_role) = if self.is_roof(h) {
                (
                    ComponentRole::SideRoof,
                    ComponentRole::CornerRoof(CornerStyle::Rounded),
                    ComponentRole::InnerCorner(Tier::Roof),
                )
            } else {
                let side = if h > 0 && self.rng.chance(WINDOW_FLOOR_CHANCE) {
                    ComponentRole::Window
                } else {
                    ComponentRole::NormalWall
                };
                (
                    side,
                    ComponentRole::CornerWall(CornerStyle::Rounded),
                    ComponentRole::InnerCorner(Tier::Wall),
                )
            };
            let side_variant = self.pick(side_role);
            let outer_variant = self.pick(outer_role);
            let inner_variant = self.pick(inner_role);

            for piece in CornerPiece::ALL {
                let (x, z, local_yaw) = piece.local();
                let (role, variant) = match piece {
                    CornerPiece::Outer => (outer_role, outer_variant),
                    CornerPiece::Inner => (inner_role, inner_variant),
                    CornerPiece::SidePrev | CornerPiece::SideNext => (side_role, side_variant),
                };
                let position = corner + block * Vec3::new(x * half, 0.0, z * half) + self.lift(h);
                let slot = RingSlot::Corner {
                    corner: corner_index,
                    piece,
                    h,
                };
                self.emit(slot, role, variant, position, block * yaw(local_yaw));
            }
        }
    }

    /// Outer and inner wall rows between two corner blocks.
    fn side_walls(&mut self, label: &str, side: usize, start: Vec3, end: Vec3, footprint: &RingFootprint) {
        let unit = self.pitch.unit;
        let direction = (end - start).normalize_or_zero();
        let rotation = look_along(direction);
        let inner_rotation = rotation * yaw(180.0);
        let right = direction.cross(Vec3::Y).normalize_or_zero();

        let segments = ((start.distance(end) - 2.0 * unit) / unit).floor().max(0.0) as usize;
        let gap_segments = (footprint.gap_width as f32 / unit).floor() as usize;
        let mut gap = None;
        if side == footprint.gap_side {
            if segments >= gap_segments {
                let first = (segments - gap_segments) / 2;
                gap = Some(first..first + gap_segments);
            } else {
                log::warn!(
                    "{label}: side {side} has {segments} segments, too short for a {gap_segments}-segment gap; skipping gap"
                );
                self.gap_skipped = true;
            }
        }
        let is_gap_side = gap.is_some();
        let segment_base = |i: usize| start + direction * (unit + i as f32 * unit + unit / 2.0);

        let mut door_placed = false;
        for h in 0..self.height {
            let ground = h == 0;
            let roof = self.is_roof(h);
            let floor_role = if !ground && !roof && self.rng.chance(WINDOW_FLOOR_CHANCE) {
                ComponentRole::Window
            } else {
                ComponentRole::NormalWall
            };
            let floor_variant = if ground || roof { None } else { self.pick(floor_role) };

            for i in 0..segments {
                if gap.as_ref().is_some_and(|g| g.contains(&i)) {
                    continue;
                }
                let base = segment_base(i) + self.lift(h);

                let (outer_role, outer_variant) = if roof {
                    (ComponentRole::SideRoof, self.pick(ComponentRole::SideRoof))
                } else if ground {
                    if !door_placed && !is_gap_side && self.rng.chance(DOOR_CHANCE) {
                        door_placed = true;
                        (ComponentRole::Door, self.pick(ComponentRole::Door))
                    } else {
                        (ComponentRole::NormalWall, self.pick(ComponentRole::NormalWall))
                    }
                } else {
                    (floor_role, floor_variant)
                };
                let slot = RingSlot::Wall {
                    side,
                    segment: i,
                    face: Face::Outer,
                    h,
                };
                self.emit(slot, outer_role, outer_variant, base - right * (unit / 2.0), rotation);

                let (inner_role, inner_variant) = if roof {
                    (ComponentRole::SideRoof, self.pick(ComponentRole::SideRoof))
                } else if ground {
                    if self.rng.chance(INNER_WINDOW_CHANCE) {
                        (ComponentRole::Window, self.pick(ComponentRole::Window))
                    } else {
                        (ComponentRole::NormalWall, self.pick(ComponentRole::NormalWall))
                    }
                } else {
                    (floor_role, floor_variant)
                };
                let slot = RingSlot::Wall {
                    side,
                    segment: i,
                    face: Face::Inner,
                    h,
                };
                self.emit(slot, inner_role, inner_variant, base + right * (unit / 2.0), inner_rotation);
            }
        }

        if !is_gap_side && !door_placed && segments > 0 {
            let segment = self.rng.next_int(segments);
            let slot = RingSlot::Wall {
                side,
                segment,
                face: Face::Outer,
                h: 0,
            };
            let evicted = self.index.evict(&slot).map(|c| c.role);
            let door = self.pick(ComponentRole::Door);
            self.emit(slot, ComponentRole::Door, door, segment_base(segment) - right * (unit / 2.0), rotation);
            self.forced_doors.push(side);
            log::warn!("{label}: forced door on side {side}, segment {segment} (evicted {evicted:?})");
        }
    }
}
