//! Path-based house layout.
//!
//! A house is a `length x width x height` grid of cells rooted at the centre of
//! its stretch of path, facing along it. Every cell is classified (corner, edge,
//! middle), then resolved top-down through the rules below, first match wins:
//!
//! - roof level: corner roofs on free corners, edge roofs where the house meets
//!   a neighbour, side roofs on the long sides, special wide roofs in the middle;
//! - wall levels: corner walls on free corners, edge walls against neighbours,
//!   otherwise a seeded pick among wall / window / balcony / decorated wall.
//!
//! Corner style, window type and balcony type are drawn once per house before
//! the cell loop so one building stays visually consistent.
//!
//! **Determinism:** all draws come from one [`VariantRng`] seeded per house, in
//! (height, length, width) order.

use engine_core::{look_along, Transform};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ComponentRole, CornerStyle, EdgePosition, Variant};
use crate::door::{ensure_entrance, EntranceOutcome};
use crate::error::{ConfigError, PlacementFailure};
use crate::grid::{Cell, CellClass, GridDims, GridPitch, Side};
use crate::placement::{PlacementCommand, PlacementIndex};
use crate::rng::VariantRng;

/// Chance that an eligible ground-floor boundary cell becomes the door.
const DOOR_CHANCE: f32 = 0.3;
/// Ground floor thresholds: plain wall, window, balcony; the rest is decorated.
const GROUND_PLAIN: f32 = 0.7;
const GROUND_WINDOW: f32 = 0.85;
const GROUND_BALCONY: f32 = 0.95;
/// Upper floor type thresholds: plain, window; the rest is balcony.
const FLOOR_PLAIN: f32 = 0.6;
const FLOOR_WINDOW: f32 = 0.8;
/// Share of plain upper-floor cells that use the normal (not decorated) wall.
const UPPER_NORMAL: f32 = 0.9;

const MIRROR_X: Vec3 = Vec3::new(-1.0, 1.0, 1.0);
const FLIP_Z: Vec3 = Vec3::new(1.0, 1.0, -1.0);
const MIRROR_FLIP: Vec3 = Vec3::new(-1.0, 1.0, -1.0);

/// Position of a house in its row, which decides where it has neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HouseRole {
    /// Alone on its path: no neighbours.
    Single,
    /// Neighbour behind only.
    First,
    /// Neighbours on both ends.
    Middle,
    /// Neighbour in front only.
    Last,
}

impl HouseRole {
    /// Role of house `index` in a row of `count` houses.
    pub fn for_index(index: usize, count: usize) -> Self {
        if count <= 1 {
            HouseRole::Single
        } else if index == 0 {
            HouseRole::First
        } else if index + 1 == count {
            HouseRole::Last
        } else {
            HouseRole::Middle
        }
    }

    /// The front face (`l == 0`) touches the previous house.
    pub fn touches_previous(self) -> bool {
        matches!(self, HouseRole::Middle | HouseRole::Last)
    }

    /// The back face (`l == length - 1`) touches the next house.
    pub fn touches_next(self) -> bool {
        matches!(self, HouseRole::Middle | HouseRole::First)
    }
}

/// Shared settings for house and neighborhood generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub pitch: GridPitch,
    /// Allowed house widths in world units.
    ///
    /// A house only has middle width cells when it is wider than two grid
    /// units, and `TopRoof` and `SpecialRoof` only go on those cells. With the
    /// default `[2, 4]` and a pitch of 2 no house has them, so those roles stay
    /// unused until a wider width (6 or more here) is allowed.
    pub allowed_widths: Vec<u32>,
    /// Floor band (roof level included) a neighborhood may draw from.
    pub min_floors: u32,
    pub max_floors: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            pitch: GridPitch::default(),
            allowed_widths: vec![2, 4],
            min_floors: 3,
            max_floors: 5,
        }
    }
}

impl LayoutConfig {
    pub fn validate_width(&self, width: u32) -> Result<(), ConfigError> {
        if self.allowed_widths.contains(&width) {
            Ok(())
        } else {
            Err(ConfigError::InvalidWidth {
                width,
                allowed: self.allowed_widths.clone(),
            })
        }
    }
}

/// One house footprint along a path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathFootprint {
    pub start: Vec3,
    pub end: Vec3,
    /// Width across the path in world units.
    pub width: u32,
    /// Floors including the roof level.
    pub height: u32,
    pub role: HouseRole,
}

impl PathFootprint {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Root at the centre of the stretch, +Z along the path.
    pub fn root_transform(&self) -> Transform {
        Transform::from_position_rotation((self.start + self.end) * 0.5, look_along(self.end - self.start))
    }
}

/// Generated house: commands in the root's local space.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseLayout {
    pub label: String,
    pub root: Transform,
    pub dims: GridDims,
    pub corner_style: CornerStyle,
    pub commands: Vec<PlacementCommand>,
    /// The entrance had to be forced after the probabilistic pass.
    pub forced_door: bool,
    pub failure: Option<PlacementFailure>,
}

impl HouseLayout {
    pub fn doors(&self) -> impl Iterator<Item = &PlacementCommand> {
        self.commands.iter().filter(|c| c.role == ComponentRole::Door)
    }

    pub fn door_count(&self) -> usize {
        self.doors().count()
    }
}

/// Piece chosen for one cell before it becomes a command.
struct Piece<'c> {
    role: ComponentRole,
    variant: &'c Variant,
    yaw: f32,
    scale: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FloorType {
    Plain,
    Window,
    Balcony,
}

/// Grid layout planner for path-based houses.
pub struct HousePlanner<'a> {
    catalog: &'a Catalog,
    config: &'a LayoutConfig,
}

impl<'a> HousePlanner<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a LayoutConfig) -> Self {
        Self { catalog, config }
    }

    pub fn plan(&self, label: &str, footprint: &PathFootprint, seed: u64) -> Result<HouseLayout, ConfigError> {
        let pitch = &self.config.pitch;
        pitch.validate()?;
        self.config.validate_width(footprint.width)?;
        if footprint.height == 0 {
            return Err(ConfigError::InvalidHeight);
        }
        let dims = GridDims {
            length: pitch.segments(footprint.length()),
            width: pitch.segments(footprint.width as f32),
            height: footprint.height,
        };
        if dims.length == 0 || dims.width == 0 {
            return Err(ConfigError::InvalidLength(footprint.length()));
        }
        if !self.catalog.has(ComponentRole::Door) {
            return Err(ConfigError::MissingRole(ComponentRole::Door));
        }

        let mut build = HouseBuild::new(self.catalog, dims, footprint.role, seed);
        let mut index = PlacementIndex::new();

        for h in 0..dims.height {
            build.begin_floor(h);
            for l in 0..dims.length {
                for w in 0..dims.width {
                    let cell = Cell::new(l, w, h);
                    let piece = if cell.is_roof_level(&dims) {
                        build.roof_piece(cell)
                    } else {
                        build.wall_piece(cell)
                    };
                    if let Some(piece) = piece {
                        let position = dims.cell_position(cell, pitch);
                        let transform = Transform::from_position_yaw(position, piece.yaw).with_scale(piece.scale);
                        index.place(cell, PlacementCommand::new(piece.role, piece.variant, transform));
                    }
                }
            }
        }

        let outcome = ensure_entrance(
            label,
            build.doors_placed,
            &mut index,
            &dims,
            pitch,
            self.catalog.variants(ComponentRole::Door),
            &mut build.rng,
        );
        let (forced_door, failure) = match outcome {
            EntranceOutcome::AlreadyPresent => (false, None),
            EntranceOutcome::Forced { .. } => (true, None),
            EntranceOutcome::Failed(failure) => (false, Some(failure)),
        };

        let commands = index.into_commands();
        log::debug!(
            "Generated house {label}: {:?}, {}x{}x{} cells, {} pieces",
            footprint.role,
            dims.length,
            dims.width,
            dims.height,
            commands.len()
        );

        Ok(HouseLayout {
            label: label.to_string(),
            root: footprint.root_transform(),
            dims,
            corner_style: build.corner_style,
            commands,
            forced_door,
            failure,
        })
    }
}

/// Per-house generation state: the random stream and the once-per-house picks.
struct HouseBuild<'c> {
    catalog: &'c Catalog,
    dims: GridDims,
    role: HouseRole,
    rng: VariantRng,
    corner_style: CornerStyle,
    corner_wall: Option<&'c Variant>,
    corner_roof: Option<&'c Variant>,
    window_group: Option<u16>,
    balcony_group: Option<u16>,
    floor_type: FloorType,
    doors_placed: usize,
}

impl<'c> HouseBuild<'c> {
    fn new(catalog: &'c Catalog, dims: GridDims, role: HouseRole, seed: u64) -> Self {
        let mut rng = VariantRng::from_seed(seed);
        let corner_style = if rng.chance(0.5) {
            CornerStyle::Rounded
        } else {
            CornerStyle::Straight
        };
        let corner_wall = rng.pick(catalog.variants(ComponentRole::CornerWall(corner_style)));
        let corner_roof = rng.pick(catalog.variants(ComponentRole::CornerRoof(corner_style)));
        let window_group = rng.pick_group(catalog.variants(ComponentRole::Window), |v| v.group);
        let balcony_group = rng.pick_group(catalog.variants(ComponentRole::Balcony), |v| v.group);
        Self {
            catalog,
            dims,
            role,
            rng,
            corner_style,
            corner_wall,
            corner_roof,
            window_group,
            balcony_group,
            floor_type: FloorType::Plain,
            doors_placed: 0,
        }
    }

    /// Upper wall floors draw one type for the whole floor.
    fn begin_floor(&mut self, h: u32) {
        self.floor_type = FloorType::Plain;
        if h == 0 || h + 1 >= self.dims.height {
            return;
        }
        let roll = self.rng.next_f32();
        self.floor_type = if roll < FLOOR_PLAIN {
            FloorType::Plain
        } else if roll < FLOOR_WINDOW && self.window_group.is_some() {
            FloorType::Window
        } else if self.balcony_group.is_some() {
            FloorType::Balcony
        } else {
            FloorType::Plain
        };
    }

    fn pick(&mut self, role: ComponentRole) -> Option<&'c Variant> {
        self.rng.pick(self.catalog.variants(role))
    }

    fn pick_window(&mut self) -> Option<&'c Variant> {
        let group = self.window_group;
        self.rng
            .pick_where(self.catalog.variants(ComponentRole::Window), |v| Some(v.group) == group)
    }

    fn pick_balcony(&mut self) -> Option<&'c Variant> {
        let group = self.balcony_group;
        self.rng
            .pick_where(self.catalog.variants(ComponentRole::Balcony), |v| Some(v.group) == group)
    }

    fn right_column(&self, cell: Cell) -> bool {
        self.dims.width > 1 && cell.w + 1 == self.dims.width
    }

    fn wall_piece(&mut self, cell: Cell) -> Option<Piece<'c>> {
        let dims = self.dims;
        match cell.class(&dims) {
            CellClass::Corner => {
                let corner = cell.corner(&dims)?;
                let right = corner.is_right();
                let open = if corner.is_front() {
                    !self.role.touches_previous()
                } else {
                    !self.role.touches_next()
                };
                if open {
                    let variant = self.corner_wall?;
                    return Some(Piece {
                        role: ComponentRole::CornerWall(self.corner_style),
                        variant,
                        yaw: corner.yaw(),
                        scale: Vec3::ONE,
                    });
                }
                let role = ComponentRole::EdgeWall(EdgePosition::Corner);
                let variant = self.pick(role)?;
                let scale = match (corner.is_front(), right) {
                    (true, true) => MIRROR_X,
                    (true, false) => Vec3::ONE,
                    (false, true) => MIRROR_FLIP,
                    (false, false) => FLIP_Z,
                };
                Some(Piece {
                    role,
                    variant,
                    yaw: 0.0,
                    scale,
                })
            }
            CellClass::EdgeAlongWidth => {
                let side = cell.side(&dims)?;
                let against_neighbour = match side {
                    Side::Front => self.role.touches_previous(),
                    Side::Back => self.role.touches_next(),
                    Side::Left | Side::Right => false,
                };
                if !against_neighbour {
                    return self.fill_piece(cell);
                }
                let role = ComponentRole::EdgeWall(edge_position(cell, &dims));
                let variant = self.pick(role)?;
                Some(Piece {
                    role,
                    variant,
                    yaw: side.edge_yaw(),
                    scale: Vec3::ONE,
                })
            }
            CellClass::EdgeAlongLength | CellClass::Middle => self.fill_piece(cell),
        }
    }

    /// Seeded wall / window / balcony / decorated selection, with the door chance
    /// on ground-floor boundary cells.
    fn fill_piece(&mut self, cell: Cell) -> Option<Piece<'c>> {
        let dims = self.dims;
        let side = cell.side(&dims);
        let scale = if self.right_column(cell) { MIRROR_X } else { Vec3::ONE };

        if cell.is_ground_floor() {
            let door_slot = self.doors_placed == 0 && cell.is_boundary(&dims) && !cell.is_corner(&dims);
            if door_slot && self.catalog.has(ComponentRole::Door) && self.rng.chance(DOOR_CHANCE) {
                if let Some(variant) = self.pick(ComponentRole::Door) {
                    self.doors_placed += 1;
                    return Some(Piece {
                        role: ComponentRole::Door,
                        variant,
                        yaw: side.map(Side::door_yaw).unwrap_or(0.0),
                        scale: Vec3::ONE,
                    });
                }
            }

            let roll = self.rng.next_f32();
            let (role, variant) = if roll < GROUND_PLAIN {
                (ComponentRole::NormalWall, self.pick(ComponentRole::NormalWall))
            } else if roll < GROUND_WINDOW {
                (ComponentRole::Window, self.pick_window())
            } else if roll < GROUND_BALCONY {
                (ComponentRole::Balcony, self.pick_balcony())
            } else {
                (ComponentRole::DecoratedWall, self.pick(ComponentRole::DecoratedWall))
            };
            return variant.map(|variant| Piece {
                role,
                variant,
                yaw: 0.0,
                scale,
            });
        }

        let (role, variant) = match self.floor_type {
            FloorType::Window => (ComponentRole::Window, self.pick_window()),
            FloorType::Balcony => (ComponentRole::Balcony, self.pick_balcony()),
            FloorType::Plain => {
                if self.rng.chance(UPPER_NORMAL) {
                    (ComponentRole::NormalWall, self.pick(ComponentRole::NormalWall))
                } else {
                    (ComponentRole::DecoratedWall, self.pick(ComponentRole::DecoratedWall))
                }
            }
        };
        variant.map(|variant| Piece {
            role,
            variant,
            yaw: 0.0,
            scale,
        })
    }

    fn roof_piece(&mut self, cell: Cell) -> Option<Piece<'c>> {
        let dims = self.dims;
        match cell.class(&dims) {
            CellClass::Corner => {
                let corner = cell.corner(&dims)?;
                let right = corner.is_right();
                let open = if corner.is_front() {
                    !self.role.touches_previous()
                } else {
                    !self.role.touches_next()
                };
                if open {
                    let variant = self.corner_roof?;
                    return Some(Piece {
                        role: ComponentRole::CornerRoof(self.corner_style),
                        variant,
                        yaw: corner.yaw(),
                        scale: Vec3::ONE,
                    });
                }
                let role = ComponentRole::EdgeRoof(EdgePosition::Corner);
                let variant = self.pick(role)?;
                let (yaw, scale) = match (corner.is_front(), right) {
                    (true, true) => (180.0, FLIP_Z),
                    (true, false) => (0.0, Vec3::ONE),
                    (false, true) => (0.0, MIRROR_FLIP),
                    (false, false) => (0.0, FLIP_Z),
                };
                Some(Piece {
                    role,
                    variant,
                    yaw,
                    scale,
                })
            }
            CellClass::EdgeAlongWidth => {
                let side = cell.side(&dims)?;
                let against_neighbour = match side {
                    Side::Front => self.role.touches_previous(),
                    Side::Back => self.role.touches_next(),
                    Side::Left | Side::Right => false,
                };
                let role = if against_neighbour {
                    ComponentRole::EdgeRoof(edge_position(cell, &dims))
                } else {
                    ComponentRole::SideRoof
                };
                let variant = self.pick(role)?;
                Some(Piece {
                    role,
                    variant,
                    yaw: side.edge_yaw(),
                    scale: Vec3::ONE,
                })
            }
            CellClass::EdgeAlongLength => {
                let side = cell.side(&dims)?;
                let variant = self.pick(ComponentRole::SideRoof)?;
                Some(Piece {
                    role: ComponentRole::SideRoof,
                    variant,
                    yaw: side.edge_yaw(),
                    scale: Vec3::ONE,
                })
            }
            CellClass::Middle => {
                // The special roof spans two width cells, so odd columns are covered.
                let role = if self.catalog.has(ComponentRole::SpecialRoof) && dims.width > 1 {
                    if cell.w % 2 != 0 {
                        return None;
                    }
                    ComponentRole::SpecialRoof
                } else {
                    ComponentRole::TopRoof
                };
                let variant = self.pick(role)?;
                Some(Piece {
                    role,
                    variant,
                    yaw: 0.0,
                    scale: Vec3::ONE,
                })
            }
        }
    }
}

fn edge_position(cell: Cell, dims: &GridDims) -> EdgePosition {
    if cell.is_interior_column(dims) {
        EdgePosition::Middle
    } else {
        EdgePosition::Corner
    }
}
