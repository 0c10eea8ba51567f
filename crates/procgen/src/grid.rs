//! Discrete building grid: pitch, cell addressing, and boundary classification.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// World-space size of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridPitch {
    /// Cell size along length and width.
    pub unit: f32,
    /// Height of one floor.
    pub floor_height: f32,
}

impl Default for GridPitch {
    fn default() -> Self {
        Self {
            unit: 2.0,
            floor_height: 3.0,
        }
    }
}

impl GridPitch {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unit > 0.0 && self.floor_height > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidPitch {
                unit: self.unit,
                floor_height: self.floor_height,
            })
        }
    }

    /// Number of whole cells covering `extent`, rounded to nearest.
    pub fn segments(&self, extent: f32) -> u32 {
        (extent / self.unit).round().max(0.0) as u32
    }

    /// Round `extent` down to a whole number of cells.
    pub fn floor_to_unit(&self, extent: f32) -> f32 {
        (extent / self.unit).floor() * self.unit
    }
}

/// Grid extent in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub length: u32,
    pub width: u32,
    pub height: u32,
}

/// Position class of a (length, width) column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    Corner,
    /// Long side, between the corners.
    EdgeAlongLength,
    /// Front or back face, between the corners.
    EdgeAlongWidth,
    Middle,
}

/// Face of the footprint a boundary cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// `l == 0`
    Front,
    /// `l == length - 1`
    Back,
    /// `w == 0`
    Left,
    /// `w == width - 1`
    Right,
}

/// Which of the four corners a corner cell is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CornerSide {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl CornerSide {
    /// Yaw (degrees) for corner pieces. One quarter turn per corner, going
    /// round the footprint.
    pub fn yaw(self) -> f32 {
        match self {
            CornerSide::FrontLeft => 270.0,
            CornerSide::FrontRight => 180.0,
            CornerSide::BackRight => 90.0,
            CornerSide::BackLeft => 0.0,
        }
    }

    pub fn is_front(self) -> bool {
        matches!(self, CornerSide::FrontLeft | CornerSide::FrontRight)
    }

    pub fn is_right(self) -> bool {
        matches!(self, CornerSide::FrontRight | CornerSide::BackRight)
    }
}

impl Side {
    /// Yaw (degrees) for side and edge pieces facing out of this side.
    pub fn edge_yaw(self) -> f32 {
        match self {
            Side::Front | Side::Right => 180.0,
            Side::Back | Side::Left => 0.0,
        }
    }

    /// Yaw (degrees) for doors: front/back doors face along the path,
    /// left/right doors are turned a quarter.
    pub fn door_yaw(self) -> f32 {
        match self {
            Side::Front | Side::Back => 0.0,
            Side::Left | Side::Right => 90.0,
        }
    }
}

/// One grid cell, addressed by length, width and height index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub l: u32,
    pub w: u32,
    pub h: u32,
}

impl Cell {
    pub fn new(l: u32, w: u32, h: u32) -> Self {
        Self { l, w, h }
    }

    fn on_length_extreme(&self, dims: &GridDims) -> bool {
        self.l == 0 || self.l + 1 == dims.length
    }

    fn on_width_extreme(&self, dims: &GridDims) -> bool {
        self.w == 0 || self.w + 1 == dims.width
    }

    pub fn class(&self, dims: &GridDims) -> CellClass {
        match (self.on_length_extreme(dims), self.on_width_extreme(dims)) {
            (true, true) => CellClass::Corner,
            (false, true) => CellClass::EdgeAlongLength,
            (true, false) => CellClass::EdgeAlongWidth,
            (false, false) => CellClass::Middle,
        }
    }

    pub fn is_corner(&self, dims: &GridDims) -> bool {
        self.class(dims) == CellClass::Corner
    }

    pub fn is_edge_along_length(&self, dims: &GridDims) -> bool {
        self.class(dims) == CellClass::EdgeAlongLength
    }

    pub fn is_edge_along_width(&self, dims: &GridDims) -> bool {
        self.class(dims) == CellClass::EdgeAlongWidth
    }

    pub fn is_middle(&self, dims: &GridDims) -> bool {
        self.class(dims) == CellClass::Middle
    }

    /// On the outer boundary (corner or either edge class).
    pub fn is_boundary(&self, dims: &GridDims) -> bool {
        self.class(dims) != CellClass::Middle
    }

    pub fn is_ground_floor(&self) -> bool {
        self.h == 0
    }

    pub fn is_roof_level(&self, dims: &GridDims) -> bool {
        self.h + 1 == dims.height
    }

    /// Boundary face of a non-corner boundary cell. Front/back win over
    /// left/right, and a single-column grid reports `Left`.
    pub fn side(&self, dims: &GridDims) -> Option<Side> {
        if self.l == 0 {
            Some(Side::Front)
        } else if self.l + 1 == dims.length {
            Some(Side::Back)
        } else if self.w == 0 {
            Some(Side::Left)
        } else if self.w + 1 == dims.width {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Corner identity for corner cells. A single-row grid reports the front,
    /// a single-column grid reports the left.
    pub fn corner(&self, dims: &GridDims) -> Option<CornerSide> {
        if !self.is_corner(dims) {
            return None;
        }
        let front = self.l == 0;
        let left = self.w == 0;
        Some(match (front, left) {
            (true, true) => CornerSide::FrontLeft,
            (true, false) => CornerSide::FrontRight,
            (false, true) => CornerSide::BackLeft,
            (false, false) => CornerSide::BackRight,
        })
    }

    /// Between the two corner columns of a face (width > 1 only).
    pub fn is_interior_column(&self, dims: &GridDims) -> bool {
        dims.width > 1 && self.w > 0 && self.w + 1 < dims.width
    }
}

impl GridDims {
    /// Every cell in (height, length, width) order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |h| {
            (0..self.length).flat_map(move |l| (0..self.width).map(move |w| Cell::new(l, w, h)))
        })
    }

    pub fn cell_count(&self) -> usize {
        (self.length * self.width * self.height) as usize
    }

    /// Offset that centres the grid on the footprint origin in X/Z.
    pub fn center_offset(&self, pitch: &GridPitch) -> Vec3 {
        Vec3::new(
            -(self.width as f32 * pitch.unit) / 2.0 + pitch.unit / 2.0,
            0.0,
            -(self.length as f32 * pitch.unit) / 2.0 + pitch.unit / 2.0,
        )
    }

    /// Local centre of `cell`: width along X, height along Y, length along Z.
    pub fn cell_position(&self, cell: Cell, pitch: &GridPitch) -> Vec3 {
        Vec3::new(
            cell.w as f32 * pitch.unit,
            cell.h as f32 * pitch.floor_height,
            cell.l as f32 * pitch.unit,
        ) + self.center_offset(pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_class_per_column() {
        for (length, width) in [(1, 1), (3, 1), (3, 2), (5, 4), (6, 3)] {
            let dims = GridDims {
                length,
                width,
                height: 2,
            };
            for cell in dims.cells() {
                let flags = [
                    cell.is_corner(&dims),
                    cell.is_edge_along_length(&dims),
                    cell.is_edge_along_width(&dims),
                    cell.is_middle(&dims),
                ];
                assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{cell:?} in {dims:?}");
            }
        }
    }

    #[test]
    fn class_counts_for_wide_grid() {
        let dims = GridDims {
            length: 4,
            width: 3,
            height: 1,
        };
        let count = |class| dims.cells().filter(|c| c.class(&dims) == class).count();
        assert_eq!(count(CellClass::Corner), 4);
        assert_eq!(count(CellClass::EdgeAlongLength), 4);
        assert_eq!(count(CellClass::EdgeAlongWidth), 2);
        assert_eq!(count(CellClass::Middle), 2);
    }

    #[test]
    fn cells_enumerate_height_then_length_then_width() {
        let dims = GridDims {
            length: 2,
            width: 2,
            height: 2,
        };
        let cells: Vec<_> = dims.cells().collect();
        assert_eq!(cells.len(), dims.cell_count());
        assert_eq!(cells[0], Cell::new(0, 0, 0));
        assert_eq!(cells[1], Cell::new(0, 1, 0));
        assert_eq!(cells[2], Cell::new(1, 0, 0));
        assert_eq!(cells[4], Cell::new(0, 0, 1));
    }

    #[test]
    fn positions_are_centred() {
        let dims = GridDims {
            length: 3,
            width: 1,
            height: 3,
        };
        let pitch = GridPitch::default();
        assert_eq!(dims.cell_position(Cell::new(0, 0, 0), &pitch), Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(dims.cell_position(Cell::new(2, 0, 2), &pitch), Vec3::new(0.0, 6.0, 2.0));
    }

    #[test]
    fn sides_and_corners() {
        let dims = GridDims {
            length: 4,
            width: 2,
            height: 1,
        };
        assert_eq!(Cell::new(0, 1, 0).corner(&dims), Some(CornerSide::FrontRight));
        assert_eq!(Cell::new(3, 0, 0).corner(&dims), Some(CornerSide::BackLeft));
        assert_eq!(Cell::new(1, 1, 0).side(&dims), Some(Side::Right));
        assert_eq!(Cell::new(2, 0, 0).side(&dims), Some(Side::Left));
        assert_eq!(Cell::new(2, 0, 0).corner(&dims), None);
    }

    #[test]
    fn pitch_segments_round_to_nearest() {
        let pitch = GridPitch::default();
        assert_eq!(pitch.segments(6.0), 3);
        assert_eq!(pitch.segments(4.0), 2);
        assert_eq!(pitch.segments(7.2), 4);
        assert_eq!(pitch.floor_to_unit(7.9), 6.0);
        assert!(GridPitch { unit: 0.0, floor_height: 3.0 }.validate().is_err());
    }
}
