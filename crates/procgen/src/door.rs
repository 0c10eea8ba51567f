//! Entrance guarantee for path-based houses.
//!
//! Runs after the grid pass. If the probabilistic pass left the house without a
//! door, one is forced onto a free ground-floor boundary cell; when every such
//! cell is taken, the piece on a chosen cell is evicted to make room.

use engine_core::Transform;

use crate::catalog::{ComponentRole, Variant};
use crate::error::PlacementFailure;
use crate::grid::{Cell, GridDims, GridPitch};
use crate::placement::{PlacementCommand, PlacementIndex};
use crate::rng::VariantRng;

/// What the resolver did for one footprint.
#[derive(Debug, Clone, PartialEq)]
pub enum EntranceOutcome {
    /// The grid pass already placed a door.
    AlreadyPresent,
    /// A door was forced at `cell`, replacing `evicted` if the cell was taken.
    Forced {
        cell: Cell,
        evicted: Option<ComponentRole>,
    },
    /// No ground-floor, non-corner boundary cell exists.
    Failed(PlacementFailure),
}

/// Ground-floor boundary cells that are not corners, in (length, width) order.
pub fn door_candidates(dims: &GridDims) -> Vec<Cell> {
    let mut cells = Vec::new();
    for l in 0..dims.length {
        for w in 0..dims.width {
            let cell = Cell::new(l, w, 0);
            if cell.is_boundary(dims) && !cell.is_corner(dims) {
                cells.push(cell);
            }
        }
    }
    cells
}

/// Make sure `index` holds at least one door on the ground floor.
pub fn ensure_entrance(
    label: &str,
    doors_placed: usize,
    index: &mut PlacementIndex<Cell>,
    dims: &GridDims,
    pitch: &GridPitch,
    doors: &[Variant],
    rng: &mut VariantRng,
) -> EntranceOutcome {
    if doors_placed > 0 {
        return EntranceOutcome::AlreadyPresent;
    }

    let candidates = door_candidates(dims);
    let free: Vec<Cell> = candidates
        .iter()
        .copied()
        .filter(|cell| !index.is_occupied(cell))
        .collect();

    let (cell, evicted) = if let Some(&cell) = rng.pick(&free) {
        (cell, None)
    } else if let Some(&cell) = rng.pick(&candidates) {
        let evicted = index.evict(&cell).map(|c| c.role);
        (cell, evicted)
    } else {
        log::warn!("{label}: no door candidate on a {}x{} footprint", dims.length, dims.width);
        return EntranceOutcome::Failed(PlacementFailure::NoEntranceCandidate {
            footprint: label.to_string(),
        });
    };

    let Some(door) = rng.pick(doors) else {
        return EntranceOutcome::Failed(PlacementFailure::NoEntranceCandidate {
            footprint: label.to_string(),
        });
    };
    let yaw = cell.side(dims).map(|side| side.door_yaw()).unwrap_or(0.0);
    let position = dims.cell_position(cell, pitch);
    index.place(
        cell,
        PlacementCommand::new(ComponentRole::Door, door, Transform::from_position_yaw(position, yaw)),
    );
    log::warn!("{label}: forced door at {:?} (evicted {:?})", cell, evicted);

    EntranceOutcome::Forced { cell, evicted }
}
