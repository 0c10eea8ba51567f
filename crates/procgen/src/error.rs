//! Error taxonomy for the generators.
//!
//! - [`ConfigError`] aborts one footprint's generation and nothing else.
//! - [`PlacementFailure`] is carried inside a finished layout: the footprint was
//!   generated but one of its guarantees could not be met.
//! - Shortfalls that a fallback repaired, and degenerate input that is skipped,
//!   are reported through `log::warn!` only.

use crate::catalog::ComponentRole;
use thiserror::Error;

/// Invalid footprint, catalog, or generator settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("ring footprint needs exactly 4 corner points, got {0}")]
    CornerCount(usize),

    #[error("side {side} is {length:.1} units long; at least {min:.1} needed for two corners and one wall")]
    SideTooShort { side: usize, length: f32, min: f32 },

    #[error("house width {width} is not one of the allowed widths {allowed:?}")]
    InvalidWidth { width: u32, allowed: Vec<u32> },

    #[error("length {0:.2} does not fit a single grid cell")]
    InvalidLength(f32),

    #[error("minimum house length {length} must be a multiple of {unit} and at least {min}")]
    InvalidMinimumLength { length: f32, unit: f32, min: f32 },

    #[error("height must be at least one floor")]
    InvalidHeight,

    #[error("height range {min}..={max} is inverted")]
    InvertedHeightRange { min: u32, max: u32 },

    #[error("height range {min}..={max} is outside the allowed band {lo}..={hi}")]
    HeightOutOfRange { min: u32, max: u32, lo: u32, hi: u32 },

    #[error("gap width must be an even number of at least 2 units, got {0}")]
    OddGapWidth(u32),

    #[error("gap side index {0} is not in 0..4")]
    InvalidGapSide(usize),

    #[error("catalog has no variants for required role {0}")]
    MissingRole(ComponentRole),

    #[error("a neighborhood needs at least one house")]
    NoHouses,

    #[error("path is {available:.1} units long but {required:.1} are required")]
    PathTooShort { available: f32, required: f32 },

    #[error("grid pitch must be positive (unit {unit}, floor height {floor_height})")]
    InvalidPitch { unit: f32, floor_height: f32 },

    #[error("path start and end coincide")]
    DegeneratePath,
}

/// A generated footprint that could not meet one of its guarantees.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementFailure {
    #[error("footprint {footprint}: no ground-floor position can take a door")]
    NoEntranceCandidate { footprint: String },
}
