//! Procedural town geometry: seeded house layouts, ring houses, road ribbons,
//! road intersections and quad mesh warping.
//!
//! Generators are pure: they take a seed, parameters and a [`Catalog`] and
//! return placement commands or mesh buffers. Nothing here touches a scene.

pub mod catalog;
pub mod door;
pub mod error;
pub mod grid;
pub mod house;
pub mod neighborhood;
pub mod placement;
pub mod ring_house;
pub mod rng;
pub mod road;
pub mod road_network;
pub mod warp;

pub use catalog::*;
pub use door::*;
pub use error::*;
pub use grid::*;
pub use house::*;
pub use neighborhood::*;
pub use placement::*;
pub use ring_house::*;
pub use rng::*;
pub use road::*;
pub use road_network::*;
pub use warp::*;
