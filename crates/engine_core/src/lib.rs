//! Core spatial types shared by the town generators and their consumers.
//!
//! This crate provides the foundational types used across the workspace:
//! - Transform and instance-upload data
//! - Generic scene components for the placement collaborator

pub mod components;
pub mod transform;

pub use components::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs::{Entity, World};
