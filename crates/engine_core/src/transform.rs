//! Transform component and utilities for spatial positioning.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
///
/// Negative scale components encode mirroring; generators use them instead of
/// a rotation when a piece is symmetric but its placement is side-dependent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform at `position` turned `degrees` around +Y.
    pub fn from_position_yaw(position: Vec3, degrees: f32) -> Self {
        Self::from_position_rotation(position, yaw(degrees))
    }

    /// Replace the scale, keeping position and rotation.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Map a point from this transform's local space into its parent space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * local)
    }

    /// Express `child` (given in this transform's local space) in parent space.
    /// Scale is taken from the child; parents used by the generators are unscaled.
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            position: self.transform_point(child.position),
            rotation: (self.rotation * child.rotation).normalize(),
            scale: child.scale,
        }
    }

    /// Get the forward direction (positive Z, the direction `look_along` aligns).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Yaw in degrees, in `[0, 360)`, assuming the rotation is a pure yaw.
    pub fn yaw_degrees(&self) -> f32 {
        let forward = self.forward();
        forward.x.atan2(forward.z).to_degrees().rem_euclid(360.0)
    }
}

/// Rotation of `degrees` around +Y.
pub fn yaw(degrees: f32) -> Quat {
    Quat::from_rotation_y(degrees.to_radians())
}

/// Yaw-only rotation whose +Z axis points along the horizontal part of `direction`.
/// Falls back to identity when `direction` has no horizontal component.
pub fn look_along(direction: Vec3) -> Quat {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() < 1e-12 {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(flat.x.atan2(flat.z))
}

/// Raw transform data for instance upload by a renderer-side placement sink.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformRaw {
    pub model: [[f32; 4]; 4],
}

impl From<&Transform> for TransformRaw {
    fn from(transform: &Transform) -> Self {
        Self {
            model: transform.to_matrix().to_cols_array_2d(),
        }
    }
}

impl From<Transform> for TransformRaw {
    fn from(transform: Transform) -> Self {
        Self::from(&transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn look_along_aligns_forward() {
        let dir = Vec3::new(3.0, 0.0, -4.0);
        let t = Transform::from_position_rotation(Vec3::ZERO, look_along(dir));
        assert!(close(t.forward(), dir.normalize()));
    }

    #[test]
    fn look_along_vertical_is_identity() {
        assert_eq!(look_along(Vec3::Y), Quat::IDENTITY);
    }

    #[test]
    fn compose_places_child_in_parent_space() {
        let parent = Transform::from_position_yaw(Vec3::new(10.0, 0.0, 0.0), 90.0);
        let child = Transform::from_position(Vec3::new(0.0, 0.0, 1.0));
        let world = parent.compose(&child);
        // +Z turned 90 degrees about +Y becomes +X.
        assert!(close(world.position, Vec3::new(11.0, 0.0, 0.0)));
    }

    #[test]
    fn yaw_degrees_roundtrips_table_angles() {
        for deg in [0.0_f32, 90.0, 180.0, 270.0] {
            let t = Transform::from_position_yaw(Vec3::ZERO, deg);
            assert!((t.yaw_degrees() - deg).abs() < 1e-3 || (t.yaw_degrees() - deg).abs() > 359.99);
        }
    }

    #[test]
    fn raw_matrix_matches_translation() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let raw = TransformRaw::from(t);
        assert_eq!(raw.model[3][0..3], [1.0, 2.0, 3.0]);
    }
}
