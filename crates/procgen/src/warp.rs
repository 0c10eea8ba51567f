//! Bilinear quad warping of existing meshes.
//!
//! A [`WarpFrame`] maps an axis-aligned source rectangle on the XZ plane onto
//! an arbitrary quadrilateral. Heights are left alone. [`MeshWarper`] keeps the
//! untouched vertices of every registered mesh and always warps from those, so
//! warping twice with the same frame gives the same result as warping once.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Corners closer than this are treated as coincident.
const DEGENERATE_DISTANCE: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpFrame {
    pub bottom_left: Vec3,
    pub bottom_right: Vec3,
    pub top_right: Vec3,
    pub top_left: Vec3,
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for WarpFrame {
    fn default() -> Self {
        Self::unit_square(2.0)
    }
}

/// Inverse lerp clamped to `[0, 1]`; an empty range maps to 0.
fn normalize(min: f32, max: f32, value: f32) -> f32 {
    if (max - min).abs() < f32::EPSILON {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

impl WarpFrame {
    /// Identity frame: corners on the source square of half-size `half`.
    pub fn unit_square(half: f32) -> Self {
        Self {
            bottom_left: Vec3::new(-half, 0.0, -half),
            bottom_right: Vec3::new(half, 0.0, -half),
            top_right: Vec3::new(half, 0.0, half),
            top_left: Vec3::new(-half, 0.0, half),
            min_x: -half,
            max_x: half,
            min_z: -half,
            max_z: half,
        }
    }

    pub fn corners(&self) -> [Vec3; 4] {
        [self.bottom_left, self.bottom_right, self.top_right, self.top_left]
    }

    /// Two or more corners coincide.
    pub fn is_degenerate(&self) -> bool {
        let corners = self.corners();
        corners
            .iter()
            .enumerate()
            .any(|(i, a)| corners[i + 1..].iter().any(|b| a.distance(*b) < DEGENERATE_DISTANCE))
    }

    /// Warp one point given in deformer space.
    pub fn warp_point(&self, point: Vec3) -> Vec3 {
        let u = normalize(self.min_x, self.max_x, point.x);
        let v = normalize(self.min_z, self.max_z, point.z);
        let bottom = self.bottom_left.lerp(self.bottom_right, u);
        let top = self.top_left.lerp(self.top_right, u);
        let mut warped = bottom.lerp(top, v);
        warped.y = point.y;
        warped
    }
}

/// Index of a mesh registered with a [`MeshWarper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(usize);

#[derive(Debug, Clone)]
struct WarpedMesh {
    original: Vec<Vec3>,
    live: Vec<Vec3>,
    to_deformer: Mat4,
    from_deformer: Mat4,
}

#[derive(Debug, Clone, Default)]
pub struct MeshWarper {
    frame: WarpFrame,
    meshes: Vec<WarpedMesh>,
}

impl MeshWarper {
    pub fn new(frame: WarpFrame) -> Self {
        Self {
            frame,
            meshes: Vec::new(),
        }
    }

    pub fn frame(&self) -> &WarpFrame {
        &self.frame
    }

    /// Move the corners. Live buffers are untouched until the next warp.
    pub fn set_frame(&mut self, frame: WarpFrame) {
        self.frame = frame;
    }

    /// Register a mesh whose vertices live in the deformer's space.
    pub fn register(&mut self, vertices: Vec<Vec3>) -> MeshHandle {
        self.register_with_transform(vertices, Mat4::IDENTITY)
    }

    /// Register a mesh with its mesh-to-deformer matrix (typically the mesh
    /// node's transform relative to the deformer).
    pub fn register_with_transform(&mut self, vertices: Vec<Vec3>, to_deformer: Mat4) -> MeshHandle {
        let (to_deformer, from_deformer) = if to_deformer.determinant().abs() < f32::EPSILON {
            log::warn!("Warp: singular mesh transform, using identity");
            (Mat4::IDENTITY, Mat4::IDENTITY)
        } else {
            (to_deformer, to_deformer.inverse())
        };
        self.meshes.push(WarpedMesh {
            live: vertices.clone(),
            original: vertices,
            to_deformer,
            from_deformer,
        });
        MeshHandle(self.meshes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn original(&self, handle: MeshHandle) -> Option<&[Vec3]> {
        self.meshes.get(handle.0).map(|m| m.original.as_slice())
    }

    /// Current (possibly warped) vertices.
    pub fn live(&self, handle: MeshHandle) -> Option<&[Vec3]> {
        self.meshes.get(handle.0).map(|m| m.live.as_slice())
    }

    /// Rewrite one mesh's live buffer from its original vertices.
    pub fn warp(&mut self, handle: MeshHandle) -> Option<&[Vec3]> {
        let degenerate = self.frame.is_degenerate();
        if degenerate {
            log::warn!("Warp: corners coincide, restoring original vertices");
        }
        let frame = self.frame;
        let mesh = self.meshes.get_mut(handle.0)?;
        mesh.live = if degenerate {
            mesh.original.clone()
        } else {
            mesh.original
                .iter()
                .map(|v| {
                    let local = mesh.to_deformer.transform_point3(*v);
                    mesh.from_deformer.transform_point3(frame.warp_point(local))
                })
                .collect()
        };
        Some(mesh.live.as_slice())
    }

    /// Warp every registered mesh.
    pub fn warp_all(&mut self) {
        for i in 0..self.meshes.len() {
            self.warp(MeshHandle(i));
        }
        log::debug!("Warped {} meshes", self.meshes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Transform;

    fn close(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-5
    }

    fn skewed() -> WarpFrame {
        WarpFrame {
            bottom_left: Vec3::new(-3.0, 0.0, -2.0),
            bottom_right: Vec3::new(2.0, 0.0, -2.5),
            top_right: Vec3::new(4.0, 0.0, 3.0),
            top_left: Vec3::new(-2.0, 0.0, 2.0),
            ..WarpFrame::default()
        }
    }

    #[test]
    fn source_corners_map_to_frame_corners() {
        let frame = skewed();
        assert!(close(frame.warp_point(Vec3::new(-2.0, 0.0, -2.0)), frame.bottom_left));
        assert!(close(frame.warp_point(Vec3::new(2.0, 0.0, -2.0)), frame.bottom_right));
        assert!(close(frame.warp_point(Vec3::new(2.0, 0.0, 2.0)), frame.top_right));
        assert!(close(frame.warp_point(Vec3::new(-2.0, 0.0, 2.0)), frame.top_left));
    }

    #[test]
    fn identity_frame_is_identity_inside() {
        let frame = WarpFrame::default();
        let p = Vec3::new(0.5, 1.0, -1.25);
        assert!(close(frame.warp_point(p), p));
    }

    #[test]
    fn height_is_preserved_and_outside_clamps() {
        let frame = skewed();
        let warped = frame.warp_point(Vec3::new(10.0, 7.5, 10.0));
        assert_eq!(warped.y, 7.5);
        assert!(close(warped, Vec3::new(frame.top_right.x, 7.5, frame.top_right.z)));
    }

    #[test]
    fn empty_source_range_maps_to_zero() {
        let frame = WarpFrame {
            min_x: 1.0,
            max_x: 1.0,
            ..WarpFrame::default()
        };
        let warped = frame.warp_point(Vec3::new(5.0, 0.0, -2.0));
        assert!(close(warped, frame.bottom_left));
    }

    #[test]
    fn repeated_warp_does_not_compound() {
        let mut warper = MeshWarper::new(skewed());
        let handle = warper.register(vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 1.0)]);
        let once = warper.warp(handle).unwrap().to_vec();
        let twice = warper.warp(handle).unwrap().to_vec();
        assert_eq!(once, twice);
        assert_ne!(warper.original(handle).unwrap(), once.as_slice());
    }

    #[test]
    fn mesh_transform_round_trips_through_deformer_space() {
        let node = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let mut warper = MeshWarper::new(WarpFrame::default());
        let handle = warper.register_with_transform(vec![Vec3::new(0.5, 0.0, 0.5)], node.to_matrix());
        warper.warp_all();
        // Identity frame: the vertex comes back where it started.
        assert!(close(warper.live(handle).unwrap()[0], Vec3::new(0.5, 0.0, 0.5)));

        let shifted = WarpFrame {
            top_right: Vec3::new(4.0, 0.0, 2.0),
            bottom_right: Vec3::new(4.0, 0.0, -2.0),
            ..WarpFrame::default()
        };
        warper.set_frame(shifted);
        let warped = warper.warp(handle).unwrap()[0];
        // Deformer x = 1.5 -> u = 0.875 -> x = -2 + 6 * 0.875 = 3.25, back in mesh space 2.25.
        assert!(close(warped, Vec3::new(2.25, 0.0, 0.5)));
    }

    #[test]
    fn degenerate_frame_leaves_originals() {
        let frame = WarpFrame {
            top_right: Vec3::ZERO,
            top_left: Vec3::ZERO,
            ..WarpFrame::default()
        };
        assert!(frame.is_degenerate());
        let mut warper = MeshWarper::new(frame);
        let vertices = vec![Vec3::new(1.0, 0.0, 1.0)];
        let handle = warper.register(vertices.clone());
        assert_eq!(warper.warp(handle).unwrap(), vertices.as_slice());
        assert!(warper.warp(MeshHandle(5)).is_none());
    }
}
