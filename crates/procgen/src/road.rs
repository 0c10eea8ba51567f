//! Road ribbon meshing.
//!
//! A road is a sparse polyline with a curve strength per point. Meshing runs
//! in three passes:
//!
//! 1. subdivide every turning segment with a strength-weighted blend of a
//!    centripetal Catmull-Rom curve and the straight chord;
//! 2. compute a forward tangent and a right vector at every subdivided point;
//! 3. extrude two vertices per point and stitch a quad strip, with `u` running
//!    along normalized arc length and `v` marking the two ribbon edges.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Strengths at or below this are treated as a hard, straight corner.
const STRAIGHT_STRENGTH: f32 = 0.01;
/// Turns below this many degrees are straight and get no subdivision.
const MIN_TURN_DEGREES: f32 = 1e-3;
const MIN_SUBDIVISIONS: u32 = 5;
const MAX_SUBDIVISIONS: u32 = 20;
/// Consecutive points closer than this are duplicates.
const DUPLICATE_DISTANCE: f32 = 1e-4;
/// Bisector length below which a point is a 180-degree switchback.
const SWITCHBACK_LENGTH: f32 = 0.01;

/// Road classification. Major roads draw slightly above minor ones so the
/// two never z-fight where they overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoadClass {
    #[default]
    Major,
    Minor,
}

impl RoadClass {
    pub fn draw_offset(self) -> f32 {
        match self {
            RoadClass::Major => 0.03,
            RoadClass::Minor => 0.01,
        }
    }
}

/// One straight piece of a road centreline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Vec3,
    pub end: Vec3,
}

impl LineSegment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn direction(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.start.lerp(self.end, t)
    }
}

/// Control points of one road plus its meshing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Polyline {
    pub points: Vec<Vec3>,
    /// Per-point curve strength: 0 is a hard corner, 1 a full curve. Missing
    /// entries read as `default_strength`.
    pub curve_strengths: Vec<f32>,
    pub width: f32,
    pub class: RoadClass,
    /// Degrees of turn per extra subdivision, scaled by strength.
    pub curve_threshold: f32,
    pub default_strength: f32,
}

impl Default for Polyline {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            curve_strengths: Vec::new(),
            width: 5.0,
            class: RoadClass::Major,
            curve_threshold: 2.0,
            default_strength: 1.0,
        }
    }
}

impl Polyline {
    pub fn new(points: Vec<Vec3>, width: f32, class: RoadClass) -> Self {
        Self {
            points,
            width,
            class,
            ..Default::default()
        }
    }

    pub fn with_strengths(mut self, strengths: Vec<f32>) -> Self {
        self.curve_strengths = strengths;
        self
    }

    pub fn strength(&self, i: usize) -> f32 {
        self.curve_strengths.get(i).copied().unwrap_or(self.default_strength)
    }

    /// Grow `curve_strengths` with the default strength until it matches `points`.
    pub fn pad_strengths(&mut self) {
        let default = self.default_strength;
        if self.curve_strengths.len() < self.points.len() {
            self.curve_strengths.resize(self.points.len(), default);
        }
    }

    pub fn push_point(&mut self, point: Vec3) {
        self.points.push(point);
        self.pad_strengths();
    }

    pub fn segments(&self) -> impl Iterator<Item = LineSegment> + '_ {
        self.points.windows(2).map(|w| LineSegment::new(w[0], w[1]))
    }

    /// Control points with consecutive duplicates removed, paired with their strengths.
    fn cleaned(&self) -> (Vec<Vec3>, Vec<f32>) {
        let mut points: Vec<Vec3> = Vec::with_capacity(self.points.len());
        let mut strengths = Vec::with_capacity(self.points.len());
        let mut dropped = 0;
        for (i, point) in self.points.iter().enumerate() {
            if points.last().is_some_and(|last| last.distance(*point) < DUPLICATE_DISTANCE) {
                dropped += 1;
                continue;
            }
            points.push(*point);
            strengths.push(self.strength(i));
        }
        if dropped > 0 {
            log::warn!("Road: dropped {dropped} duplicate control point(s)");
        }
        (points, strengths)
    }

    /// Control points with extra points inserted along every turning segment.
    pub fn subdivide(&self) -> Vec<Vec3> {
        let (points, strengths) = self.cleaned();
        if points.len() < 2 {
            return points;
        }
        let threshold = self.curve_threshold.max(f32::EPSILON);

        let mut out = vec![points[0]];
        for i in 0..points.len() - 1 {
            let p1 = points[i];
            let p2 = points[i + 1];
            let p0 = if i > 0 { points[i - 1] } else { p1 - (p2 - p1) };
            let p3 = points.get(i + 2).copied().unwrap_or(p2 + (p2 - p1));

            let s1 = strengths[i];
            let s2 = strengths[i + 1];
            // Turns at both ends count, so the segment leading into a corner curves too.
            let angle = angle_degrees(p2 - p1, p1 - p0).max(angle_degrees(p3 - p2, p2 - p1));
            if (s1 <= STRAIGHT_STRENGTH && s2 <= STRAIGHT_STRENGTH) || angle < MIN_TURN_DEGREES {
                out.push(p2);
                continue;
            }

            let count = ((angle * s1.max(s2) / threshold).ceil() as u32).clamp(MIN_SUBDIVISIONS, MAX_SUBDIVISIONS);
            let blend = ((s1 + s2) / 2.0).clamp(0.0, 1.0);
            for k in 1..=count {
                let t = k as f32 / (count + 1) as f32;
                let linear = p1.lerp(p2, t);
                let curved = centripetal_catmull_rom(p0, p1, p2, p3, t);
                out.push(linear.lerp(curved, blend));
            }
            out.push(p2);
        }
        out
    }

    /// Build the ribbon mesh, lifted by the class draw offset.
    pub fn mesh(&self) -> RoadMesh {
        let points = self.subdivide();
        if points.len() < 2 {
            log::warn!("Road: fewer than two distinct points, no mesh");
            return RoadMesh::default();
        }
        let mesh = extrude_ribbon(&points, self.width, self.class.draw_offset());
        log::debug!(
            "Road mesh: {} control points -> {} vertices, {} triangles",
            self.points.len(),
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        mesh
    }
}

/// Unsigned angle between two vectors, in degrees. Zero-length input gives 0.
fn angle_degrees(a: Vec3, b: Vec3) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom < 1e-12 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Point at `t` in `[0, 1]` between `p1` and `p2` on a centripetal
/// Catmull-Rom spline (alpha = 0.5). Falls back to the uniform form when two
/// control points coincide.
pub fn centripetal_catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let knot = |a: Vec3, b: Vec3| a.distance(b).sqrt();
    let d01 = knot(p0, p1);
    let d12 = knot(p1, p2);
    let d23 = knot(p2, p3);
    if d01 < 1e-6 || d12 < 1e-6 || d23 < 1e-6 {
        return uniform_catmull_rom(p0, p1, p2, p3, t);
    }
    let t0 = 0.0;
    let t1 = t0 + d01;
    let t2 = t1 + d12;
    let t3 = t2 + d23;
    let u = t1 + (t2 - t1) * t;

    let a1 = p0 * ((t1 - u) / (t1 - t0)) + p1 * ((u - t0) / (t1 - t0));
    let a2 = p1 * ((t2 - u) / (t2 - t1)) + p2 * ((u - t1) / (t2 - t1));
    let a3 = p2 * ((t3 - u) / (t3 - t2)) + p3 * ((u - t2) / (t3 - t2));
    let b1 = a1 * ((t2 - u) / (t2 - t0)) + a2 * ((u - t0) / (t2 - t0));
    let b2 = a2 * ((t3 - u) / (t3 - t1)) + a3 * ((u - t1) / (t3 - t1));
    b1 * ((t2 - u) / (t2 - t1)) + b2 * ((u - t1) / (t2 - t1))
}

fn uniform_catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Forward tangent at every point: single-sided at the ends, the bisector of
/// the incoming and outgoing directions elsewhere. Needs at least two points.
fn tangents(points: &[Vec3]) -> Vec<Vec3> {
    let last = points.len().saturating_sub(1);
    (0..points.len())
        .map(|i| {
            if i == 0 {
                return (points[1] - points[0]).normalize_or_zero();
            }
            if i == last {
                return (points[i] - points[i - 1]).normalize_or_zero();
            }
            let incoming = (points[i] - points[i - 1]).normalize_or_zero();
            let outgoing = (points[i + 1] - points[i]).normalize_or_zero();
            let bisector = incoming + outgoing;
            if bisector.length() < SWITCHBACK_LENGTH {
                // Keep the incoming heading so the ribbon stays full width.
                incoming
            } else {
                bisector.normalize()
            }
        })
        .collect()
}

/// Extrude a ribbon of `width` along `points`. Fewer than two points give an
/// empty mesh.
pub fn extrude_ribbon(points: &[Vec3], width: f32, lift: f32) -> RoadMesh {
    if points.len() < 2 {
        return RoadMesh::default();
    }
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in points.windows(2) {
        total += pair[0].distance(pair[1]);
        cumulative.push(total);
    }

    let lift = Vec3::Y * lift;
    let mut mesh = RoadMesh {
        vertices: Vec::with_capacity(points.len() * 2),
        indices: Vec::with_capacity((points.len() - 1) * 6),
        uvs: Vec::with_capacity(points.len() * 2),
    };
    for (i, (point, forward)) in points.iter().zip(tangents(points)).enumerate() {
        let right = forward.cross(Vec3::Y).normalize_or_zero() * (width / 2.0);
        let u = if total > 0.0 { cumulative[i] / total } else { 0.0 };

        mesh.vertices.push(*point + right + lift);
        mesh.vertices.push(*point - right + lift);
        mesh.uvs.push(Vec2::new(u, 1.0));
        mesh.uvs.push(Vec2::new(u, 0.0));

        if i > 0 {
            let c = mesh.vertices.len() as u32;
            mesh.indices.extend_from_slice(&[c - 4, c - 2, c - 3, c - 2, c - 1, c - 3]);
        }
    }
    mesh
}

/// Ribbon buffers handed to a mesh sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub uvs: Vec<Vec2>,
}

impl RoadMesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaved vertex data for upload; normals point straight up.
    pub fn interleaved(&self) -> Vec<RoadVertex> {
        self.vertices
            .iter()
            .zip(&self.uvs)
            .map(|(p, uv)| RoadVertex {
                position: p.to_array(),
                normal: [0.0, 1.0, 0.0],
                tex_coords: uv.to_array(),
            })
            .collect()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RoadVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}
