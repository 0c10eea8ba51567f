//! Road network: owned roads, point snapping, and intersection detection.
//!
//! Intersections are found on the raw centrelines (draw offsets only touch
//! mesh vertices). Every time a road is added or extended it is tested
//! segment-by-segment against every other road; a detection close to an
//! existing intersection merges into it instead of creating a new one.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::road::{LineSegment, Polyline, RoadClass, RoadMesh};

/// Squared cross-product magnitude below which two segments are parallel.
const PARALLEL_EPSILON: f32 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoadId(pub u32);

impl fmt::Display for RoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "road#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoadNetworkError {
    #[error("{0} is not part of this network")]
    UnknownRoad(RoadId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// New points within this distance of an existing road point snap onto it.
    pub snap_distance: f32,
    /// Detections within this distance of an existing intersection merge into it.
    pub merge_distance: f32,
    pub major_width: f32,
    pub minor_width: f32,
    /// Largest gap between two skew segments that still counts as a crossing.
    pub skew_tolerance: f32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            snap_distance: 1.0,
            merge_distance: 0.5,
            major_width: 1.5,
            minor_width: 0.8,
            skew_tolerance: 1e-3,
        }
    }
}

impl NetworkConfig {
    pub fn width_for(&self, class: RoadClass) -> f32 {
        match class {
            RoadClass::Major => self.major_width,
            RoadClass::Minor => self.minor_width,
        }
    }
}

/// Point where two or more roads cross.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub position: Vec3,
    /// Roads meeting here, sorted and unique.
    pub roads: Vec<RoadId>,
}

impl Intersection {
    fn connect(&mut self, road: RoadId) {
        if let Err(at) = self.roads.binary_search(&road) {
            self.roads.insert(at, road);
        }
    }
}

/// Crossing point of two segments, if both parameters lie in `[0, 1]` and the
/// closest points are within `skew_tolerance` of each other. Parallel
/// segments never intersect.
pub fn segment_intersection(a: &LineSegment, b: &LineSegment, skew_tolerance: f32) -> Option<Vec3> {
    let dir_a = a.direction();
    let dir_b = b.direction();
    let cross = dir_a.cross(dir_b);
    let denom = cross.length_squared();
    if denom < PARALLEL_EPSILON {
        return None;
    }

    let between = b.start - a.start;
    let t = between.cross(dir_b).dot(cross) / denom;
    let s = between.cross(dir_a).dot(cross) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&s) {
        return None;
    }

    let on_a = a.point_at(t);
    if on_a.distance(b.point_at(s)) > skew_tolerance {
        return None;
    }
    Some(on_a)
}

#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    config: NetworkConfig,
    roads: BTreeMap<RoadId, Polyline>,
    intersections: Vec<Intersection>,
    next_id: u32,
}

impl RoadNetwork {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Add a road of `class` through `points`, using the class default width.
    pub fn add_road(&mut self, points: Vec<Vec3>, class: RoadClass) -> RoadId {
        let polyline = Polyline::new(points, self.config.width_for(class), class);
        self.add_polyline(polyline)
    }

    /// Add a fully configured road. Its points snap onto existing roads.
    pub fn add_polyline(&mut self, mut polyline: Polyline) -> RoadId {
        let id = RoadId(self.next_id);
        self.next_id += 1;

        for point in polyline.points.iter_mut() {
            *point = self.snap_to_existing(*point, None);
        }
        polyline.pad_strengths();
        self.roads.insert(id, polyline);
        self.check_road(id);
        id
    }

    /// Append a point to `id`, snapped onto other roads, and re-check the road.
    pub fn push_point(&mut self, id: RoadId, point: Vec3) -> Result<Vec3, RoadNetworkError> {
        if !self.roads.contains_key(&id) {
            return Err(RoadNetworkError::UnknownRoad(id));
        }
        let snapped = self.snap_to_existing(point, Some(id));
        if let Some(road) = self.roads.get_mut(&id) {
            road.push_point(snapped);
        }
        self.check_road(id);
        Ok(snapped)
    }

    /// Remove a road and every intersection that no longer joins two roads.
    pub fn remove_road(&mut self, id: RoadId) -> Result<Polyline, RoadNetworkError> {
        let road = self.roads.remove(&id).ok_or(RoadNetworkError::UnknownRoad(id))?;
        for intersection in &mut self.intersections {
            intersection.roads.retain(|r| *r != id);
        }
        self.intersections.retain(|i| i.roads.len() >= 2);
        Ok(road)
    }

    pub fn clear(&mut self) {
        self.roads.clear();
        self.intersections.clear();
    }

    pub fn road(&self, id: RoadId) -> Option<&Polyline> {
        self.roads.get(&id)
    }

    pub fn roads(&self) -> impl Iterator<Item = (RoadId, &Polyline)> {
        self.roads.iter().map(|(id, road)| (*id, road))
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    /// Nearest control point of another road within the snap distance, or
    /// `point` unchanged.
    pub fn snap_to_existing(&self, point: Vec3, exclude: Option<RoadId>) -> Vec3 {
        self.roads
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .flat_map(|(_, road)| road.points.iter().copied())
            .map(|candidate| (candidate, candidate.distance(point)))
            .filter(|(_, distance)| *distance <= self.config.snap_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate)
            .unwrap_or(point)
    }

    /// Rebuild the intersection set from scratch over every pair of roads.
    pub fn detect_all(&mut self) -> usize {
        self.intersections.clear();
        let ids: Vec<RoadId> = self.roads.keys().copied().collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                self.check_pair(*a, *b);
            }
        }
        log::info!(
            "Road network: {} roads, {} intersections",
            self.roads.len(),
            self.intersections.len()
        );
        self.intersections.len()
    }

    /// Ribbon mesh for every road.
    pub fn meshes(&self) -> Vec<(RoadId, RoadMesh)> {
        self.roads.iter().map(|(id, road)| (*id, road.mesh())).collect()
    }

    fn check_road(&mut self, id: RoadId) {
        let others: Vec<RoadId> = self.roads.keys().copied().filter(|other| *other != id).collect();
        for other in others {
            self.check_pair(id, other);
        }
    }

    fn check_pair(&mut self, a: RoadId, b: RoadId) {
        let (Some(road_a), Some(road_b)) = (self.roads.get(&a), self.roads.get(&b)) else {
            return;
        };
        let mut hits = Vec::new();
        for seg_a in road_a.segments() {
            for seg_b in road_b.segments() {
                if let Some(point) = segment_intersection(&seg_a, &seg_b, self.config.skew_tolerance) {
                    hits.push(point);
                }
            }
        }
        for point in hits {
            self.record(point, a, b);
        }
    }

    fn record(&mut self, position: Vec3, a: RoadId, b: RoadId) {
        let merge = self.config.merge_distance;
        if let Some(existing) = self
            .intersections
            .iter_mut()
            .find(|i| i.position.distance(position) <= merge)
        {
            existing.connect(a);
            existing.connect(b);
            return;
        }
        log::debug!("Intersection between {a} and {b} at {position}");
        let mut roads = vec![a, b];
        roads.sort();
        self.intersections.push(Intersection { position, roads });
    }
}
