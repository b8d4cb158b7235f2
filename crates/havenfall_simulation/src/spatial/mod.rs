//! Spatial query interface (occlusion, ground probes, ballistics).
//!
//! The simulation never owns collision geometry. Whatever does (a physics
//! engine, a navmesh bake, the [`FlatWorld`] stand-in below) is injected as
//! a trait object through the [`SpatialIndex`] resource at construction.
//! "No hit" is a normal negative result, never an error.

use bevy::prelude::*;

/// Result of a ray query against static geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
}

/// Narrow ray-query interface over static world geometry.
///
/// `direction` is expected normalized. Used for three things: line-of-sight
/// occlusion, ground validation under patrol waypoints, and bullet hit-scan
/// against level geometry. Actor bodies are resolved separately in-core.
pub trait SpatialQuery: Send + Sync {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

/// Injected spatial service (no ambient singleton lookup).
#[derive(Resource)]
pub struct SpatialIndex {
    geometry: Box<dyn SpatialQuery>,
}

impl SpatialIndex {
    pub fn new(geometry: impl SpatialQuery + 'static) -> Self {
        Self {
            geometry: Box::new(geometry),
        }
    }

    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.geometry.raycast(origin, direction, max_distance)
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(FlatWorld::default())
    }
}

/// Axis-aligned box obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Slab-method ray test. Returns the entry distance along `direction`.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let inv = direction.recip();
        let t1 = (self.min - origin) * inv;
        let t2 = (self.max - origin) * inv;
        let t_min = t1.min(t2).max_element();
        let t_max = t1.max(t2).min_element();

        if t_max < t_min.max(0.0) || t_min > max_distance {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

/// Headless reference world: a flat ground plane with optional circular
/// holes plus box obstacles. Enough geometry for occlusion, waypoint
/// ground checks and bullet blocking in tests and the demo binary.
pub struct FlatWorld {
    /// Ground plane height, `None` for a bottomless world (every waypoint
    /// ground probe fails; exercises the silent-retry path).
    pub ground: Option<f32>,
    /// Circular holes in the ground, (center XZ, radius).
    pub holes: Vec<(Vec2, f32)>,
    pub obstacles: Vec<Aabb>,
}

impl Default for FlatWorld {
    fn default() -> Self {
        Self {
            ground: Some(0.0),
            holes: Vec::new(),
            obstacles: Vec::new(),
        }
    }
}

impl FlatWorld {
    pub fn void() -> Self {
        Self {
            ground: None,
            holes: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    pub fn with_obstacle(mut self, center: Vec3, size: Vec3) -> Self {
        self.obstacles.push(Aabb::from_center_size(center, size));
        self
    }

    pub fn with_hole(mut self, center: Vec2, radius: f32) -> Self {
        self.holes.push((center, radius));
        self
    }

    fn ground_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let height = self.ground?;
        if direction.y.abs() < 1e-6 {
            return None;
        }
        let t = (height - origin.y) / direction.y;
        if t < 0.0 || t > max_distance {
            return None;
        }
        let hit = origin + direction * t;
        let xz = Vec2::new(hit.x, hit.z);
        for (center, radius) in &self.holes {
            if xz.distance(*center) <= *radius {
                return None;
            }
        }
        Some(t)
    }
}

impl SpatialQuery for FlatWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let mut best: Option<f32> = self.ground_hit(origin, direction, max_distance);

        for obstacle in &self.obstacles {
            if let Some(t) = obstacle.raycast(origin, direction, max_distance) {
                if best.map_or(true, |b| t < b) {
                    best = Some(t);
                }
            }
        }

        best.map(|t| RayHit {
            point: origin + direction * t,
            distance: t,
        })
    }
}

/// Ray vs sphere, for bullet hits against actor bodies.
///
/// Returns the entry distance along the (normalized) direction.
pub fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let proj = to_center.dot(direction);
    let closest_sq = to_center.length_squared() - proj * proj;
    let radius_sq = radius * radius;
    if closest_sq > radius_sq {
        return None;
    }
    let half_chord = (radius_sq - closest_sq).sqrt();
    let t = proj - half_chord;
    if t < 0.0 {
        // Origin inside the sphere still counts as an immediate hit
        if proj + half_chord >= 0.0 {
            return Some(0.0);
        }
        return None;
    }
    Some(t)
}
