//! Blocking-geometry queries consumed by the generator.
//!
//! The generator never touches world geometry directly. It asks a
//! [`CollisionQuery`] whether boxes overlap anything on a channel, always in
//! whole batches so implementations can run them in parallel.

use glam::Vec3;
use rayon::prelude::*;

use crate::math::aabb::Aabb;

/// One box probe: does a box at `center` overlap blocking geometry?
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapQuery {
    pub center: Vec3,
    /// Half-size of the probed box before clearance
    pub half_extent: Vec3,
    pub channel: u8,
    /// Inflation added to every axis of the half-extent
    pub clearance: f32,
}

impl OverlapQuery {
    /// Cube probe of half-size `half_size`
    pub fn cube(center: Vec3, half_size: f32, channel: u8, clearance: f32) -> Self {
        Self {
            center,
            half_extent: Vec3::splat(half_size),
            channel,
            clearance,
        }
    }

    /// Probed box, clearance included
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extent(self.center, self.half_extent + Vec3::splat(self.clearance))
    }
}

/// Capability to test boxes against blocking geometry.
pub trait CollisionQuery: Send + Sync {
    /// True if the probe overlaps blocking geometry on its channel.
    fn overlap_blocked(&self, query: &OverlapQuery) -> bool;

    /// Test many probes. Results are in query order.
    ///
    /// The default fans out across the rayon pool.
    fn overlap_blocked_batch(&self, queries: &[OverlapQuery]) -> Vec<bool> {
        queries.par_iter().map(|q| self.overlap_blocked(q)).collect()
    }

    /// False if the world cannot be queried right now; generation aborts.
    fn is_available(&self) -> bool {
        true
    }
}

/// Shape of a static obstacle
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObstacleShape {
    Box(Aabb),
    Sphere { center: Vec3, radius: f32 },
}

/// Static obstacle tagged with the channel it blocks
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub shape: ObstacleShape,
    pub channel: u8,
}

impl Obstacle {
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        Self { shape: ObstacleShape::Box(Aabb::new(min, max)), channel: 0 }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self { shape: ObstacleShape::Sphere { center, radius }, channel: 0 }
    }

    pub fn on_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Strict overlap: touching the probe's faces does not block.
    pub fn overlaps(&self, probe: &Aabb) -> bool {
        match self.shape {
            ObstacleShape::Box(aabb) => aabb.overlaps(probe),
            ObstacleShape::Sphere { center, radius } => {
                probe.closest_point(center).distance_squared(center) < radius * radius
            }
        }
    }
}

/// In-memory collision world made of boxes and spheres.
#[derive(Clone, Debug, Default)]
pub struct ObstacleSet {
    obstacles: Vec<Obstacle>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    pub fn add(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl CollisionQuery for ObstacleSet {
    fn overlap_blocked(&self, query: &OverlapQuery) -> bool {
        let probe = query.bounds();
        self.obstacles
            .iter()
            .any(|o| o.channel == query.channel && o.overlaps(&probe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_overlap_is_strict() {
        let world = ObstacleSet::new().with(Obstacle::cuboid(Vec3::ZERO, Vec3::ONE));
        assert!(world.overlap_blocked(&OverlapQuery::cube(Vec3::splat(0.5), 0.1, 0, 0.0)));
        // Touching face
        assert!(!world.overlap_blocked(&OverlapQuery::cube(Vec3::new(1.5, 0.5, 0.5), 0.5, 0, 0.0)));
        // Clearance pushes the probe into the box
        assert!(world.overlap_blocked(&OverlapQuery::cube(Vec3::new(1.5, 0.5, 0.5), 0.5, 0, 0.1)));
    }

    #[test]
    fn test_sphere_overlap() {
        let world = ObstacleSet::new().with(Obstacle::sphere(Vec3::ZERO, 1.0));
        assert!(world.overlap_blocked(&OverlapQuery::cube(Vec3::new(1.2, 0.0, 0.0), 0.5, 0, 0.0)));
        assert!(!world.overlap_blocked(&OverlapQuery::cube(Vec3::new(2.0, 2.0, 0.0), 0.5, 0, 0.0)));
    }

    #[test]
    fn test_channels_filter() {
        let world = ObstacleSet::new().with(Obstacle::cuboid(Vec3::ZERO, Vec3::ONE).on_channel(2));
        let probe = OverlapQuery::cube(Vec3::splat(0.5), 0.1, 0, 0.0);
        assert!(!world.overlap_blocked(&probe));
        assert!(world.overlap_blocked(&OverlapQuery { channel: 2, ..probe }));
    }

    #[test]
    fn test_batch_preserves_order() {
        let world = ObstacleSet::new().with(Obstacle::cuboid(Vec3::ZERO, Vec3::ONE));
        let queries: Vec<_> = (0..100)
            .map(|i| OverlapQuery::cube(Vec3::new(i as f32 * 0.25, 0.5, 0.5), 0.1, 0, 0.0))
            .collect();
        let results = world.overlap_blocked_batch(&queries);
        let expected: Vec<_> = queries.iter().map(|q| world.overlap_blocked(q)).collect();
        assert_eq!(results, expected);
        assert!(results[0] && results[3] && !results[5]);
    }
}
