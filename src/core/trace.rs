//! Optional trace sink for generation and search diagnostics.
//!
//! Every hook defaults to a no-op so callers implement only what they draw.

use glam::Vec3;

use crate::svo::link::Link;

/// Receives diagnostic events from the generator and the pathfinder.
pub trait NavTrace: Send + Sync {
    /// A node was created at `layer` with the given center and half size.
    fn node_rasterized(&self, _layer: u8, _code: u64, _center: Vec3, _half_size: f32) {}

    /// A leaf sub-voxel tested as blocked.
    fn leaf_voxel_blocked(&self, _center: Vec3, _half_size: f32) {}

    /// A neighbor link was resolved for `from` in direction `direction`.
    fn neighbor_linked(&self, _from: Link, _direction: usize, _to: Link) {}

    /// The pathfinder added a link to its open set.
    fn open_node(&self, _link: Link, _location: Vec3) {}
}

/// Trace sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTrace;

impl NavTrace for NoopTrace {}
