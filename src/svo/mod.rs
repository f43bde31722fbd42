//! Sparse voxel octree for 3D navigation
//!
//! Layer 0 is the finest resolution; each layer-0 node that touches geometry
//! owns a 4x4x4 [`LeafNode`] bitmask. Nodes reference each other through
//! packed [`Link`] indices rather than pointers.

pub mod builder;
pub mod collision;
pub mod config;
pub mod data;
pub mod leaf;
pub mod link;
pub mod mediator;
pub mod node;

pub use builder::SvoBuilder;
pub use collision::{CollisionQuery, Obstacle, ObstacleSet, ObstacleShape, OverlapQuery};
pub use config::{GenerationStrategy, VolumeConfig};
pub use data::{SvoData, SvoStats};
pub use leaf::LeafNode;
pub use link::Link;
pub use node::{Direction, Node};
