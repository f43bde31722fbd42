//! Pathfinding over a generated octree

pub mod path;
pub mod pathfinder;
pub mod settings;
pub mod task;
pub mod volume;

pub use path::{NavPath, PathPoint};
pub use pathfinder::PathFinder;
pub use settings::{PathCostType, PathFinderSettings};
pub use task::{FindPathTask, PathRequest};
pub use volume::NavVolume;
