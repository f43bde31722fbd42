//! Pathfinder tuning.

use serde::{Deserialize, Serialize};

/// Distance metric used for the A* heuristic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathCostType {
    Manhattan,
    #[default]
    Euclidean,
}

/// Per-request search parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFinderSettings {
    /// Charge a flat `unit_cost` per step instead of the distance between voxel centers.
    pub use_unit_cost: bool,
    pub unit_cost: f32,
    /// Heuristic multiplier. Values above 1 trade optimality for speed.
    pub weight_estimate: f32,
    /// Discount for stepping into coarse voxels, 0 disables it.
    /// Strict optimality is not guaranteed while this is non-zero.
    pub node_size_compensation: f32,
    pub path_cost_type: PathCostType,
    /// Chaikin smoothing passes over the finished path. 0 leaves it untouched.
    pub smoothing_iterations: u32,
    /// Report every opened link to the trace sink.
    pub debug_open_nodes: bool,
}

impl Default for PathFinderSettings {
    fn default() -> Self {
        Self {
            use_unit_cost: false,
            unit_cost: 1.0,
            weight_estimate: 1.0,
            node_size_compensation: 1.0,
            path_cost_type: PathCostType::Euclidean,
            smoothing_iterations: 0,
            debug_open_nodes: false,
        }
    }
}
