//! Error types for octree generation and navigation queries

use glam::Vec3;
use thiserror::Error;

use crate::svo::link::Link;

/// Main error type for the navigation system
#[derive(Debug, Error)]
pub enum Error {
    #[error("location {0} is outside the navigation volume")]
    OutOfBounds(Vec3),

    #[error("location {0} resolves to a blocked voxel")]
    Blocked(Vec3),

    #[error("no path found after {iterations} iterations")]
    NoPath { iterations: usize },

    #[error("navigation data has not been generated")]
    NotGenerated,

    #[error("malformed octree data: {0}")]
    MalformedStore(String),

    #[error("link {0} does not address a node in this octree")]
    InvalidLink(Link),

    #[error("invalid volume configuration: {0}")]
    InvalidConfig(String),

    #[error("collision world is unavailable")]
    CollisionUnavailable,

    #[error("layer {layer} holds {count} nodes, more than a link can address")]
    CapacityExceeded { layer: u8, count: usize },

    #[error("path task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
