//! Conversion between world positions and octree links

use glam::{UVec3, Vec3};

use super::data::SvoData;
use super::link::Link;
use crate::core::error::Error;
use crate::core::types::Result;
use crate::math::morton::{encode_morton_3d, octant};

/// Finest link containing `location`.
///
/// Descends from the root until a node without children is reached, or to a
/// leaf sub-voxel on layer 0. Fails with [`Error::Blocked`] when that
/// sub-voxel is blocked and [`Error::OutOfBounds`] outside the volume.
pub fn link_from_location(data: &SvoData, location: Vec3) -> Result<Link> {
    if !data.is_valid() {
        return Err(Error::NotGenerated);
    }
    if !data.contains_location(location) {
        return Err(Error::OutOfBounds(location));
    }

    // Quarter-voxel grid coordinate: >> 2 gives layer 0, >> (2 + L) gives layer L
    let sub_cells = data.nodes_per_side(0) * 4;
    let scaled = ((location - data.grid_min()) / (data.voxel_size(0) * 0.25)).floor();
    let fine = UVec3::new(
        (scaled.x.max(0.0) as u32).min(sub_cells - 1),
        (scaled.y.max(0.0) as u32).min(sub_cells - 1),
        (scaled.z.max(0.0) as u32).min(sub_cells - 1),
    );

    let top = data.num_layers() - 1;
    let mut layer = top;
    let mut index = 0u32;
    loop {
        let link = Link::node(layer, index);
        let node = data.node(link)?;
        if !node.has_children() {
            return Ok(link);
        }

        if layer == 0 {
            let local = fine & UVec3::splat(3);
            let sub = encode_morton_3d(local.x, local.y, local.z) as u8;
            let leaf = data.leaf_of(link, node).ok_or(Error::InvalidLink(link))?;
            if leaf.is_blocked(sub) {
                return Err(Error::Blocked(location));
            }
            return Ok(link.with_sub_node(sub));
        }

        layer -= 1;
        let cell = fine >> (2 + layer as u32);
        let code = encode_morton_3d(cell.x, cell.y, cell.z);
        index = node.first_child.node_index() + octant(code) as u32;
    }
}

/// World position of a link and whether that voxel is open
pub fn link_location(data: &SvoData, link: Link) -> Result<(Vec3, bool)> {
    if !data.is_valid() {
        return Err(Error::NotGenerated);
    }
    data.link_location(link)
}
