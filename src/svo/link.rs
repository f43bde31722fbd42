//! Compact locator for a node or leaf voxel inside the octree store

use std::fmt;

use bytemuck::{Pod, Zeroable};
use rkyv::{Archive, Deserialize, Serialize};

/// Packed `layer:node:subnode` key into the per-layer node arrays.
///
/// Layout (32 bits):
/// - bits 28-31: layer index (15 = invalid)
/// - bits 6-27: node index within the layer (22 bits)
/// - bits 0-5: leaf sub-voxel index, Morton order within a 4x4x4 leaf
///
/// A link owns nothing; it stays meaningful only while the store it was
/// resolved against is unchanged.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Archive, Deserialize, Serialize)]
pub struct Link(u32);

const LAYER_SHIFT: u32 = 28;
const NODE_SHIFT: u32 = 6;
const NODE_MASK: u32 = (1 << 22) - 1;
const SUB_NODE_MASK: u32 = (1 << 6) - 1;

impl Link {
    /// Layer value reserved for "no link"
    pub const INVALID_LAYER: u8 = 15;
    /// Largest node index a link can address
    pub const MAX_NODE_INDEX: u32 = NODE_MASK;
    /// The invalid link
    pub const INVALID: Link = Link((Self::INVALID_LAYER as u32) << LAYER_SHIFT);

    /// Create a link. Layer must be below 15, node index below 2^22, sub-node below 64.
    pub fn new(layer: u8, node_index: u32, sub_node_index: u8) -> Self {
        debug_assert!(layer < Self::INVALID_LAYER);
        debug_assert!(node_index <= NODE_MASK);
        debug_assert!((sub_node_index as u32) <= SUB_NODE_MASK);
        Link(
            ((layer as u32) << LAYER_SHIFT)
                | ((node_index & NODE_MASK) << NODE_SHIFT)
                | (sub_node_index as u32 & SUB_NODE_MASK),
        )
    }

    /// Link to a whole node (sub-node 0)
    pub fn node(layer: u8, node_index: u32) -> Self {
        Self::new(layer, node_index, 0)
    }

    pub fn layer(self) -> u8 {
        (self.0 >> LAYER_SHIFT) as u8
    }

    pub fn node_index(self) -> u32 {
        (self.0 >> NODE_SHIFT) & NODE_MASK
    }

    pub fn sub_node_index(self) -> u8 {
        (self.0 & SUB_NODE_MASK) as u8
    }

    pub fn is_valid(self) -> bool {
        self.layer() != Self::INVALID_LAYER
    }

    /// Same node, different leaf sub-voxel
    pub fn with_sub_node(self, sub_node_index: u8) -> Self {
        Self::new(self.layer(), self.node_index(), sub_node_index)
    }

    /// Same layer and sub-node, node index shifted by `offset`
    pub fn offset_node(self, offset: u32) -> Self {
        Self::new(self.layer(), self.node_index() + offset, self.sub_node_index())
    }

    /// Raw packed bits
    pub fn to_bits(self) -> u32 {
        self.0
    }

    /// Rebuild from raw packed bits
    pub fn from_bits(bits: u32) -> Self {
        Link(bits)
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}:{}", self.layer(), self.node_index(), self.sub_node_index())
        } else {
            write!(f, "invalid")
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self)
    }
}
