//! 4x4x4 blocked-voxel bitmask stored under each rasterized layer-0 node

use bytemuck::{Pod, Zeroable};
use rkyv::{Archive, Deserialize, Serialize};

use crate::math::morton::encode_morton_3d;

/// Voxels per leaf side
pub const LEAF_SIDE: u32 = 4;
/// Voxels per leaf
pub const LEAF_VOXELS: u8 = 64;

/// Blocked bits of a leaf, bit `i` is the sub-voxel with Morton index `i`
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Archive, Deserialize, Serialize)]
pub struct LeafNode(pub u64);

impl LeafNode {
    pub const EMPTY: LeafNode = LeafNode(0);
    pub const FULL: LeafNode = LeafNode(u64::MAX);

    /// Check sub-voxel by Morton index
    pub fn is_blocked(&self, index: u8) -> bool {
        debug_assert!(index < LEAF_VOXELS);
        self.0 & (1u64 << index) != 0
    }

    /// Mark sub-voxel blocked by Morton index
    pub fn set_blocked(&mut self, index: u8) {
        debug_assert!(index < LEAF_VOXELS);
        self.0 |= 1u64 << index;
    }

    /// Check sub-voxel by local coordinate (each 0..4)
    pub fn is_blocked_at(&self, x: u32, y: u32, z: u32) -> bool {
        debug_assert!(x < LEAF_SIDE && y < LEAF_SIDE && z < LEAF_SIDE);
        self.is_blocked(encode_morton_3d(x, y, z) as u8)
    }

    /// Mark sub-voxel blocked by local coordinate (each 0..4)
    pub fn set_blocked_at(&mut self, x: u32, y: u32, z: u32) {
        debug_assert!(x < LEAF_SIDE && y < LEAF_SIDE && z < LEAF_SIDE);
        self.set_blocked(encode_morton_3d(x, y, z) as u8)
    }

    pub fn is_completely_blocked(&self) -> bool {
        self.0 == u64::MAX
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn blocked_count(&self) -> u32 {
        self.0.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut leaf = LeafNode::EMPTY;
        assert!(leaf.is_empty());

        leaf.set_blocked_at(3, 0, 0);
        assert!(leaf.is_blocked(9));
        assert!(leaf.is_blocked_at(3, 0, 0));
        assert!(!leaf.is_blocked_at(0, 3, 0));
        assert_eq!(leaf.blocked_count(), 1);
        assert!(!leaf.is_empty());
    }

    #[test]
    fn test_completely_blocked() {
        let mut leaf = LeafNode::EMPTY;
        for i in 0..LEAF_VOXELS {
            assert!(!leaf.is_completely_blocked());
            leaf.set_blocked(i);
        }
        assert!(leaf.is_completely_blocked());
        assert_eq!(leaf, LeafNode::FULL);
        assert_eq!(leaf.blocked_count(), 64);
    }
}
