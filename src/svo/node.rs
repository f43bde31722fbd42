//! Octree node and the six face directions used for neighbor links

use bytemuck::{Pod, Zeroable};
use glam::IVec3;
use rkyv::{Archive, Deserialize, Serialize};

use super::link::Link;

/// Octree node - 40 bytes
///
/// Layout:
/// - code (8 bytes): Morton code of the cell within its layer
/// - parent (4 bytes): link to the containing node one layer up
/// - first_child (4 bytes): first of 8 contiguous children one layer down,
///   or for layer 0 the leaf node in the leaf array
/// - neighbors (24 bytes): one link per face, indexed by [`Direction`]
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable, Archive, Deserialize, Serialize)]
pub struct Node {
    pub code: u64,
    pub parent: Link,
    pub first_child: Link,
    pub neighbors: [Link; 6],
}

impl Node {
    /// Create a node with no parent, children or neighbors
    pub fn new(code: u64) -> Self {
        Self {
            code,
            parent: Link::INVALID,
            first_child: Link::INVALID,
            neighbors: [Link::INVALID; 6],
        }
    }

    pub fn has_children(&self) -> bool {
        self.first_child.is_valid()
    }

    /// Neighbor link across the given face
    pub fn neighbor(&self, direction: Direction) -> Link {
        self.neighbors[direction.index()]
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Face direction, in neighbor slot order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::PosX,
        Direction::NegX,
        Direction::PosY,
        Direction::NegY,
        Direction::PosZ,
        Direction::NegZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis index: 0 = x, 1 = y, 2 = z
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    pub fn is_positive(self) -> bool {
        self.index() % 2 == 0
    }

    pub fn opposite(self) -> Direction {
        Self::ALL[self.index() ^ 1]
    }

    /// Unit grid step
    pub fn offset(self) -> IVec3 {
        let mut v = IVec3::ZERO;
        v[self.axis()] = if self.is_positive() { 1 } else { -1 };
        v
    }

    /// Octants of a neighbor's children that touch the face we arrive through
    /// when moving in this direction
    pub fn near_face_octants(self) -> [u8; 4] {
        let bit = 1u8 << self.axis();
        let want = if self.is_positive() { 0 } else { bit };
        let mut out = [0u8; 4];
        let mut n = 0;
        for octant in 0..8u8 {
            if octant & bit == want {
                out[n] = octant;
                n += 1;
            }
        }
        out
    }

    /// Local leaf coordinate on this direction's axis after stepping across
    /// the leaf boundary: 0 entering from the low side, 3 from the high side
    pub fn entry_coordinate(self) -> u32 {
        if self.is_positive() { 0 } else { 3 }
    }
}
