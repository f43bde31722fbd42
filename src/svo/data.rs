//! Octree store: per-layer Morton-sorted node arrays plus the leaf bitmask array

use glam::Vec3;

use super::config::{VolumeConfig, MAX_VOXEL_POWER};
use super::leaf::LeafNode;
use super::link::Link;
use super::node::Node;
use crate::core::error::Error;
use crate::core::types::Result;
use crate::math::morton::decode_morton_3d;

/// Generated navigation octree.
///
/// Layer 0 is the finest resolution, layer `num_layers - 1` holds the single
/// root. Every layer is sorted ascending by Morton code and siblings are
/// stored contiguously, so a parent only needs its first child's index.
/// Layer-0 node `i` owns leaf `i` when it has children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SvoData {
    origin: Vec3,
    extent: Vec3,
    voxel_power: u8,
    layers: Vec<Vec<Node>>,
    leaf_nodes: Vec<LeafNode>,
}

/// Summary counts for a generated store
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SvoStats {
    pub num_layers: usize,
    pub nodes_per_layer: Vec<usize>,
    pub total_nodes: usize,
    pub leaf_nodes: usize,
    /// Leaves with at least one blocked voxel
    pub occupied_leaves: usize,
    pub blocked_leaf_voxels: u64,
    pub memory_bytes: usize,
}

impl SvoData {
    /// Empty store for a volume; nothing is navigable until layers are added
    pub fn new(origin: Vec3, extent: Vec3, voxel_power: u8) -> Self {
        Self {
            origin,
            extent,
            voxel_power,
            layers: Vec::new(),
            leaf_nodes: Vec::new(),
        }
    }

    pub fn from_config(config: &VolumeConfig) -> Self {
        Self::new(config.origin(), config.extent(), config.voxel_power)
    }

    /// Reassemble a store from raw arrays, rejecting anything inconsistent
    pub fn from_parts(
        origin: Vec3,
        extent: Vec3,
        voxel_power: u8,
        layers: Vec<Vec<Node>>,
        leaf_nodes: Vec<LeafNode>,
    ) -> Result<Self> {
        let data = Self { origin, extent, voxel_power, layers, leaf_nodes };
        data.validate()?;
        Ok(data)
    }

    /// Check layer count, ordering, leaf count and the range of every link
    pub fn validate(&self) -> Result<()> {
        let malformed = |msg: String| Err(Error::MalformedStore(msg));

        // Bounds the layer shifts below and keeps the top layer clear of the invalid link layer
        if self.voxel_power == 0 || self.voxel_power > MAX_VOXEL_POWER {
            return malformed(format!(
                "voxel power {} outside 1..={}",
                self.voxel_power, MAX_VOXEL_POWER
            ));
        }
        if self.layers.len() != self.voxel_power as usize + 1 {
            return malformed(format!(
                "expected {} layers for voxel power {}, found {}",
                self.voxel_power as usize + 1,
                self.voxel_power,
                self.layers.len()
            ));
        }
        if self.leaf_nodes.len() != self.layers[0].len() {
            return malformed(format!(
                "leaf count {} does not match layer 0 node count {}",
                self.leaf_nodes.len(),
                self.layers[0].len()
            ));
        }
        let top = self.layers.len() - 1;
        if self.layers[top].len() != 1 {
            return malformed(format!("top layer must hold one root, found {}", self.layers[top].len()));
        }

        for (layer_index, layer) in self.layers.iter().enumerate() {
            if layer.len() > Link::MAX_NODE_INDEX as usize + 1 {
                return malformed(format!("layer {} holds {} nodes", layer_index, layer.len()));
            }
            if layer.windows(2).any(|w| w[0].code >= w[1].code) {
                return malformed(format!("layer {} is not sorted by Morton code", layer_index));
            }
            let cells = self.nodes_per_side(layer_index as u8) as u64;
            let max_code = cells * cells * cells;

            for node in layer {
                if node.code >= max_code {
                    return malformed(format!("code {} out of range on layer {}", node.code, layer_index));
                }
                if layer_index < top {
                    if !self.link_in_range(node.parent) || node.parent.layer() as usize != layer_index + 1 {
                        return malformed(format!("bad parent link {} on layer {}", node.parent, layer_index));
                    }
                } else if node.parent.is_valid() {
                    return malformed("root has a parent".to_string());
                }

                if node.first_child.is_valid() {
                    let ok = if layer_index == 0 {
                        node.first_child.layer() == 0
                            && (node.first_child.node_index() as usize) < self.leaf_nodes.len()
                    } else {
                        node.first_child.layer() as usize == layer_index - 1
                            && node.first_child.node_index() as usize + 8 <= self.layers[layer_index - 1].len()
                    };
                    if !ok {
                        return malformed(format!("bad child link {} on layer {}", node.first_child, layer_index));
                    }
                }

                for neighbor in node.neighbors {
                    if neighbor.is_valid()
                        && (!self.link_in_range(neighbor) || (neighbor.layer() as usize) < layer_index)
                    {
                        return malformed(format!("bad neighbor link {} on layer {}", neighbor, layer_index));
                    }
                }
            }
        }
        Ok(())
    }

    fn link_in_range(&self, link: Link) -> bool {
        link.is_valid()
            && self
                .layers
                .get(link.layer() as usize)
                .is_some_and(|layer| (link.node_index() as usize) < layer.len())
    }

    /// Drop all nodes and leaves
    pub fn clear(&mut self) {
        self.layers.clear();
        self.leaf_nodes.clear();
    }

    /// True once layers have been generated or loaded
    pub fn is_valid(&self) -> bool {
        !self.layers.is_empty()
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn extent(&self) -> Vec3 {
        self.extent
    }

    pub fn voxel_power(&self) -> u8 {
        self.voxel_power
    }

    pub fn num_layers(&self) -> u8 {
        self.layers.len() as u8
    }

    pub fn layers(&self) -> &[Vec<Node>] {
        &self.layers
    }

    pub fn layer(&self, layer: u8) -> &[Node] {
        self.layers.get(layer as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn leaf_nodes(&self) -> &[LeafNode] {
        &self.leaf_nodes
    }

    pub(crate) fn layer_mut(&mut self, layer: u8) -> &mut [Node] {
        &mut self.layers[layer as usize]
    }

    pub(crate) fn set_contents(&mut self, layers: Vec<Vec<Node>>, leaf_nodes: Vec<LeafNode>) {
        self.layers = layers;
        self.leaf_nodes = leaf_nodes;
    }

    /// Node addressed by a link, if the link is in range
    pub fn get_node(&self, link: Link) -> Option<&Node> {
        if !link.is_valid() {
            return None;
        }
        self.layers.get(link.layer() as usize)?.get(link.node_index() as usize)
    }

    /// Node addressed by a link
    pub fn node(&self, link: Link) -> Result<&Node> {
        self.get_node(link).ok_or(Error::InvalidLink(link))
    }

    /// Leaf bitmask owned by a layer-0 node, if it has one
    pub fn leaf_of(&self, link: Link, node: &Node) -> Option<&LeafNode> {
        if link.layer() == 0 && node.has_children() {
            self.leaf_nodes.get(node.first_child.node_index() as usize)
        } else {
            None
        }
    }

    /// Index of the node with `code` on `layer`
    pub fn find_node_index(&self, layer: u8, code: u64) -> Option<u32> {
        self.layer(layer)
            .binary_search_by_key(&code, |n| n.code)
            .ok()
            .map(|i| i as u32)
    }

    // --- geometry -------------------------------------------------------

    /// Side of the cubic voxel grid (the largest extent axis, doubled)
    pub fn side_length(&self) -> f32 {
        2.0 * self.extent.max_element()
    }

    /// Minimum corner of the cubic voxel grid
    pub fn grid_min(&self) -> Vec3 {
        self.origin - Vec3::splat(self.side_length() * 0.5)
    }

    /// Edge length of a node on `layer`
    pub fn voxel_size(&self, layer: u8) -> f32 {
        let finest = self.side_length() / (1u64 << self.voxel_power) as f32;
        finest * (1u64 << layer) as f32
    }

    /// Cells per side of the grid on `layer`
    pub fn nodes_per_side(&self, layer: u8) -> u32 {
        1u32 << self.voxel_power.saturating_sub(layer)
    }

    /// World-space center of the cell with `code` on `layer`
    pub fn node_position(&self, layer: u8, code: u64) -> Vec3 {
        let (x, y, z) = decode_morton_3d(code);
        let size = self.voxel_size(layer);
        self.grid_min() + (Vec3::new(x as f32, y as f32, z as f32) + 0.5) * size
    }

    /// True if `location` lies inside the configured cuboid
    pub fn contains_location(&self, location: Vec3) -> bool {
        let local = (location - self.origin).abs();
        local.cmple(self.extent).all()
    }

    /// World-space center of the voxel a link addresses, and whether it is open.
    ///
    /// Layer-0 links into a rasterized leaf resolve to the sub-voxel center.
    pub fn link_location(&self, link: Link) -> Result<(Vec3, bool)> {
        let node = self.node(link)?;
        let center = self.node_position(link.layer(), node.code);
        match self.leaf_of(link, node) {
            Some(leaf) => {
                let sub = link.sub_node_index();
                let (x, y, z) = decode_morton_3d(sub as u64);
                let size = self.voxel_size(0);
                let cell = size * 0.25;
                let location = center - Vec3::splat(size * 0.5)
                    + (Vec3::new(x as f32, y as f32, z as f32) + 0.5) * cell;
                Ok((location, !leaf.is_blocked(sub)))
            }
            None => Ok((center, true)),
        }
    }

    /// Voxel center of a link
    pub fn link_position(&self, link: Link) -> Result<Vec3> {
        self.link_location(link).map(|(p, _)| p)
    }

    // --- bookkeeping ----------------------------------------------------

    /// Raw bytes of one layer, for hashing and comparisons
    pub fn layer_bytes(&self, layer: u8) -> &[u8] {
        bytemuck::cast_slice(self.layer(layer))
    }

    /// Raw bytes of the leaf array
    pub fn leaf_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.leaf_nodes)
    }

    pub fn total_node_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// Bytes held by node and leaf arrays
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Node>() * self.total_node_count()
            + std::mem::size_of::<LeafNode>() * self.leaf_nodes.len()
    }

    pub fn stats(&self) -> SvoStats {
        let nodes_per_layer: Vec<usize> = self.layers.iter().map(Vec::len).collect();
        SvoStats {
            num_layers: self.layers.len(),
            total_nodes: nodes_per_layer.iter().sum(),
            nodes_per_layer,
            leaf_nodes: self.leaf_nodes.len(),
            occupied_leaves: self.leaf_nodes.iter().filter(|l| !l.is_empty()).count(),
            blocked_leaf_voxels: self.leaf_nodes.iter().map(|l| l.blocked_count() as u64).sum(),
            memory_bytes: self.memory_usage(),
        }
    }
}
