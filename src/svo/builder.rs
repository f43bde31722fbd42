//! Octree generation from a collision world.
//!
//! Generation runs in four ordered passes:
//! 1. probe every layer-1 cell against the world
//! 2. propagate the blocked layer-1 codes up to the root
//! 3. rasterize layers bottom-up, creating the children of every blocked
//!    cell and a 4x4x4 leaf under each blocked layer-0 node
//! 4. link every node to its face neighbors, from the top layer down
//!
//! Empty space above layer 0 is never subdivided, so the node count tracks
//! obstacle surface area rather than volume.

use std::collections::BTreeSet;
use std::time::Instant;

use glam::{IVec3, Vec3};
use rayon::prelude::*;

use super::collision::{CollisionQuery, OverlapQuery};
use super::config::VolumeConfig;
use super::data::SvoData;
use super::leaf::{LeafNode, LEAF_VOXELS};
use super::link::Link;
use super::node::{Direction, Node};
use crate::core::error::Error;
use crate::core::trace::{NavTrace, NoopTrace};
use crate::core::types::Result;
use crate::math::morton::{decode_morton_3d, encode_morton_3d, first_child_code, parent_code};

/// Probes submitted per collision batch during the first pass
const FIRST_PASS_BATCH: u64 = 1 << 16;

/// Builds an [`SvoData`] for one volume against one collision world.
pub struct SvoBuilder<'w> {
    config: VolumeConfig,
    world: &'w dyn CollisionQuery,
    trace: &'w dyn NavTrace,
}

impl<'w> SvoBuilder<'w> {
    pub fn new(config: VolumeConfig, world: &'w dyn CollisionQuery) -> Self {
        Self { config, world, trace: &NoopTrace }
    }

    /// Report rasterized nodes, blocked leaf voxels and neighbor links to `trace`
    pub fn with_trace(mut self, trace: &'w dyn NavTrace) -> Self {
        self.trace = trace;
        self
    }

    /// Run all generation passes and return the finished store.
    pub fn build(&self) -> Result<SvoData> {
        self.config.validate()?;
        if !self.world.is_available() {
            return Err(Error::CollisionUnavailable);
        }

        let start = Instant::now();
        let mut data = SvoData::from_config(&self.config);

        let blocked = self.blocked_indices(&data);
        log::debug!(
            "First pass: {} of {} layer-1 cells blocked",
            blocked[1].len(),
            (data.nodes_per_side(1) as u64).pow(3)
        );

        let (layers, leaf_nodes) = self.rasterize_layers(&data, &blocked)?;
        data.set_contents(layers, leaf_nodes);
        self.build_neighbor_links(&mut data);

        let stats = data.stats();
        log::info!(
            "Generated navigation octree in {:.1}ms: {} layers, {} nodes {:?}, {} leaves ({} occupied), {} bytes",
            start.elapsed().as_secs_f64() * 1000.0,
            stats.num_layers,
            stats.total_nodes,
            stats.nodes_per_layer,
            stats.leaf_nodes,
            stats.occupied_leaves,
            stats.memory_bytes,
        );
        Ok(data)
    }

    fn probe(&self, data: &SvoData, layer: u8, code: u64) -> OverlapQuery {
        OverlapQuery::cube(
            data.node_position(layer, code),
            data.voxel_size(layer) * 0.5,
            self.config.collision_channel,
            self.config.clearance,
        )
    }

    /// Blocked Morton codes per layer. Entry 0 is unused; entry 1 comes from
    /// probing the world and every coarser entry holds the parents of the
    /// entry below.
    fn blocked_indices(&self, data: &SvoData) -> Vec<BTreeSet<u64>> {
        let num_layers = data.voxel_power() as usize + 1;
        let mut blocked = vec![BTreeSet::new(); num_layers];

        let cells = data.nodes_per_side(1) as u64;
        let total = cells * cells * cells;
        let mut begin = 0;
        while begin < total {
            let end = (begin + FIRST_PASS_BATCH).min(total);
            let queries: Vec<OverlapQuery> = (begin..end).map(|code| self.probe(data, 1, code)).collect();
            let results = self.world.overlap_blocked_batch(&queries);
            blocked[1].extend((begin..end).zip(results).filter(|(_, hit)| *hit).map(|(code, _)| code));
            begin = end;
        }

        for layer in 2..num_layers {
            let parents: BTreeSet<u64> = blocked[layer - 1].iter().map(|&c| parent_code(c)).collect();
            blocked[layer] = parents;
        }
        blocked
    }

    fn rasterize_layers(
        &self,
        data: &SvoData,
        blocked: &[BTreeSet<u64>],
    ) -> Result<(Vec<Vec<Node>>, Vec<LeafNode>)> {
        let top = data.voxel_power();
        let mut layers: Vec<Vec<Node>> = vec![Vec::new(); top as usize + 1];
        let mut leaf_nodes = Vec::new();

        for layer in 0..=top {
            // Sorted parents expand to sorted, complete sibling groups.
            let codes: Vec<u64> = if layer == top {
                vec![0]
            } else {
                blocked[layer as usize + 1]
                    .iter()
                    .flat_map(|&p| first_child_code(p)..first_child_code(p) + 8)
                    .collect()
            };
            if codes.len() > Link::MAX_NODE_INDEX as usize + 1 {
                return Err(Error::CapacityExceeded { layer, count: codes.len() });
            }

            let nodes = if layer == 0 {
                let (nodes, leaves) = self.rasterize_finest_layer(data, &codes);
                leaf_nodes = leaves;
                nodes
            } else {
                self.rasterize_layer(layer, &codes, &blocked[layer as usize], &mut layers[layer as usize - 1])
            };
            for node in &nodes {
                self.trace.node_rasterized(
                    layer,
                    node.code,
                    data.node_position(layer, node.code),
                    data.voxel_size(layer) * 0.5,
                );
            }
            log::debug!("Layer {}: {} nodes", layer, nodes.len());
            layers[layer as usize] = nodes;
        }

        Ok((layers, leaf_nodes))
    }

    /// Layer 0: nodes whose probe hits get a rasterized leaf. Open nodes keep
    /// an empty placeholder so leaf `i` always belongs to node `i`.
    fn rasterize_finest_layer(&self, data: &SvoData, codes: &[u64]) -> (Vec<Node>, Vec<LeafNode>) {
        let queries: Vec<OverlapQuery> = codes.iter().map(|&code| self.probe(data, 0, code)).collect();
        let hits = self.world.overlap_blocked_batch(&queries);

        let mut nodes = Vec::with_capacity(codes.len());
        let mut leaves = Vec::with_capacity(codes.len());
        for (index, (&code, hit)) in codes.iter().zip(hits).enumerate() {
            let mut node = Node::new(code);
            if hit {
                leaves.push(self.rasterize_leaf(data, code));
                node.first_child = Link::node(0, index as u32);
            } else {
                leaves.push(LeafNode::EMPTY);
            }
            nodes.push(node);
        }
        (nodes, leaves)
    }

    /// Probe the 64 sub-voxels of a layer-0 node.
    fn rasterize_leaf(&self, data: &SvoData, code: u64) -> LeafNode {
        let node_size = data.voxel_size(0);
        let cell = node_size * 0.25;
        let node_min = data.node_position(0, code) - Vec3::splat(node_size * 0.5);

        let queries: Vec<OverlapQuery> = (0..LEAF_VOXELS)
            .map(|i| {
                let (x, y, z) = decode_morton_3d(i as u64);
                let center = node_min + (Vec3::new(x as f32, y as f32, z as f32) + 0.5) * cell;
                OverlapQuery::cube(center, cell * 0.5, self.config.collision_channel, self.config.clearance)
            })
            .collect();
        let hits = self.world.overlap_blocked_batch(&queries);

        let mut leaf = LeafNode::EMPTY;
        for (i, (query, hit)) in queries.iter().zip(hits).enumerate() {
            if hit {
                leaf.set_blocked(i as u8);
                self.trace.leaf_voxel_blocked(query.center, cell * 0.5);
            }
        }
        leaf
    }

    /// Layers above 0: blocked nodes adopt their 8 contiguous children.
    fn rasterize_layer(
        &self,
        layer: u8,
        codes: &[u64],
        blocked: &BTreeSet<u64>,
        children: &mut [Node],
    ) -> Vec<Node> {
        let mut nodes = Vec::with_capacity(codes.len());
        for (index, &code) in codes.iter().enumerate() {
            let mut node = Node::new(code);
            if blocked.contains(&code) {
                let first = first_child_code(code);
                if let Ok(child_index) = children.binary_search_by_key(&first, |n| n.code) {
                    node.first_child = Link::node(layer - 1, child_index as u32);
                    for child in &mut children[child_index..child_index + 8] {
                        child.parent = Link::node(layer, index as u32);
                    }
                }
            }
            nodes.push(node);
        }
        nodes
    }

    fn build_neighbor_links(&self, data: &mut SvoData) {
        let start = Instant::now();
        for layer in (0..data.num_layers()).rev() {
            let links: Vec<[Link; 6]> = {
                let view: &SvoData = data;
                view.layer(layer)
                    .par_iter()
                    .map(|node| {
                        let mut out = [Link::INVALID; 6];
                        for direction in Direction::ALL {
                            out[direction.index()] = find_neighbor(view, layer, node.code, direction);
                        }
                        out
                    })
                    .collect()
            };

            for (index, (node, neighbors)) in data.layer_mut(layer).iter_mut().zip(links).enumerate() {
                node.neighbors = neighbors;
                let from = Link::node(layer, index as u32);
                for (direction, to) in neighbors.iter().enumerate() {
                    if to.is_valid() {
                        self.trace.neighbor_linked(from, direction, *to);
                    }
                }
            }
        }
        log::debug!("Neighbor links built in {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Finest existing node adjacent to the cell `code` on `layer` across `direction`.
///
/// If the adjacent cell was never rasterized, its ancestors are tried one
/// layer at a time. The root always exists, so the walk ends after at most
/// `num_layers - layer` lookups. Returns an invalid link at the volume
/// boundary or when the neighbor is a completely blocked leaf.
pub fn find_neighbor(data: &SvoData, layer: u8, code: u64, direction: Direction) -> Link {
    let (x, y, z) = decode_morton_3d(code);
    let next = IVec3::new(x as i32, y as i32, z as i32) + direction.offset();
    let side = data.nodes_per_side(layer) as i32;
    if next.min_element() < 0 || next.max_element() >= side {
        return Link::INVALID;
    }

    let mut neighbor_code = encode_morton_3d(next.x as u32, next.y as u32, next.z as u32);
    for search_layer in layer..data.num_layers() {
        if let Some(index) = data.find_node_index(search_layer, neighbor_code) {
            let link = Link::node(search_layer, index);
            if search_layer == 0 {
                let node = &data.layer(0)[index as usize];
                if data.leaf_of(link, node).is_some_and(LeafNode::is_completely_blocked) {
                    return Link::INVALID;
                }
            }
            return link;
        }
        neighbor_code = parent_code(neighbor_code);
    }
    Link::INVALID
}
