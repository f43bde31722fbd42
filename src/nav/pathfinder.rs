//! A* search over octree links.
//!
//! The graph mixes resolutions: coarse empty nodes, open layer-0 nodes and
//! individual leaf sub-voxels are all vertices. Expansion descends into the
//! near face of any neighbor that has children, so every finer cell along a
//! resolution boundary is reachable in one step.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use glam::{IVec3, Vec3};

use super::path::{NavPath, PathPoint};
use super::settings::{PathCostType, PathFinderSettings};
use crate::core::error::Error;
use crate::core::trace::{NavTrace, NoopTrace};
use crate::core::types::Result;
use crate::math::morton::{decode_morton_3d, encode_morton_3d};
use crate::svo::data::SvoData;
use crate::svo::leaf::LEAF_SIDE;
use crate::svo::link::Link;
use crate::svo::node::Direction;

/// Collect every link reachable from `link` in one step.
pub fn link_neighbors(data: &SvoData, link: Link, out: &mut Vec<Link>) -> Result<()> {
    let node = data.node(link)?;
    if data.leaf_of(link, node).is_some() {
        leaf_neighbors(data, link, out)
    } else {
        for direction in Direction::ALL {
            let neighbor = node.neighbor(direction);
            if neighbor.is_valid() {
                face_neighbors(data, neighbor, direction, out)?;
            }
        }
        Ok(())
    }
}

/// Neighbors of a leaf sub-voxel: adjacent open sub-voxels inside the leaf,
/// or across the leaf boundary through the node's neighbor link.
fn leaf_neighbors(data: &SvoData, link: Link, out: &mut Vec<Link>) -> Result<()> {
    let node = data.node(link)?;
    let leaf = data.leaf_of(link, node).ok_or(Error::InvalidLink(link))?;
    let (x, y, z) = decode_morton_3d(link.sub_node_index() as u64);
    let cell = IVec3::new(x as i32, y as i32, z as i32);
    let side = LEAF_SIDE as i32;

    for direction in Direction::ALL {
        let next = cell + direction.offset();
        if next.min_element() >= 0 && next.max_element() < side {
            let sub = encode_morton_3d(next.x as u32, next.y as u32, next.z as u32) as u8;
            if !leaf.is_blocked(sub) {
                out.push(link.with_sub_node(sub));
            }
            continue;
        }

        let neighbor_link = node.neighbor(direction);
        if !neighbor_link.is_valid() {
            continue;
        }
        let neighbor = data.node(neighbor_link)?;
        if !neighbor.has_children() {
            out.push(neighbor_link);
            continue;
        }
        match data.leaf_of(neighbor_link, neighbor) {
            Some(neighbor_leaf) => {
                if neighbor_leaf.is_completely_blocked() {
                    continue;
                }
                let mut wrapped = next;
                wrapped[direction.axis()] = direction.entry_coordinate() as i32;
                let sub = encode_morton_3d(wrapped.x as u32, wrapped.y as u32, wrapped.z as u32) as u8;
                if !neighbor_leaf.is_blocked(sub) {
                    out.push(neighbor_link.with_sub_node(sub));
                }
            }
            None => face_neighbors(data, neighbor_link, direction, out)?,
        }
    }
    Ok(())
}

/// `link` itself if it has no children, otherwise its children touching the
/// face we arrive through, recursively down to open leaf sub-voxels.
fn face_neighbors(data: &SvoData, link: Link, direction: Direction, out: &mut Vec<Link>) -> Result<()> {
    let node = data.node(link)?;
    if !node.has_children() {
        out.push(link);
        return Ok(());
    }

    if let Some(leaf) = data.leaf_of(link, node) {
        if leaf.is_completely_blocked() {
            return Ok(());
        }
        let axis = direction.axis();
        let entry = direction.entry_coordinate();
        for sub in 0..64u8 {
            let (x, y, z) = decode_morton_3d(sub as u64);
            if [x, y, z][axis] == entry && !leaf.is_blocked(sub) {
                out.push(link.with_sub_node(sub));
            }
        }
        return Ok(());
    }

    for octant in direction.near_face_octants() {
        face_neighbors(data, node.first_child.offset_node(octant as u32), direction, out)?;
    }
    Ok(())
}

/// Debug-draw layer of a path vertex
fn path_layer(data: &SvoData, link: Link) -> i32 {
    match data.get_node(link) {
        Some(node) if link.layer() == 0 && node.has_children() => 0,
        _ => link.layer() as i32 + 1,
    }
}

/// Single A* search against a read-only store.
pub struct PathFinder<'a> {
    data: &'a SvoData,
    settings: &'a PathFinderSettings,
    trace: &'a dyn NavTrace,
    num_layers: f32,

    open: Vec<Link>,
    open_members: HashSet<Link>,
    closed: HashSet<Link>,
    came_from: HashMap<Link, Link>,
    g_score: HashMap<Link, f32>,
    f_score: HashMap<Link, f32>,
    goal: Link,
}

impl<'a> PathFinder<'a> {
    pub fn new(data: &'a SvoData, settings: &'a PathFinderSettings) -> Self {
        Self {
            data,
            settings,
            trace: &NoopTrace,
            num_layers: data.num_layers().max(1) as f32,
            open: Vec::new(),
            open_members: HashSet::new(),
            closed: HashSet::new(),
            came_from: HashMap::new(),
            g_score: HashMap::new(),
            f_score: HashMap::new(),
            goal: Link::INVALID,
        }
    }

    /// Receive opened links when `debug_open_nodes` is set
    pub fn with_trace(mut self, trace: &'a dyn NavTrace) -> Self {
        self.trace = trace;
        self
    }

    /// Search from `start` to `goal` and return the path with its ends
    /// pinned to the exact requested positions.
    pub fn find_path(&mut self, start: Link, goal: Link, start_pos: Vec3, goal_pos: Vec3) -> Result<NavPath> {
        let links = self.find_link_path(start, goal)?;

        let mut path = NavPath::new();
        if links.len() == 1 {
            let layer = path_layer(self.data, links[0]);
            path.add_point(PathPoint::new(start_pos, layer));
            path.add_point(PathPoint::new(goal_pos, layer));
        } else {
            for &link in &links {
                let location = self.data.link_position(link)?;
                path.add_point(PathPoint::new(location, path_layer(self.data, link)));
            }
            let last = links.len() - 1;
            path.points_mut()[0].location = start_pos;
            path.points_mut()[last].location = goal_pos;
        }

        if self.settings.smoothing_iterations > 0 {
            path.smooth(self.settings.smoothing_iterations);
        }
        path.set_ready(true);
        Ok(path)
    }

    /// Search from `start` to `goal` and return the link chain, both ends included.
    pub fn find_link_path(&mut self, start: Link, goal: Link) -> Result<Vec<Link>> {
        self.data.node(start)?;
        self.data.node(goal)?;
        self.reset(goal);

        let started = Instant::now();
        self.g_score.insert(start, 0.0);
        let h = self.heuristic(start)? * self.settings.weight_estimate;
        self.f_score.insert(start, h);
        self.push_open(start)?;

        let mut iterations = 0usize;
        let mut neighbors = Vec::with_capacity(32);
        while let Some(current) = self.pop_open() {
            iterations += 1;
            if current == goal {
                let links = self.reconstruct(current);
                log::debug!(
                    "Path found in {} iterations ({:.2}ms), {} links",
                    iterations,
                    started.elapsed().as_secs_f64() * 1000.0,
                    links.len()
                );
                return Ok(links);
            }

            self.closed.insert(current);
            neighbors.clear();
            link_neighbors(self.data, current, &mut neighbors)?;
            for &neighbor in &neighbors {
                self.process_link(current, neighbor)?;
            }
        }

        log::debug!("No path after {} iterations", iterations);
        Err(Error::NoPath { iterations })
    }

    fn reset(&mut self, goal: Link) {
        self.open.clear();
        self.open_members.clear();
        self.closed.clear();
        self.came_from.clear();
        self.g_score.clear();
        self.f_score.clear();
        self.goal = goal;
    }

    fn push_open(&mut self, link: Link) -> Result<()> {
        self.open.push(link);
        self.open_members.insert(link);
        if self.settings.debug_open_nodes {
            self.trace.open_node(link, self.data.link_position(link)?);
        }
        Ok(())
    }

    /// Remove and return the open link with the lowest f-score. First found wins ties.
    fn pop_open(&mut self) -> Option<Link> {
        let mut best: Option<(usize, f32)> = None;
        for (i, link) in self.open.iter().enumerate() {
            let f = self.f_score.get(link).copied().unwrap_or(f32::INFINITY);
            if best.is_none_or(|(_, best_f)| f < best_f) {
                best = Some((i, f));
            }
        }
        let (index, _) = best?;
        let link = self.open.swap_remove(index);
        self.open_members.remove(&link);
        Some(link)
    }

    fn process_link(&mut self, current: Link, neighbor: Link) -> Result<()> {
        if self.closed.contains(&neighbor) {
            return Ok(());
        }
        let tentative = self.g_score.get(&current).copied().unwrap_or(f32::INFINITY)
            + self.cost(current, neighbor)?;

        if !self.open_members.contains(&neighbor) {
            self.push_open(neighbor)?;
        } else if tentative >= self.g_score.get(&neighbor).copied().unwrap_or(f32::INFINITY) {
            return Ok(());
        }

        self.came_from.insert(neighbor, current);
        self.g_score.insert(neighbor, tentative);
        let h = self.heuristic(neighbor)?;
        self.f_score.insert(neighbor, tentative + h * self.settings.weight_estimate);
        Ok(())
    }

    /// Step cost, discounted for larger destination voxels
    fn cost(&self, from: Link, to: Link) -> Result<f32> {
        let base = if self.settings.use_unit_cost {
            self.settings.unit_cost
        } else {
            self.data.link_position(from)?.distance(self.data.link_position(to)?)
        };
        Ok(base * self.layer_scale(to))
    }

    fn heuristic(&self, link: Link) -> Result<f32> {
        let from = self.data.link_position(link)?;
        let to = self.data.link_position(self.goal)?;
        let distance = match self.settings.path_cost_type {
            PathCostType::Manhattan => (to - from).abs().element_sum(),
            PathCostType::Euclidean => from.distance(to),
        };
        Ok(distance * self.layer_scale(self.goal))
    }

    fn layer_scale(&self, link: Link) -> f32 {
        1.0 - (link.layer() as f32 / self.num_layers) * self.settings.node_size_compensation
    }

    fn reconstruct(&self, goal: Link) -> Vec<Link> {
        let mut links = vec![goal];
        let mut current = goal;
        while let Some(&previous) = self.came_from.get(&current) {
            links.push(previous);
            current = previous;
        }
        links.reverse();
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svo::builder::SvoBuilder;
    use crate::svo::collision::{Obstacle, ObstacleSet};
    use crate::svo::config::VolumeConfig;
    use crate::svo::mediator::link_from_location;

    fn build(world: &ObstacleSet) -> SvoData {
        let config = VolumeConfig::new(Vec3::ZERO, Vec3::splat(4.0), 3);
        SvoBuilder::new(config, world).build().unwrap()
    }

    fn box_world() -> ObstacleSet {
        ObstacleSet::new().with(Obstacle::cuboid(Vec3::splat(-0.6), Vec3::splat(0.6)))
    }

    fn shell_world() -> ObstacleSet {
        let mut world = ObstacleSet::new();
        for axis in 0..3 {
            for (lo, hi) in [(-2.0, -1.0), (1.0, 2.0)] {
                let mut min = Vec3::splat(-2.0);
                let mut max = Vec3::splat(2.0);
                min[axis] = lo;
                max[axis] = hi;
                world.add(Obstacle::cuboid(min, max));
            }
        }
        world
    }

    fn inside_box(p: Vec3) -> bool {
        p.abs().cmplt(Vec3::splat(0.6)).all()
    }

    #[test]
    fn test_empty_volume_straight_path() {
        let data = build(&ObstacleSet::new());
        let settings = PathFinderSettings::default();
        let start = Vec3::splat(-3.5);
        let goal = Vec3::splat(3.5);
        let start_link = link_from_location(&data, start).unwrap();
        let goal_link = link_from_location(&data, goal).unwrap();

        let path = PathFinder::new(&data, &settings)
            .find_path(start_link, goal_link, start, goal)
            .unwrap();
        assert!(path.is_ready());
        assert_eq!(path.locations(), vec![start, goal]);
        assert_eq!(path.points()[0].layer, 4);
    }

    #[test]
    fn test_detour_around_box() {
        let data = build(&box_world());
        let settings = PathFinderSettings::default();
        let start = Vec3::new(-0.875, 0.125, 0.125);
        let goal = Vec3::new(0.875, 0.125, 0.125);
        let start_link = link_from_location(&data, start).unwrap();
        let goal_link = link_from_location(&data, goal).unwrap();
        assert_eq!(start_link.layer(), 0);
        assert_eq!(goal_link.layer(), 0);

        let mut finder = PathFinder::new(&data, &settings);
        let links = finder.find_link_path(start_link, goal_link).unwrap();
        assert_eq!(links.first(), Some(&start_link));
        assert_eq!(links.last(), Some(&goal_link));

        let mut neighbors = Vec::new();
        for pair in links.windows(2) {
            neighbors.clear();
            link_neighbors(&data, pair[0], &mut neighbors).unwrap();
            assert!(neighbors.contains(&pair[1]), "{} does not reach {}", pair[0], pair[1]);
        }

        let path = finder.find_path(start_link, goal_link, start, goal).unwrap();
        let locations = path.locations();
        assert!(locations.len() > 2);
        assert_eq!(locations[0], start);
        assert_eq!(*locations.last().unwrap(), goal);
        assert!(locations.iter().all(|&p| !inside_box(p)));
        // The straight segment through the box is 1.75 long
        assert!(path.length() > 1.75);
    }

    #[test]
    fn test_manhattan_and_unit_cost() {
        let data = build(&box_world());
        let settings = PathFinderSettings {
            use_unit_cost: true,
            path_cost_type: PathCostType::Manhattan,
            node_size_compensation: 0.0,
            ..Default::default()
        };
        let start = Vec3::new(-0.875, -0.125, 0.125);
        let goal = Vec3::new(0.875, -0.125, 0.125);
        let start_link = link_from_location(&data, start).unwrap();
        let goal_link = link_from_location(&data, goal).unwrap();
        let path = PathFinder::new(&data, &settings)
            .find_path(start_link, goal_link, start, goal)
            .unwrap();
        assert!(path.len() > 2);
        assert!(path.locations().iter().all(|&p| !inside_box(p)));
    }

    #[test]
    fn test_enclosed_start_has_no_path() {
        let data = build(&shell_world());
        let settings = PathFinderSettings::default();
        let start = Vec3::splat(-0.5);
        let goal = Vec3::splat(3.5);
        let start_link = link_from_location(&data, start).unwrap();
        let goal_link = link_from_location(&data, goal).unwrap();

        let result = PathFinder::new(&data, &settings).find_path(start_link, goal_link, start, goal);
        match result {
            Err(Error::NoPath { iterations }) => assert!((1..=8).contains(&iterations)),
            other => panic!("expected NoPath, got {:?}", other),
        }
    }

    #[test]
    fn test_leaf_neighbors_stay_open() {
        let data = build(&box_world());
        let link = link_from_location(&data, Vec3::new(0.9, 0.1, 0.1)).unwrap();
        let mut neighbors = Vec::new();
        link_neighbors(&data, link, &mut neighbors).unwrap();
        assert!(!neighbors.is_empty());
        for neighbor in neighbors {
            let (_, open) = data.link_location(neighbor).unwrap();
            assert!(open);
        }
    }

    #[test]
    fn test_smoothing_keeps_endpoints() {
        let data = build(&box_world());
        let settings = PathFinderSettings { smoothing_iterations: 2, ..Default::default() };
        let start = Vec3::new(-0.875, 0.125, 0.125);
        let goal = Vec3::new(0.875, 0.125, 0.125);
        let start_link = link_from_location(&data, start).unwrap();
        let goal_link = link_from_location(&data, goal).unwrap();
        let path = PathFinder::new(&data, &settings)
            .find_path(start_link, goal_link, start, goal)
            .unwrap();
        assert_eq!(path.locations()[0], start);
        assert_eq!(*path.locations().last().unwrap(), goal);
    }

    #[test]
    fn test_invalid_links_rejected() {
        let data = build(&ObstacleSet::new());
        let settings = PathFinderSettings::default();
        let result = PathFinder::new(&data, &settings).find_link_path(Link::node(0, 5), Link::node(3, 0));
        assert!(matches!(result, Err(Error::InvalidLink(_))));
    }
}
