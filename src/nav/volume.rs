//! Navigation volume: owns the generated octree and answers path queries

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec3;
use tokio::runtime::Handle;

use super::path::NavPath;
use super::pathfinder::PathFinder;
use super::settings::PathFinderSettings;
use super::task::{FindPathTask, PathRequest};
use crate::core::error::Error;
use crate::core::trace::{NavTrace, NoopTrace};
use crate::core::types::Result;
use crate::storage::baked::BakedVolume;
use crate::svo::builder::SvoBuilder;
use crate::svo::collision::CollisionQuery;
use crate::svo::config::{GenerationStrategy, VolumeConfig};
use crate::svo::data::SvoData;
use crate::svo::link::Link;
use crate::svo::mediator;

/// A navigable region of space.
///
/// The store sits behind an `Arc`: background searches keep the snapshot they
/// started with, and regeneration swaps in a new store only after it succeeds.
pub struct NavVolume {
    config: VolumeConfig,
    data: Arc<SvoData>,
    trace: Arc<dyn NavTrace>,
    bake_path: Option<PathBuf>,
}

impl NavVolume {
    pub fn new(config: VolumeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            data: Arc::new(SvoData::from_config(&config)),
            config,
            trace: Arc::new(NoopTrace),
            bake_path: None,
        })
    }

    /// Send generation and search diagnostics to `trace`
    pub fn with_trace(mut self, trace: Arc<dyn NavTrace>) -> Self {
        self.trace = trace;
        self
    }

    /// File read by [`NavVolume::initialize`] under [`GenerationStrategy::UseBaked`]
    pub fn with_bake_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bake_path = Some(path.into());
        self
    }

    pub fn config(&self) -> &VolumeConfig {
        &self.config
    }

    pub fn data(&self) -> &Arc<SvoData> {
        &self.data
    }

    /// Generate or load the octree according to the configured strategy
    pub fn initialize(&mut self, world: &dyn CollisionQuery) -> Result<()> {
        match self.config.generation_strategy {
            GenerationStrategy::GenerateOnBeginPlay => self.generate(world),
            GenerationStrategy::UseBaked => {
                let path = self
                    .bake_path
                    .clone()
                    .ok_or_else(|| Error::InvalidConfig("UseBaked strategy without a bake path".to_string()))?;
                self.load_baked(&path)
            }
        }
    }

    /// Rasterize `world` into a new octree. On failure the previous octree stays in place.
    pub fn generate(&mut self, world: &dyn CollisionQuery) -> Result<()> {
        let data = SvoBuilder::new(self.config.clone(), world)
            .with_trace(self.trace.as_ref())
            .build()?;
        self.data = Arc::new(data);
        Ok(())
    }

    /// Drop the octree. Returns true if there was one.
    pub fn clear_data(&mut self) -> bool {
        let had_data = self.data.is_valid();
        self.data = Arc::new(SvoData::from_config(&self.config));
        had_data
    }

    pub fn is_ready_for_navigation(&self) -> bool {
        self.data.is_valid()
    }

    pub fn link_from_location(&self, location: Vec3) -> Result<Link> {
        mediator::link_from_location(&self.data, location)
    }

    pub fn link_location(&self, link: Link) -> Result<(Vec3, bool)> {
        mediator::link_location(&self.data, link)
    }

    fn resolve(&self, start: Vec3, goal: Vec3) -> Result<PathRequest> {
        if !self.is_ready_for_navigation() {
            return Err(Error::NotGenerated);
        }
        let request = PathRequest {
            start: self.link_from_location(start)?,
            goal: self.link_from_location(goal)?,
            start_location: start,
            goal_location: goal,
        };
        Ok(request)
    }

    /// Search on the calling thread
    pub fn find_path_immediate(&self, start: Vec3, goal: Vec3, settings: &PathFinderSettings) -> Result<NavPath> {
        let request = self
            .resolve(start, goal)
            .inspect_err(|e| log::warn!("Rejected path query {} -> {}: {}", start, goal, e))?;
        PathFinder::new(&self.data, settings)
            .with_trace(self.trace.as_ref())
            .find_path(request.start, request.goal, start, goal)
    }

    /// Search on the runtime's blocking pool. Endpoints are resolved before
    /// the task starts, so unreachable or blocked endpoints fail here.
    pub fn find_path_async(
        &self,
        start: Vec3,
        goal: Vec3,
        settings: &PathFinderSettings,
        runtime: &Handle,
    ) -> Result<FindPathTask> {
        let request = self
            .resolve(start, goal)
            .inspect_err(|e| log::warn!("Rejected async path query {} -> {}: {}", start, goal, e))?;
        Ok(FindPathTask::spawn(
            runtime,
            Arc::clone(&self.data),
            request,
            settings.clone(),
            Arc::clone(&self.trace),
        ))
    }

    /// Write the current octree to a bake file
    pub fn save_baked(&self, path: &Path) -> Result<()> {
        if !self.is_ready_for_navigation() {
            return Err(Error::NotGenerated);
        }
        BakedVolume::from_data(&self.data).save_sync(path)?;
        log::info!("Saved baked volume to {:?} ({} nodes)", path, self.data.total_node_count());
        Ok(())
    }

    /// Replace the octree with a bake file. The bake must match this volume's geometry.
    pub fn load_baked(&mut self, path: &Path) -> Result<()> {
        let data = BakedVolume::load_sync(path)?.into_data()?;
        if data.voxel_power() != self.config.voxel_power
            || data.origin() != self.config.origin()
            || data.extent() != self.config.extent()
        {
            return Err(Error::MalformedStore(format!(
                "bake {:?} does not match volume (voxel power {}, origin {}, extent {})",
                path,
                self.config.voxel_power,
                self.config.origin(),
                self.config.extent()
            )));
        }
        log::info!("Loaded baked volume from {:?} ({} nodes)", path, data.total_node_count());
        self.data = Arc::new(data);
        Ok(())
    }
}
