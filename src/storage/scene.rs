//! JSON scene description: a volume, its obstacles and search settings.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::nav::settings::PathFinderSettings;
use crate::svo::collision::{Obstacle, ObstacleSet};
use crate::svo::config::VolumeConfig;

/// One obstacle as written in a scene file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObstacleDef {
    Box {
        min: [f32; 3],
        max: [f32; 3],
        #[serde(default)]
        channel: u8,
    },
    Sphere {
        center: [f32; 3],
        radius: f32,
        #[serde(default)]
        channel: u8,
    },
}

impl ObstacleDef {
    pub fn to_obstacle(&self) -> Obstacle {
        match *self {
            ObstacleDef::Box { min, max, channel } => {
                Obstacle::cuboid(Vec3::from_array(min), Vec3::from_array(max)).on_channel(channel)
            }
            ObstacleDef::Sphere { center, radius, channel } => {
                Obstacle::sphere(Vec3::from_array(center), radius).on_channel(channel)
            }
        }
    }
}

/// Scene file contents
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    pub volume: VolumeConfig,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDef>,
    #[serde(default)]
    pub path_finder: PathFinderSettings,
}

impl SceneFile {
    pub fn from_json(json: &str) -> Result<Self> {
        let scene: SceneFile = serde_json::from_str(json)?;
        scene.volume.validate()?;
        Ok(scene)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Collision world for the scene's obstacles
    pub fn world(&self) -> ObstacleSet {
        let mut world = ObstacleSet::new();
        for def in &self.obstacles {
            world.add(def.to_obstacle());
        }
        world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::svo::collision::{CollisionQuery, OverlapQuery};

    const SCENE: &str = r#"{
        "volume": { "origin": [0.0, 0.0, 0.0], "extent": [4.0, 4.0, 4.0], "voxel_power": 3 },
        "obstacles": [
            { "type": "box", "min": [-0.6, -0.6, -0.6], "max": [0.6, 0.6, 0.6] },
            { "type": "sphere", "center": [2.0, 2.0, 2.0], "radius": 0.5, "channel": 1 }
        ],
        "path_finder": { "smoothing_iterations": 1 }
    }"#;

    #[test]
    fn test_parse_scene() {
        let scene = SceneFile::from_json(SCENE).unwrap();
        assert_eq!(scene.volume.voxel_power, 3);
        assert_eq!(scene.obstacles.len(), 2);
        assert_eq!(scene.path_finder.smoothing_iterations, 1);

        let world = scene.world();
        assert_eq!(world.len(), 2);
        assert!(world.overlap_blocked(&OverlapQuery::cube(Vec3::ZERO, 0.1, 0, 0.0)));
        assert!(!world.overlap_blocked(&OverlapQuery::cube(Vec3::splat(2.0), 0.1, 0, 0.0)));
        assert!(world.overlap_blocked(&OverlapQuery::cube(Vec3::splat(2.0), 0.1, 1, 0.0)));
    }

    #[test]
    fn test_invalid_volume_rejected() {
        let json = r#"{ "volume": { "extent": [4.0, -1.0, 4.0] } }"#;
        assert!(matches!(SceneFile::from_json(json), Err(Error::InvalidConfig(_))));
        assert!(matches!(SceneFile::from_json("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_save_and_load() {
        let scene = SceneFile::from_json(SCENE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        scene.save(&path).unwrap();
        assert_eq!(SceneFile::load(&path).unwrap(), scene);
    }
}
