//! Persistence: baked octrees and scene descriptions

pub mod baked;
pub mod scene;

pub use baked::{BakedVolume, BAKED_FILE_EXTENSION, BAKED_VOLUME_VERSION};
pub use scene::{ObstacleDef, SceneFile};
