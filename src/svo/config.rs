//! Navigation volume configuration.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;

/// Largest supported voxel power. The top layer index must fit the 4-bit
/// link layer field with 15 reserved for "invalid".
pub const MAX_VOXEL_POWER: u8 = 14;

/// How a volume obtains its octree when it is initialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationStrategy {
    /// Load a previously baked octree.
    UseBaked,
    /// Rasterize the collision world on initialization.
    #[default]
    GenerateOnBeginPlay,
}

/// Axis-aligned navigation volume and rasterization parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Volume center in world space.
    pub origin: [f32; 3],
    /// Half-size of the cuboid on each axis.
    pub extent: [f32; 3],
    /// Finest grid is 2^voxel_power cells per side. Layer count is voxel_power + 1.
    pub voxel_power: u8,
    /// Collision channel probed by overlap queries.
    pub collision_channel: u8,
    /// Extra clearance added to every probe half-extent.
    pub clearance: f32,
    pub generation_strategy: GenerationStrategy,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            extent: [1000.0; 3],
            voxel_power: 3,
            collision_channel: 0,
            clearance: 0.0,
            generation_strategy: GenerationStrategy::GenerateOnBeginPlay,
        }
    }
}

impl VolumeConfig {
    /// Config for a cuboid centered at `origin` with half-size `extent`.
    pub fn new(origin: Vec3, extent: Vec3, voxel_power: u8) -> Self {
        Self {
            origin: origin.to_array(),
            extent: extent.to_array(),
            voxel_power,
            ..Default::default()
        }
    }

    pub fn with_clearance(mut self, clearance: f32) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.collision_channel = channel;
        self
    }

    pub fn with_strategy(mut self, strategy: GenerationStrategy) -> Self {
        self.generation_strategy = strategy;
        self
    }

    pub fn origin(&self) -> Vec3 {
        Vec3::from_array(self.origin)
    }

    pub fn extent(&self) -> Vec3 {
        Vec3::from_array(self.extent)
    }

    pub fn num_layers(&self) -> u8 {
        self.voxel_power + 1
    }

    /// Reject configurations the generator cannot rasterize.
    pub fn validate(&self) -> Result<()> {
        if !self.extent.iter().all(|e| e.is_finite() && *e > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "extent must be positive on every axis, got {:?}",
                self.extent
            )));
        }
        if !self.origin.iter().all(|o| o.is_finite()) {
            return Err(Error::InvalidConfig(format!("origin is not finite: {:?}", self.origin)));
        }
        if !(self.clearance.is_finite() && self.clearance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "clearance must be non-negative, got {}",
                self.clearance
            )));
        }
        if self.voxel_power == 0 || self.voxel_power > MAX_VOXEL_POWER {
            return Err(Error::InvalidConfig(format!(
                "voxel_power must be in 1..={}, got {}",
                MAX_VOXEL_POWER, self.voxel_power
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = VolumeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_layers(), 4);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = VolumeConfig::new(Vec3::ZERO, Vec3::splat(4.0), 3);
        assert!(base.validate().is_ok());

        let mut c = base.clone();
        c.extent = [4.0, 0.0, 4.0];
        assert!(matches!(c.validate(), Err(Error::InvalidConfig(_))));

        let c = base.clone().with_clearance(-1.0);
        assert!(matches!(c.validate(), Err(Error::InvalidConfig(_))));

        let mut c = base.clone();
        c.voxel_power = 0;
        assert!(matches!(c.validate(), Err(Error::InvalidConfig(_))));
        c.voxel_power = MAX_VOXEL_POWER + 1;
        assert!(matches!(c.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_json_defaults_fill_missing_fields() {
        let config: VolumeConfig =
            serde_json::from_str(r#"{ "extent": [8.0, 2.0, 8.0], "voxel_power": 5 }"#).unwrap();
        assert_eq!(config.extent(), Vec3::new(8.0, 2.0, 8.0));
        assert_eq!(config.voxel_power, 5);
        assert_eq!(config.origin(), Vec3::ZERO);
        assert_eq!(config.generation_strategy, GenerationStrategy::GenerateOnBeginPlay);

        let json = serde_json::to_string(&config).unwrap();
        let back: VolumeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
