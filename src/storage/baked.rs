//! Baked octree files (rkyv + LZ4)

use std::path::Path;

use glam::Vec3;
use rkyv::{Archive, Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::svo::data::SvoData;
use crate::svo::leaf::LeafNode;
use crate::svo::node::Node;

/// Current version of the bake format
pub const BAKED_VOLUME_VERSION: u32 = 1;

/// File extension for baked volumes
pub const BAKED_FILE_EXTENSION: &str = "svon";

/// Serializable octree store with its volume geometry
#[derive(Archive, Deserialize, Serialize)]
pub struct BakedVolume {
    /// Format version for compatibility
    pub version: u32,
    pub voxel_power: u8,
    pub origin: [f32; 3],
    pub extent: [f32; 3],
    /// Node arrays, finest layer first
    pub layers: Vec<Vec<Node>>,
    pub leaf_nodes: Vec<LeafNode>,
}

impl BakedVolume {
    /// Snapshot a generated store
    pub fn from_data(data: &SvoData) -> Self {
        Self {
            version: BAKED_VOLUME_VERSION,
            voxel_power: data.voxel_power(),
            origin: data.origin().to_array(),
            extent: data.extent().to_array(),
            layers: data.layers().to_vec(),
            leaf_nodes: data.leaf_nodes().to_vec(),
        }
    }

    /// Rebuild the store, validating every layer and link
    pub fn into_data(self) -> Result<SvoData> {
        SvoData::from_parts(
            Vec3::from_array(self.origin),
            Vec3::from_array(self.extent),
            self.voxel_power,
            self.layers,
            self.leaf_nodes,
        )
    }

    /// Serialize to compressed bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| Error::MalformedStore(format!("serialization failed: {}", e)))?;
        Ok(lz4_flex::compress_prepend_size(&bytes))
    }

    /// Deserialize from compressed bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let decompressed = lz4_flex::decompress_size_prepended(data)
            .map_err(|e| Error::MalformedStore(format!("LZ4 decompression failed: {}", e)))?;

        // Archived nodes need 8-byte alignment
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(decompressed.len());
        aligned.extend_from_slice(&decompressed);

        let archived = rkyv::access::<ArchivedBakedVolume, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::MalformedStore(e.to_string()))?;

        let baked: BakedVolume = rkyv::deserialize::<BakedVolume, rkyv::rancor::Error>(archived)
            .map_err(|e| Error::MalformedStore(e.to_string()))?;

        if baked.version != BAKED_VOLUME_VERSION {
            return Err(Error::MalformedStore(format!(
                "bake version mismatch: expected {}, got {}",
                BAKED_VOLUME_VERSION, baked.version
            )));
        }
        Ok(baked)
    }

    /// Save to file (async)
    pub async fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Load from file (async)
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Self::from_bytes(&bytes)
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load from file (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
