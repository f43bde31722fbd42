//! SVON - sparse voxel octree navigation for flying and swimming agents
//!
//! A [`nav::NavVolume`] rasterizes blocking geometry from a
//! [`svo::CollisionQuery`] into a multi-resolution octree, then answers A*
//! path queries over it, either on the calling thread or on a tokio
//! blocking pool.

pub mod core;
pub mod math;
pub mod svo;
pub mod nav;
pub mod storage;
