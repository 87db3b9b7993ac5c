//! Ephemeral scattered-instance records
//!
//! Produced by the scatterer, consumed by the render-list builder within the
//! same frame, never persisted.

use crate::core::types::Vec3;

/// One scattered tree, already resolved to a concrete LOD mesh bucket
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeInstance {
    /// Flattened prototype/LOD bucket id
    pub mesh_index: u32,
    pub position: Vec3,
    /// Yaw in radians
    pub rotation_y: f32,
}

/// One scattered detail mesh (grass, flowers)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetailInstance {
    /// Flattened mesh bucket id (after all tree buckets)
    pub mesh_index: u32,
    pub position: Vec3,
    /// Yaw in radians
    pub rotation_y: f32,
    pub scale_xz: f32,
    pub scale_y: f32,
}
