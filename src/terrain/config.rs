//! Terrain configuration snapshot and scatter prototypes
//!
//! A `TerrainConfig` is an immutable per-frame snapshot: all procedural
//! outputs (heights, trees, detail points) are pure functions of
//! `(parcel, seed, config)`, so regenerating any parcel at any time
//! reproduces identical results.

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use super::occupancy::OccupancyMask;
use super::parcel::ParcelRect;

/// One level of detail of a tree prototype.
///
/// `min_screen_size` is the smallest projected size (local size over camera
/// distance) at which this LOD may still be used.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeLod {
    pub min_screen_size: f32,
}

/// A scatterable tree kind with distance-based LOD substitution.
///
/// LODs are ordered by decreasing `min_screen_size`: index 0 is the finest
/// mesh with the highest threshold, the last index the coarsest. Below the
/// last threshold the tree is culled entirely.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreePrototype {
    /// Bounding radius used for the screen-size LOD test
    pub local_size: f32,
    pub lods: Vec<TreeLod>,
}

/// A scatterable detail kind (grass, flowers, small meshes).
///
/// Placed on a jittered `density x density` grid per parcel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetailPrototype {
    pub density: u32,
    pub min_scale_xz: f32,
    pub max_scale_xz: f32,
    pub min_scale_y: f32,
    pub max_scale_y: f32,
}

/// Immutable terrain configuration snapshot.
///
/// Owned by the terrain asset; shared read-only by all parallel scatter and
/// height tasks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Side length of one parcel in world units
    pub parcel_size: f32,
    /// Authored parcel-space extent
    pub bounds: ParcelRect,
    /// Height range of the noise field
    pub max_height: f32,
    /// Horizontal noise scale (larger = smoother)
    pub noise_scale: f32,
    pub seed: u32,
    /// Probability of one tree per parcel, in `[0, 1]`
    pub trees_per_parcel: f32,
    pub tree_prototypes: Vec<TreePrototype>,
    pub detail_prototypes: Vec<DetailPrototype>,
    /// Camera distance beyond which detail scattering is skipped
    pub detail_distance: f32,
    /// Radius of the collision pool around the camera, in parcels
    pub collision_radius: i32,
    pub occupancy: OccupancyMask,
}

impl TerrainConfig {
    /// Parse and validate a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TerrainConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Fail-fast validation, run once at startup.
    ///
    /// Per-frame code assumes a validated config and never re-checks these.
    pub fn validate(&self) -> Result<()> {
        if !(self.parcel_size > 0.0) || !self.parcel_size.is_finite() {
            return Err(Error::Config(format!(
                "parcel_size must be positive, got {}",
                self.parcel_size
            )));
        }
        // verts_per_side() rounds to whole world units; below 0.5 the ground
        // mesh would degenerate to a single vertex per side
        if self.parcel_size.round() < 1.0 {
            return Err(Error::Config(format!(
                "parcel_size must be at least half a world unit, got {}",
                self.parcel_size
            )));
        }
        if !(self.max_height > 0.0) || !self.max_height.is_finite() {
            return Err(Error::Config(format!(
                "max_height must be positive, got {}",
                self.max_height
            )));
        }
        if !(self.noise_scale > 0.0) {
            return Err(Error::Config("noise_scale must be positive".into()));
        }
        if self.bounds.is_empty() {
            return Err(Error::Config("bounds must not be empty".into()));
        }
        if self.occupancy.bounds() != self.bounds {
            return Err(Error::Config(
                "occupancy mask bounds do not match terrain bounds".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.trees_per_parcel) {
            return Err(Error::Config(format!(
                "trees_per_parcel must be in [0, 1], got {}",
                self.trees_per_parcel
            )));
        }
        for (i, proto) in self.tree_prototypes.iter().enumerate() {
            if proto.lods.is_empty() {
                return Err(Error::Config(format!("tree prototype {i} has no LODs")));
            }
            let sorted = proto
                .lods
                .windows(2)
                .all(|w| w[0].min_screen_size >= w[1].min_screen_size);
            if !sorted {
                return Err(Error::Config(format!(
                    "tree prototype {i} LODs must be ordered by decreasing min_screen_size"
                )));
            }
            if !(proto.local_size > 0.0) {
                return Err(Error::Config(format!(
                    "tree prototype {i} local_size must be positive"
                )));
            }
        }
        for (i, proto) in self.detail_prototypes.iter().enumerate() {
            if proto.density == 0 {
                return Err(Error::Config(format!("detail prototype {i} density is zero")));
            }
            if proto.min_scale_xz > proto.max_scale_xz || proto.min_scale_y > proto.max_scale_y {
                return Err(Error::Config(format!(
                    "detail prototype {i} scale range is inverted"
                )));
            }
        }
        if self.detail_distance < 0.0 {
            return Err(Error::Config("detail_distance must not be negative".into()));
        }
        if self.collision_radius < 1 {
            return Err(Error::Config("collision_radius must be at least 1".into()));
        }
        Ok(())
    }

    /// Ground-mesh vertices per parcel side (one vertex per world unit)
    pub fn verts_per_side(&self) -> usize {
        self.parcel_size.round() as usize + 1
    }

    /// Flattened mesh bucket for a tree prototype LOD.
    ///
    /// Tree buckets come first, in prototype order, one per LOD; detail
    /// buckets follow.
    pub fn tree_bucket(&self, prototype: usize, lod: usize) -> u32 {
        debug_assert!(prototype < self.tree_prototypes.len());
        debug_assert!(lod < self.tree_prototypes[prototype].lods.len());
        let base: usize = self.tree_prototypes[..prototype]
            .iter()
            .map(|p| p.lods.len())
            .sum();
        (base + lod) as u32
    }

    /// Flattened mesh bucket for a detail prototype
    pub fn detail_bucket(&self, prototype: usize) -> u32 {
        debug_assert!(prototype < self.detail_prototypes.len());
        let tree_buckets: usize = self.tree_prototypes.iter().map(|p| p.lods.len()).sum();
        (tree_buckets + prototype) as u32
    }

    /// Total number of mesh buckets
    pub fn bucket_count(&self) -> u32 {
        let tree_buckets: usize = self.tree_prototypes.iter().map(|p| p.lods.len()).sum();
        (tree_buckets + self.detail_prototypes.len()) as u32
    }

    /// Conservative bounding radius of instances in a bucket, for draw bounds
    pub fn bucket_radius(&self, mesh_index: u32) -> f32 {
        let mut index = mesh_index as usize;
        for proto in &self.tree_prototypes {
            if index < proto.lods.len() {
                return proto.local_size;
            }
            index -= proto.lods.len();
        }
        match self.detail_prototypes.get(index) {
            Some(d) => d.max_scale_xz.max(d.max_scale_y),
            None => 0.0,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config(bounds: ParcelRect) -> TerrainConfig {
    TerrainConfig {
        parcel_size: 16.0,
        bounds,
        max_height: 40.0,
        noise_scale: 100.0,
        seed: 1,
        trees_per_parcel: 0.5,
        tree_prototypes: vec![TreePrototype {
            local_size: 10.0,
            lods: vec![
                TreeLod { min_screen_size: 0.2 },
                TreeLod { min_screen_size: 0.05 },
            ],
        }],
        detail_prototypes: vec![DetailPrototype {
            density: 4,
            min_scale_xz: 0.8,
            max_scale_xz: 1.2,
            min_scale_y: 0.7,
            max_scale_y: 1.4,
        }],
        detail_distance: 128.0,
        collision_radius: 2,
        occupancy: OccupancyMask::unoccupied(bounds),
    }
}
