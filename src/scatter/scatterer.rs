//! Per-parcel procedural object placement
//!
//! Scattering each parcel is a pure function of `(parcel, seed, config)` and
//! the camera (for culling and LOD only), so parcels scatter in parallel with
//! no cross-parcel state.

use rayon::prelude::*;

use crate::core::types::Vec3;
use crate::math::frustum::ClipVolume;
use crate::math::hash::ParcelRng;
use crate::terrain::config::{TerrainConfig, TreePrototype};
use crate::terrain::heightfield::HeightField;
use crate::terrain::parcel::{Parcel, ParcelRect};
use super::append::AppendBuffer;
use super::instance::{DetailInstance, TreeInstance};

/// Per-frame scatter counters, merged across parallel parcel tasks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScatterStats {
    pub parcels_considered: usize,
    pub parcels_occupied: usize,
    pub parcels_culled: usize,
    pub trees: usize,
    pub details: usize,
}

impl ScatterStats {
    fn merged(self, other: Self) -> Self {
        Self {
            parcels_considered: self.parcels_considered + other.parcels_considered,
            parcels_occupied: self.parcels_occupied + other.parcels_occupied,
            parcels_culled: self.parcels_culled + other.parcels_culled,
            trees: self.trees + other.trees,
            details: self.details + other.details,
        }
    }
}

/// A tree position drawn for one parcel, before LOD selection.
///
/// The collision streamer replays exactly this placement when it regenerates
/// a parcel, so scatter and collision trees always agree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreePlacement {
    pub position: Vec3,
    /// Yaw in radians
    pub rotation_y: f32,
    pub prototype: usize,
}

/// Single Bernoulli tree trial for a parcel.
///
/// Draw order is part of the determinism contract: the trial value first,
/// then (only when a tree is placed) position X, position Z, yaw, prototype.
pub fn place_tree(
    config: &TerrainConfig,
    heights: &HeightField,
    parcel: Parcel,
    rng: &mut ParcelRng,
) -> Option<TreePlacement> {
    let trial = rng.next_f32();
    if trial >= config.trees_per_parcel || config.tree_prototypes.is_empty() {
        return None;
    }

    let min = parcel.world_min(config.parcel_size);
    let x = min.x + rng.next_f32() * config.parcel_size;
    let z = min.y + rng.next_f32() * config.parcel_size;
    let y = heights.height_at(x, z);
    let rotation_y = rng.range_f32(-std::f32::consts::PI, std::f32::consts::PI);
    let prototype = rng.index(config.tree_prototypes.len());

    Some(TreePlacement {
        position: Vec3::new(x, y, z),
        rotation_y,
        prototype,
    })
}

/// Select the LOD for a given projected screen size.
///
/// Walks the LOD list (ordered by decreasing `min_screen_size`) past every
/// level whose threshold exceeds the screen size; returns the first level
/// that passes, or `None` when the tree is too small to draw at all. As
/// screen size shrinks the returned index never decreases.
pub fn select_lod(prototype: &TreePrototype, screen_size: f32) -> Option<usize> {
    let mut index = 0;
    while index < prototype.lods.len() && prototype.lods[index].min_screen_size > screen_size {
        index += 1;
    }
    (index < prototype.lods.len()).then_some(index)
}

/// Frustum-culled parallel scatterer with capacity-bounded output buffers
pub struct Scatterer {
    trees: AppendBuffer<TreeInstance>,
    details: AppendBuffer<DetailInstance>,
}

impl Scatterer {
    pub fn new(tree_capacity: usize, detail_capacity: usize) -> Self {
        Self {
            trees: AppendBuffer::new(tree_capacity),
            details: AppendBuffer::new(detail_capacity),
        }
    }

    /// Scatter every visible parcel of `clip_rect` in parallel.
    ///
    /// Outputs land in the instance buffers; read them with [`instances`]
    /// before the next call.
    ///
    /// [`instances`]: Self::instances
    pub fn scatter(
        &mut self,
        config: &TerrainConfig,
        heights: &HeightField,
        clip: &ClipVolume,
        camera_pos: Vec3,
        clip_rect: ParcelRect,
    ) -> ScatterStats {
        self.trees.clear();
        self.details.clear();

        let parcels: Vec<Parcel> = clip_rect.iter().collect();
        let trees = &self.trees;
        let details = &self.details;
        parcels
            .par_iter()
            .map(|&parcel| {
                scatter_parcel(config, heights, clip, camera_pos, parcel, trees, details)
            })
            .reduce(ScatterStats::default, ScatterStats::merged)
    }

    /// Instances produced by the last `scatter` call
    pub fn instances(&mut self) -> (&[TreeInstance], &[DetailInstance]) {
        (self.trees.as_slice(), self.details.as_slice())
    }

    /// Instances refused by full buffers during the last `scatter` call
    pub fn dropped(&self) -> usize {
        self.trees.overflow() + self.details.overflow()
    }

    /// Grow any overflowed buffer for the next frame.
    ///
    /// Call after the frame's instances have been consumed; growth discards
    /// buffer contents. Truncation is visually transient, so this warns
    /// rather than failing.
    pub fn grow_if_overflowed(&mut self) {
        if self.trees.overflow() > 0 {
            log::warn!(
                "tree buffer overflowed by {} instances, growing {} -> next frame",
                self.trees.overflow(),
                self.trees.capacity(),
            );
            self.trees.grow();
        }
        if self.details.overflow() > 0 {
            log::warn!(
                "detail buffer overflowed by {} instances, growing {} -> next frame",
                self.details.overflow(),
                self.details.capacity(),
            );
            self.details.grow();
        }
    }
}

/// Scatter one parcel: tree trial plus jittered-grid details
fn scatter_parcel(
    config: &TerrainConfig,
    heights: &HeightField,
    clip: &ClipVolume,
    camera_pos: Vec3,
    parcel: Parcel,
    trees: &AppendBuffer<TreeInstance>,
    details: &AppendBuffer<DetailInstance>,
) -> ScatterStats {
    let mut stats = ScatterStats {
        parcels_considered: 1,
        ..Default::default()
    };

    if config.occupancy.is_occupied(parcel) {
        stats.parcels_occupied = 1;
        return stats;
    }
    if !clip.overlaps(&parcel.world_aabb(config.parcel_size, config.max_height)) {
        stats.parcels_culled = 1;
        return stats;
    }

    let mut rng = ParcelRng::for_cell(parcel.x, parcel.y, config.bounds.width(), config.seed);

    if let Some(placement) = place_tree(config, heights, parcel, &mut rng) {
        let prototype = &config.tree_prototypes[placement.prototype];
        let distance = placement.position.distance(camera_pos).max(1e-5);
        let screen_size = prototype.local_size / distance;
        if let Some(lod) = select_lod(prototype, screen_size) {
            if trees.push(TreeInstance {
                mesh_index: config.tree_bucket(placement.prototype, lod),
                position: placement.position,
                rotation_y: placement.rotation_y,
            }) {
                stats.trees = 1;
            }
        }
    }

    let parcel_min = parcel.world_min(config.parcel_size);
    let center = parcel_min + config.parcel_size * 0.5;
    let camera_xz = Vec3::new(camera_pos.x, 0.0, camera_pos.z);
    let center_xz = Vec3::new(center.x, 0.0, center.y);
    if center_xz.distance(camera_xz) > config.detail_distance {
        return stats;
    }

    // Neighbor occupancy decides which edge rows/columns stay clear
    let block_left = config.occupancy.is_occupied(Parcel::new(parcel.x - 1, parcel.y));
    let block_right = config.occupancy.is_occupied(Parcel::new(parcel.x + 1, parcel.y));
    let block_near = config.occupancy.is_occupied(Parcel::new(parcel.x, parcel.y - 1));
    let block_far = config.occupancy.is_occupied(Parcel::new(parcel.x, parcel.y + 1));

    for (proto_index, proto) in config.detail_prototypes.iter().enumerate() {
        let mesh_index = config.detail_bucket(proto_index);
        let density = proto.density;
        let cell = config.parcel_size / density as f32;
        for cz in 0..density {
            if (cz == 0 && block_near) || (cz == density - 1 && block_far) {
                continue;
            }
            for cx in 0..density {
                if (cx == 0 && block_left) || (cx == density - 1 && block_right) {
                    continue;
                }
                let x = parcel_min.x + (cx as f32 + rng.next_f32()) * cell;
                let z = parcel_min.y + (cz as f32 + rng.next_f32()) * cell;
                let rotation_y = rng.range_f32(-std::f32::consts::PI, std::f32::consts::PI);
                let scale_xz = rng.range_f32(proto.min_scale_xz, proto.max_scale_xz);
                let scale_y = rng.range_f32(proto.min_scale_y, proto.max_scale_y);
                if details.push(DetailInstance {
                    mesh_index,
                    position: Vec3::new(x, heights.height_at(x, z), z),
                    rotation_y,
                    scale_xz,
                    scale_y,
                }) {
                    stats.details += 1;
                }
            }
        }
    }

    stats
}
