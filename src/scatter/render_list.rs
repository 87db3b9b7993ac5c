//! Instance bucketing for instanced draw submission
//!
//! Turns the frame's unordered scatter output into per-mesh-bucket transform
//! runs: one instanced draw per non-empty bucket.

use crate::core::types::{Mat4, Quat, Vec3};
use crate::math::Aabb;
use crate::terrain::config::TerrainConfig;
use super::instance::{DetailInstance, TreeInstance};

/// One contiguous run of transforms sharing a mesh bucket
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawBatch {
    pub mesh_index: u32,
    pub start_instance: u32,
    pub instance_count: u32,
    /// World-space bounds of the batch, for backend culling
    pub bounds: Aabb,
}

#[derive(Clone, Copy)]
struct RenderInstance {
    mesh_index: u32,
    position: Vec3,
    rotation_y: f32,
    scale_xz: f32,
    scale_y: f32,
}

/// Builds sorted transform batches from scattered instances.
///
/// Scratch buffers are caller-owned state, reused across frames.
#[derive(Default)]
pub struct RenderList {
    scratch: Vec<RenderInstance>,
    transforms: Vec<Mat4>,
    batches: Vec<DrawBatch>,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild batches from this frame's instances.
    ///
    /// Stable sort by `mesh_index`; instances with equal buckets keep their
    /// encounter order. Emits one transform per instance in sorted order.
    pub fn build(
        &mut self,
        config: &TerrainConfig,
        trees: &[TreeInstance],
        details: &[DetailInstance],
    ) {
        self.scratch.clear();
        self.transforms.clear();
        self.batches.clear();
        self.scratch.reserve(trees.len() + details.len());

        for tree in trees {
            self.scratch.push(RenderInstance {
                mesh_index: tree.mesh_index,
                position: tree.position,
                rotation_y: tree.rotation_y,
                scale_xz: 1.0,
                scale_y: 1.0,
            });
        }
        for detail in details {
            self.scratch.push(RenderInstance {
                mesh_index: detail.mesh_index,
                position: detail.position,
                rotation_y: detail.rotation_y,
                scale_xz: detail.scale_xz,
                scale_y: detail.scale_y,
            });
        }

        self.scratch.sort_by_key(|instance| instance.mesh_index);

        let mut run_start = 0usize;
        let mut run_bounds = Aabb::default();
        for i in 0..self.scratch.len() {
            let instance = &self.scratch[i];
            if i == run_start {
                run_bounds = Aabb::new(instance.position, instance.position);
            } else {
                run_bounds.expand(instance.position);
            }

            self.transforms.push(Mat4::from_scale_rotation_translation(
                Vec3::new(instance.scale_xz, instance.scale_y, instance.scale_xz),
                Quat::from_rotation_y(instance.rotation_y),
                instance.position,
            ));

            let run_ends = i + 1 == self.scratch.len()
                || self.scratch[i + 1].mesh_index != instance.mesh_index;
            if run_ends {
                self.batches.push(DrawBatch {
                    mesh_index: instance.mesh_index,
                    start_instance: run_start as u32,
                    instance_count: (i + 1 - run_start) as u32,
                    bounds: run_bounds.inflated(config.bucket_radius(instance.mesh_index)),
                });
                run_start = i + 1;
            }
        }
    }

    /// One world transform per instance, batch order
    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    /// One batch per non-empty mesh bucket, ascending `mesh_index`
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }
}
