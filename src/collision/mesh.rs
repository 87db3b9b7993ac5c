//! Per-parcel ground collision mesh
//!
//! A regular height grid of `(verts_per_side)^2` vertices, two triangles per
//! cell with consistent winding. Vertex data is a pure function of the parcel
//! coordinate and the height field, so a recycled pool slot regenerates the
//! exact same geometry the parcel had before.

use bytemuck::{Pod, Zeroable};

use crate::core::types::Vec3;
use crate::math::Aabb;
use crate::terrain::config::TerrainConfig;
use crate::terrain::heightfield::HeightField;
use crate::terrain::parcel::Parcel;

/// GPU-uploadable ground vertex
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GroundVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Triangle index list for a square grid of `verts_per_side^2` vertices.
///
/// Two triangles per cell, counter-clockwise seen from above (+Y).
pub fn grid_indices(verts_per_side: usize) -> Vec<u32> {
    let n = verts_per_side as u32;
    let cells = verts_per_side.saturating_sub(1);
    let mut indices = Vec::with_capacity(cells * cells * 6);
    for j in 0..cells as u32 {
        for i in 0..cells as u32 {
            let v00 = j * n + i;
            let v10 = v00 + 1;
            let v01 = v00 + n;
            let v11 = v01 + 1;
            indices.extend_from_slice(&[v00, v11, v10, v00, v01, v11]);
        }
    }
    indices
}

/// Owned vertex/index data for one collision parcel
pub struct GroundMesh {
    verts_per_side: usize,
    pub vertices: Vec<GroundVertex>,
    pub indices: Vec<u32>,
    pub bounds: Aabb,
}

impl GroundMesh {
    /// Allocate a zeroed mesh; call [`regenerate`] before use.
    ///
    /// [`regenerate`]: Self::regenerate
    pub fn new(verts_per_side: usize) -> Self {
        Self {
            verts_per_side,
            vertices: vec![GroundVertex::default(); verts_per_side * verts_per_side],
            indices: grid_indices(verts_per_side),
            bounds: Aabb::default(),
        }
    }

    /// Recompute vertex heights, normals and bounds for a parcel
    pub fn regenerate(&mut self, parcel: Parcel, config: &TerrainConfig, heights: &HeightField) {
        let n = self.verts_per_side;
        let min = parcel.world_min(config.parcel_size);
        let spacing = config.parcel_size / (n - 1) as f32;

        let mut bounds = Aabb::new(
            Vec3::new(min.x, f32::INFINITY, min.y),
            Vec3::new(min.x + config.parcel_size, f32::NEG_INFINITY, min.y + config.parcel_size),
        );
        for j in 0..n {
            for i in 0..n {
                let x = min.x + i as f32 * spacing;
                let z = min.y + j as f32 * spacing;
                let y = heights.height_at(x, z);
                let normal = heights.normal_at(x, z);
                self.vertices[j * n + i] = GroundVertex {
                    position: [x, y, z],
                    normal: normal.to_array(),
                };
                bounds.min.y = bounds.min.y.min(y);
                bounds.max.y = bounds.max.y.max(y);
            }
        }
        self.bounds = bounds;
    }
}
