//! Height field: fractal noise blended with the occupancy mask
//!
//! Parcels under or adjacent to occupied land must be flat, with a smooth
//! falloff so ground meshes of neighboring parcels never crack at the seam.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::core::types::Vec3;
use super::config::TerrainConfig;
use super::occupancy::OccupancyMask;

/// Occupancy below which noise height still shows through (blended)
const FLAT_THRESHOLD: f32 = 0.25;

/// Deterministic world `(x, z) -> height / normal` function.
///
/// Owns its snapshot of the occupancy mask; shared read-only across parallel
/// scatter and vertex-generation tasks.
pub struct HeightField {
    noise: Fbm<Perlin>,
    occupancy: OccupancyMask,
    parcel_size: f32,
    max_height: f32,
    noise_scale: f32,
}

impl HeightField {
    pub fn new(config: &TerrainConfig) -> Self {
        let noise = Fbm::<Perlin>::new(config.seed)
            .set_octaves(4)
            .set_persistence(0.5)
            .set_lacunarity(2.0);

        Self {
            noise,
            occupancy: config.occupancy.clone(),
            parcel_size: config.parcel_size,
            max_height: config.max_height,
            noise_scale: config.noise_scale,
        }
    }

    /// Raw noise height in `[0, max_height]`, before occupancy blending
    pub fn raw_height_at(&self, x: f32, z: f32) -> f32 {
        let nx = (x / self.noise_scale) as f64;
        let nz = (z / self.noise_scale) as f64;

        // Noise is in [-1, 1]; map to [0, max_height]
        let normalized = (self.noise.get([nx, nz]) + 1.0) / 2.0;
        (normalized * self.max_height as f64) as f32
    }

    /// Terrain height at a world position.
    ///
    /// Fully free ground keeps the raw noise height; occupancy at or above
    /// the flat threshold forces exactly zero; in between, the height blends
    /// linearly toward zero. The blend factor `occupancy * 4` reaches 1 at
    /// the threshold, so both branches agree there.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let occupancy = self.occupancy.sample_bilinear(x, z, self.parcel_size);
        if occupancy >= FLAT_THRESHOLD {
            return 0.0;
        }
        let raw = self.raw_height_at(x, z);
        raw + (0.0 - raw) * (occupancy * 4.0)
    }

    /// Surface normal via central differences of the blended height
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let eps = 0.5;
        let dh_dx = (self.height_at(x + eps, z) - self.height_at(x - eps, z)) / (2.0 * eps);
        let dh_dz = (self.height_at(x, z + eps) - self.height_at(x, z - eps)) / (2.0 * eps);
        Vec3::new(-dh_dx, 1.0, -dh_dz).normalize()
    }
}
