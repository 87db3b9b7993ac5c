//! Sparse occupancy mask over parcels
//!
//! Marks parcels blocked/free for procedural content. The byte grid carries a
//! 1-texel border so that bilinear height sampling sees out-of-range parcels
//! as fully occupied, keeping terrain flat at the authored map edge.

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use super::parcel::{Parcel, ParcelRect};

/// Byte grid over parcels with a 1-cell occupied border.
///
/// A parcel outside `bounds` is occupied by definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OccupancyMask {
    bounds: ParcelRect,
    /// `(width + 2) * (height + 2)` bytes, row-major, border included.
    /// Any nonzero byte means occupied.
    grid: Vec<u8>,
}

impl OccupancyMask {
    /// Wrap an authored byte grid. The grid must include the 1-texel border
    /// and the border texels are expected to be occupied.
    pub fn new(bounds: ParcelRect, grid: Vec<u8>) -> Result<Self> {
        let expected = (bounds.width() as usize + 2) * (bounds.height() as usize + 2);
        if grid.len() != expected {
            return Err(Error::Config(format!(
                "occupancy grid is {} bytes, bounds {}x{} require {}",
                grid.len(),
                bounds.width(),
                bounds.height(),
                expected
            )));
        }
        Ok(Self { bounds, grid })
    }

    /// Mask with all in-bounds parcels free and the border occupied
    pub fn unoccupied(bounds: ParcelRect) -> Self {
        let w = bounds.width() as usize + 2;
        let h = bounds.height() as usize + 2;
        let mut grid = vec![0u8; w * h];
        for x in 0..w {
            grid[x] = 1;
            grid[(h - 1) * w + x] = 1;
        }
        for y in 0..h {
            grid[y * w] = 1;
            grid[y * w + w - 1] = 1;
        }
        Self { bounds, grid }
    }

    pub fn bounds(&self) -> ParcelRect {
        self.bounds
    }

    /// Bordered grid width in texels
    fn grid_width(&self) -> usize {
        self.bounds.width() as usize + 2
    }

    /// Bordered grid height in texels
    fn grid_height(&self) -> usize {
        self.bounds.height() as usize + 2
    }

    fn texel(&self, gx: usize, gy: usize) -> f32 {
        if self.grid[gy * self.grid_width() + gx] != 0 { 1.0 } else { 0.0 }
    }

    /// Mark an in-bounds parcel occupied or free; out-of-bounds is ignored
    pub fn set_occupied(&mut self, parcel: Parcel, occupied: bool) {
        if !self.bounds.contains(parcel) {
            return;
        }
        let gx = (parcel.x - self.bounds.min.x + 1) as usize;
        let gy = (parcel.y - self.bounds.min.y + 1) as usize;
        let w = self.grid_width();
        self.grid[gy * w + gx] = occupied as u8;
    }

    /// Whether a parcel is blocked for procedural content.
    ///
    /// Parcels outside `bounds` are occupied by definition.
    pub fn is_occupied(&self, parcel: Parcel) -> bool {
        if !self.bounds.contains(parcel) {
            return true;
        }
        let gx = (parcel.x - self.bounds.min.x + 1) as usize;
        let gy = (parcel.y - self.bounds.min.y + 1) as usize;
        self.grid[gy * self.grid_width() + gx] != 0
    }

    /// Bilinear occupancy at a world XZ position, in `[0, 1]`.
    ///
    /// Samples texel centers of the bordered grid; texel indices clamp to the
    /// grid (no wraparound), so positions beyond the border read fully
    /// occupied.
    pub fn sample_bilinear(&self, x: f32, z: f32, parcel_size: f32) -> f32 {
        // Continuous texel coordinates: texel (1, 1) covers bounds.min
        let gx = x / parcel_size - self.bounds.min.x as f32 + 1.0 - 0.5;
        let gz = z / parcel_size - self.bounds.min.y as f32 + 1.0 - 0.5;

        let x0 = gx.floor();
        let z0 = gz.floor();
        let fx = gx - x0;
        let fz = gz - z0;

        let max_x = self.grid_width() as i64 - 1;
        let max_z = self.grid_height() as i64 - 1;
        let ix0 = (x0 as i64).clamp(0, max_x) as usize;
        let ix1 = (x0 as i64 + 1).clamp(0, max_x) as usize;
        let iz0 = (z0 as i64).clamp(0, max_z) as usize;
        let iz1 = (z0 as i64 + 1).clamp(0, max_z) as usize;

        let v00 = self.texel(ix0, iz0);
        let v10 = self.texel(ix1, iz0);
        let v01 = self.texel(ix0, iz1);
        let v11 = self.texel(ix1, iz1);

        let a = v00 + (v10 - v00) * fx;
        let b = v01 + (v11 - v01) * fx;
        a + (b - a) * fz
    }
}
