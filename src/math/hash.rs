//! Deterministic integer hashing and per-cell random streams
//!
//! Scattering must be reproducible across processes and platforms, so all
//! randomness derives from integer bit mixing. No floating point enters the
//! state transitions.

/// lowbias32 integer finalizer.
///
/// Full-avalanche 32-bit hash: every output bit is a nonlinear function of
/// every input bit. Constants from the public lowbias32 search.
#[inline]
pub fn lowbias32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846ca68b);
    x ^= x >> 16;
    x
}

/// Deterministic pseudo-random stream for one grid cell.
///
/// Seeded by `lowbias32(y * grid_width + x + seed)`; successive draws hash a
/// Weyl sequence advanced from the seed. Identical `(x, y, grid_width, seed)`
/// yield byte-identical sequences everywhere.
#[derive(Clone, Debug)]
pub struct ParcelRng {
    state: u32,
}

/// Weyl increment (2^32 / phi), coprime with 2^32
const WEYL_STEP: u32 = 0x9e3779b9;

impl ParcelRng {
    /// Stream seeded directly from a 32-bit value
    pub fn from_seed(seed: u32) -> Self {
        Self { state: lowbias32(seed) }
    }

    /// Stream for cell `(x, y)` of a grid `grid_width` cells wide
    pub fn for_cell(x: i32, y: i32, grid_width: i32, seed: u32) -> Self {
        let index = y.wrapping_mul(grid_width).wrapping_add(x);
        Self::from_seed((index as u32).wrapping_add(seed))
    }

    /// Next pseudo-random u32
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(WEYL_STEP);
        lowbias32(self.state)
    }

    /// Next pseudo-random f32 in `[0, 1)`
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        // 24 mantissa bits; never reaches 1.0
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Uniform f32 in `[min, max)`
    #[inline]
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Uniform index in `[0, len)`; `len` must be nonzero
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        // Multiply-shift range reduction, bias-free enough for scattering
        ((self.next_u32() as u64 * len as u64) >> 32) as usize
    }
}
