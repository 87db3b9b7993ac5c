//! Math primitives: AABB, clip volume, deterministic hashing

pub mod aabb;
pub mod frustum;
pub mod hash;

pub use aabb::Aabb;
pub use frustum::ClipVolume;
pub use hash::{lowbias32, ParcelRng};
