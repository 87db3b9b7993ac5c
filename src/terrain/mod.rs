//! Terrain data model: parcels, configuration, occupancy, height field

pub mod config;
pub mod heightfield;
pub mod occupancy;
pub mod parcel;

pub use config::{DetailPrototype, TerrainConfig, TreeLod, TreePrototype};
pub use heightfield::HeightField;
pub use occupancy::OccupancyMask;
pub use parcel::{Parcel, ParcelRect};
