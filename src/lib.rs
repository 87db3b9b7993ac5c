//! Parcelterra - procedural parcel terrain generation, visibility and collision streaming

pub mod core;
pub mod math;
pub mod terrain;
pub mod pool;
pub mod scatter;
pub mod collision;
pub mod render;
