//! Collision mesh generation and streaming

pub mod mesh;
pub mod streamer;

pub use mesh::{grid_indices, GroundMesh, GroundVertex};
pub use streamer::{
    ColliderId, CollisionStreamer, MeshId, ParcelSlot, PhysicsBackend, StreamStats,
    TreeAttachment,
};
