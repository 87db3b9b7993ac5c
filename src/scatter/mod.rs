//! Procedural object scattering and render-list building

pub mod append;
pub mod instance;
pub mod render_list;
pub mod scatterer;

pub use append::AppendBuffer;
pub use instance::{DetailInstance, TreeInstance};
pub use render_list::{DrawBatch, RenderList};
pub use scatterer::{place_tree, select_lod, ScatterStats, Scatterer, TreePlacement};
