//! Per-frame terrain rendering driver
//!
//! Orchestrates one update: clip volume from the camera, parcel visibility,
//! parallel scatter, render-list build, then one instanced draw per bucket
//! through the host's render backend. Draw submission itself is external.

use crate::core::error::Error;
use crate::core::types::{IVec2, Mat4, Result, Vec3};
use crate::math::frustum::{frustum_world_rect, ClipVolume};
use crate::math::Aabb;
use crate::scatter::render_list::RenderList;
use crate::scatter::scatterer::{ScatterStats, Scatterer};
use crate::terrain::config::TerrainConfig;
use crate::terrain::heightfield::HeightField;
use crate::terrain::parcel::{Parcel, ParcelRect};

/// Camera state supplied by the host once per update
#[derive(Clone, Copy, Debug)]
pub struct CameraInput {
    pub projection: Mat4,
    /// World-to-camera matrix
    pub view: Mat4,
    pub position: Vec3,
}

/// External render backend: one instanced draw per mesh bucket.
///
/// The core decides which instances and batches exist; how they are drawn
/// (materials, shader parameters) is entirely the backend's concern.
pub trait RenderBackend {
    fn draw_instanced(&mut self, mesh_index: u32, transforms: &[Mat4], bounds: Aabb);
}

/// Counters for one rendered frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub scatter: ScatterStats,
    pub draw_calls: usize,
    /// Instances truncated by full buffers this frame
    pub dropped_instances: usize,
}

/// Streams visible terrain around the camera, frame by frame.
///
/// Construction validates the config and fails fast; per-frame errors
/// degrade to an empty frame instead of panicking. All scratch state is
/// owned here, never global.
pub struct TerrainRenderer {
    config: TerrainConfig,
    heights: HeightField,
    scatterer: Scatterer,
    render_list: RenderList,
}

/// Initial instance-buffer capacities; they grow on overflow
const INITIAL_TREE_CAPACITY: usize = 4096;
const INITIAL_DETAIL_CAPACITY: usize = 65_536;

impl TerrainRenderer {
    pub fn new(config: TerrainConfig) -> Result<Self> {
        config.validate()?;
        let heights = HeightField::new(&config);
        Ok(Self {
            config,
            heights,
            scatterer: Scatterer::new(INITIAL_TREE_CAPACITY, INITIAL_DETAIL_CAPACITY),
            render_list: RenderList::new(),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(TerrainConfig::from_json_str(json)?)
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn height_field(&self) -> &HeightField {
        &self.heights
    }

    /// Parcels to consider this frame: frustum footprint ∩ terrain bounds
    pub fn clip_rect(&self, camera: &CameraInput) -> Result<ParcelRect> {
        let vp = camera.projection * camera.view;
        let (min, max) = frustum_world_rect(&vp, camera.position)
            .ok_or_else(|| Error::Config("degenerate view-projection matrix".into()))?;
        let lo = Parcel::from_world(min.x, min.y, self.config.parcel_size);
        let hi = Parcel::from_world(max.x, max.y, self.config.parcel_size);
        let rect = ParcelRect::new(
            IVec2::new(lo.x, lo.y),
            IVec2::new(hi.x + 1, hi.y + 1),
        );
        Ok(rect.intersect(&self.config.bounds))
    }

    /// Render one frame: scatter visible parcels and submit instanced draws.
    ///
    /// A degenerate camera yields an empty frame (logged, not fatal).
    pub fn render(&mut self, camera: &CameraInput, backend: &mut dyn RenderBackend) -> FrameStats {
        let clip_rect = match self.clip_rect(camera) {
            Ok(rect) => rect,
            Err(err) => {
                log::warn!("skipping terrain frame: {err}");
                return FrameStats::default();
            }
        };

        let vp = camera.projection * camera.view;
        let clip = ClipVolume::from_view_projection(&vp);
        let scatter = self.scatterer.scatter(
            &self.config,
            &self.heights,
            &clip,
            camera.position,
            clip_rect,
        );

        let (trees, details) = self.scatterer.instances();
        self.render_list.build(&self.config, trees, details);

        let mut draw_calls = 0;
        for batch in self.render_list.batches() {
            let start = batch.start_instance as usize;
            let end = start + batch.instance_count as usize;
            backend.draw_instanced(
                batch.mesh_index,
                &self.render_list.transforms()[start..end],
                batch.bounds,
            );
            draw_calls += 1;
        }

        let dropped_instances = self.scatterer.dropped();
        self.scatterer.grow_if_overflowed();

        let stats = FrameStats {
            scatter,
            draw_calls,
            dropped_instances,
        };
        log::debug!(
            "terrain frame: {} parcels, {} trees, {} details, {} draws",
            stats.scatter.parcels_considered,
            stats.scatter.trees,
            stats.scatter.details,
            stats.draw_calls,
        );
        stats
    }
}
