//! Collision parcel streaming around the camera
//!
//! Maintains a bounded pool of physical parcels (ground mesh + collider).
//! Slots are Free or Used; a slot leaving the camera's used rect becomes Free
//! with its content intact, so walking back over it costs nothing. Newly
//! demanded parcels repurpose the last freed slot and regenerate in one
//! batched pass per update.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::core::types::Vec3;
use crate::math::Aabb;
use crate::math::hash::ParcelRng;
use crate::pool::ObjectPool;
use crate::scatter::scatterer::place_tree;
use crate::terrain::config::TerrainConfig;
use crate::terrain::heightfield::HeightField;
use crate::terrain::parcel::{Parcel, ParcelRect};
use super::mesh::{GroundMesh, GroundVertex};

/// Opaque physics mesh handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub u64);

/// Opaque physics collider handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColliderId(pub u64);

/// External physics backend.
///
/// The streamer drives it in a fixed order per update: upload all dirty
/// vertex buffers, bake all dirty meshes, then (re)assign baked meshes to
/// colliders. Assignment must come after baking so the collider revalidates
/// against finished data.
pub trait PhysicsBackend {
    fn create_mesh(&mut self) -> MeshId;
    fn create_collider(&mut self) -> ColliderId;
    fn upload_vertices(
        &mut self,
        mesh: MeshId,
        vertices: &[GroundVertex],
        indices: &[u32],
        bounds: Aabb,
    );
    fn bake_mesh(&mut self, mesh: MeshId);
    fn assign_mesh(&mut self, collider: ColliderId, mesh: MeshId);
    fn destroy_mesh(&mut self, mesh: MeshId);
    fn destroy_collider(&mut self, collider: ColliderId);
}

/// The one collision-relevant tree of a parcel, bound to a pooled visual
pub struct TreeAttachment<V> {
    pub visual: V,
    pub prototype: usize,
    pub position: Vec3,
    /// Yaw in radians
    pub rotation_y: f32,
}

/// One pool slot: a reusable physical parcel.
///
/// Created once; its `parcel` binding mutates on reuse and the geometry
/// regenerates. Destroyed only when the streamer is disposed.
pub struct ParcelSlot<V> {
    pub parcel: Parcel,
    pub mesh: GroundMesh,
    pub mesh_id: MeshId,
    pub collider: ColliderId,
    pub tree: Option<TreeAttachment<V>>,
    /// Content matches `parcel` (false until first regeneration)
    generated: bool,
    dirty: bool,
}

/// Counters for one streamer update
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub freed: usize,
    pub reused_in_place: usize,
    pub repurposed: usize,
    pub allocated: usize,
    pub regenerated: usize,
}

/// Streams collision parcels around the camera from a bounded slot pool.
///
/// `V` is the host's opaque visual handle for tree objects, acquired from and
/// released to an internal object pool as slots recycle.
pub struct CollisionStreamer<V> {
    slots: Vec<ParcelSlot<V>>,
    /// Parcel -> slot index, for every Used slot
    used: HashMap<Parcel, usize>,
    /// Indices of Free slots, most recently freed last
    free: Vec<usize>,
    visuals: ObjectPool<V>,
    use_radius: i32,
    verts_per_side: usize,
}

impl<V> CollisionStreamer<V> {
    pub fn new(config: &TerrainConfig, tree_visual: impl FnMut() -> V + Send + 'static) -> Self {
        Self {
            slots: Vec::new(),
            used: HashMap::new(),
            free: Vec::new(),
            visuals: ObjectPool::new(tree_visual),
            use_radius: config.collision_radius,
            verts_per_side: config.verts_per_side(),
        }
    }

    /// Parcels that must have collision for this camera position
    pub fn used_rect(&self, camera_pos: Vec3, config: &TerrainConfig) -> ParcelRect {
        let center = Parcel::from_world(camera_pos.x, camera_pos.z, config.parcel_size);
        ParcelRect::centered(center, self.use_radius).intersect(&config.bounds)
    }

    /// Slots currently bound to a parcel in the used rect
    pub fn used_slots(&self) -> impl Iterator<Item = &ParcelSlot<V>> {
        self.used.values().map(|&index| &self.slots[index])
    }

    /// Parcels of Free slots that still hold valid cached content
    pub fn free_parcels(&self) -> impl Iterator<Item = Parcel> + '_ {
        self.free
            .iter()
            .filter(|&&index| self.slots[index].generated)
            .map(|&index| self.slots[index].parcel)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Destroy all backend resources and release pooled visuals
    pub fn dispose(&mut self, physics: &mut dyn PhysicsBackend) {
        for mut slot in self.slots.drain(..) {
            if let Some(tree) = slot.tree.take() {
                self.visuals.release(tree.visual);
            }
            physics.destroy_mesh(slot.mesh_id);
            physics.destroy_collider(slot.collider);
        }
        self.used.clear();
        self.free.clear();
    }
}

// Parallel mesh regeneration needs the slots (and so the visual handles)
// to cross threads; everything else works with single-threaded visuals.
impl<V: Send> CollisionStreamer<V> {
    /// Sync the pool to the camera: free departed parcels, bind demanded
    /// ones, regenerate all dirty slots in one batched pass.
    pub fn update(
        &mut self,
        camera_pos: Vec3,
        config: &TerrainConfig,
        heights: &HeightField,
        physics: &mut dyn PhysicsBackend,
    ) -> StreamStats {
        let rect = self.used_rect(camera_pos, config);
        let mut stats = StreamStats::default();

        // Used -> Free for parcels that left the rect. Content stays valid
        // for a possible zero-cost rebind.
        let departed: Vec<Parcel> = self
            .used
            .keys()
            .copied()
            .filter(|parcel| !rect.contains(*parcel))
            .collect();
        for parcel in departed {
            if let Some(index) = self.used.remove(&parcel) {
                self.free.push(index);
                stats.freed += 1;
            }
        }

        // Free -> Used for newly demanded parcels
        for parcel in rect.iter() {
            if self.used.contains_key(&parcel) {
                continue;
            }
            let index = if let Some(at) = self
                .free
                .iter()
                .position(|&i| self.slots[i].generated && self.slots[i].parcel == parcel)
            {
                // Same parcel still cached: rebind without regeneration
                stats.reused_in_place += 1;
                self.free.swap_remove(at)
            } else if let Some(index) = self.free.pop() {
                let slot = &mut self.slots[index];
                if let Some(tree) = slot.tree.take() {
                    self.visuals.release(tree.visual);
                }
                slot.parcel = parcel;
                slot.generated = false;
                slot.dirty = true;
                stats.repurposed += 1;
                index
            } else {
                self.slots.push(ParcelSlot {
                    parcel,
                    mesh: GroundMesh::new(self.verts_per_side),
                    mesh_id: physics.create_mesh(),
                    collider: physics.create_collider(),
                    tree: None,
                    generated: false,
                    dirty: true,
                });
                stats.allocated += 1;
                self.slots.len() - 1
            };
            self.used.insert(parcel, index);
        }

        // Batched regeneration. Vertex heights are independent per parcel;
        // the backend phases run in upload -> bake -> assign order.
        self.slots
            .par_iter_mut()
            .filter(|slot| slot.dirty)
            .for_each(|slot| slot.mesh.regenerate(slot.parcel, config, heights));

        for slot in self.slots.iter().filter(|slot| slot.dirty) {
            physics.upload_vertices(
                slot.mesh_id,
                &slot.mesh.vertices,
                &slot.mesh.indices,
                slot.mesh.bounds,
            );
        }
        for slot in self.slots.iter().filter(|slot| slot.dirty) {
            physics.bake_mesh(slot.mesh_id);
        }
        for slot in self.slots.iter().filter(|slot| slot.dirty) {
            physics.assign_mesh(slot.collider, slot.mesh_id);
        }

        let visuals = &mut self.visuals;
        for slot in self.slots.iter_mut().filter(|slot| slot.dirty) {
            debug_assert!(slot.tree.is_none());
            if !config.occupancy.is_occupied(slot.parcel) {
                let mut rng = ParcelRng::for_cell(
                    slot.parcel.x,
                    slot.parcel.y,
                    config.bounds.width(),
                    config.seed,
                );
                slot.tree = place_tree(config, heights, slot.parcel, &mut rng).map(|placement| {
                    TreeAttachment {
                        visual: visuals.get(),
                        prototype: placement.prototype,
                        position: placement.position,
                        rotation_y: placement.rotation_y,
                    }
                });
            }
            slot.dirty = false;
            slot.generated = true;
            stats.regenerated += 1;
        }

        log::debug!(
            "collision update: {} used, {} free, {} regenerated",
            self.used.len(),
            self.free.len(),
            stats.regenerated,
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::IVec2;
    use crate::terrain::config::test_config;
    use std::collections::HashSet;

    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Op {
        Upload(u64),
        Bake(u64),
        Assign(u64, u64),
    }

    #[derive(Default)]
    struct MockPhysics {
        next_id: u64,
        ops: Vec<Op>,
        live_meshes: usize,
        live_colliders: usize,
    }

    impl PhysicsBackend for MockPhysics {
        fn create_mesh(&mut self) -> MeshId {
            self.next_id += 1;
            self.live_meshes += 1;
            MeshId(self.next_id)
        }
        fn create_collider(&mut self) -> ColliderId {
            self.next_id += 1;
            self.live_colliders += 1;
            ColliderId(self.next_id)
        }
        fn upload_vertices(
            &mut self,
            mesh: MeshId,
            vertices: &[GroundVertex],
            indices: &[u32],
            _bounds: Aabb,
        ) {
            assert!(!vertices.is_empty());
            assert!(!indices.is_empty());
            self.ops.push(Op::Upload(mesh.0));
        }
        fn bake_mesh(&mut self, mesh: MeshId) {
            self.ops.push(Op::Bake(mesh.0));
        }
        fn assign_mesh(&mut self, collider: ColliderId, mesh: MeshId) {
            self.ops.push(Op::Assign(collider.0, mesh.0));
        }
        fn destroy_mesh(&mut self, _mesh: MeshId) {
            self.live_meshes -= 1;
        }
        fn destroy_collider(&mut self, _collider: ColliderId) {
            self.live_colliders -= 1;
        }
    }

    fn setup() -> (TerrainConfig, HeightField) {
        let mut config =
            test_config(ParcelRect::new(IVec2::new(0, 0), IVec2::new(20, 20)));
        config.trees_per_parcel = 1.0;
        let heights = HeightField::new(&config);
        (config, heights)
    }

    fn assert_invariants<V>(streamer: &CollisionStreamer<V>, rect: ParcelRect) {
        let used: HashSet<Parcel> = streamer.used_slots().map(|slot| slot.parcel).collect();
        assert_eq!(used.len(), rect.area(), "every rect parcel has one slot");
        for parcel in rect.iter() {
            assert!(used.contains(&parcel), "missing slot for {parcel:?}");
        }
        let free: HashSet<Parcel> = streamer.free_parcels().collect();
        assert!(used.is_disjoint(&free), "used and free parcels overlap");
    }

    #[test]
    fn test_initial_update_fills_used_rect() {
        let (config, heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer = CollisionStreamer::new(&config, || ());

        let camera = Vec3::new(10.0 * 16.0, 5.0, 10.0 * 16.0);
        let stats = streamer.update(camera, &config, &heights, &mut physics);
        let rect = streamer.used_rect(camera, &config);

        assert_eq!(rect.area(), 25);
        assert_eq!(stats.allocated, 25);
        assert_eq!(stats.regenerated, 25);
        assert_invariants(&streamer, rect);
    }

    #[test]
    fn test_stationary_camera_regenerates_nothing() {
        let (config, heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer = CollisionStreamer::new(&config, || ());

        let camera = Vec3::new(10.0 * 16.0, 5.0, 10.0 * 16.0);
        streamer.update(camera, &config, &heights, &mut physics);
        physics.ops.clear();

        let stats = streamer.update(camera, &config, &heights, &mut physics);
        assert_eq!(stats, StreamStats::default());
        assert!(physics.ops.is_empty());
    }

    #[test]
    fn test_moving_camera_recycles_slots() {
        let (config, heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer = CollisionStreamer::new(&config, || ());

        let camera = Vec3::new(10.0 * 16.0, 5.0, 10.0 * 16.0);
        streamer.update(camera, &config, &heights, &mut physics);
        assert_eq!(streamer.slot_count(), 25);

        // One parcel east: one column leaves, one enters
        let camera = Vec3::new(11.0 * 16.0, 5.0, 10.0 * 16.0);
        let stats = streamer.update(camera, &config, &heights, &mut physics);
        assert_eq!(stats.freed, 5);
        assert_eq!(stats.repurposed, 5);
        assert_eq!(stats.allocated, 0, "pool must recycle, not grow");
        assert_eq!(streamer.slot_count(), 25);
        assert_invariants(&streamer, streamer.used_rect(camera, &config));
    }

    #[test]
    fn test_return_trip_rebinds_without_regeneration() {
        let (config, heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer = CollisionStreamer::new(&config, || ());

        // Home rect is fully in bounds (25 parcels); at the corner the rect
        // clamps to 9, freeing 16 slots that keep their cached parcels.
        let home = Vec3::new(2.5 * 16.0, 5.0, 2.5 * 16.0);
        streamer.update(home, &config, &heights, &mut physics);
        let corner = Vec3::new(0.5 * 16.0, 5.0, 0.5 * 16.0);
        let stats = streamer.update(corner, &config, &heights, &mut physics);
        assert_eq!(stats.freed, 16);
        assert_eq!(stats.regenerated, 0);

        physics.ops.clear();
        let stats = streamer.update(home, &config, &heights, &mut physics);
        // Every re-entered parcel is still cached in a freed slot
        assert_eq!(stats.reused_in_place, 16);
        assert_eq!(stats.regenerated, 0);
        assert!(physics.ops.is_empty());
        assert_invariants(&streamer, streamer.used_rect(home, &config));
    }

    #[test]
    fn test_regeneration_phases_are_ordered() {
        let (config, heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer = CollisionStreamer::new(&config, || ());

        streamer.update(
            Vec3::new(10.0 * 16.0, 5.0, 10.0 * 16.0),
            &config,
            &heights,
            &mut physics,
        );

        let phase = |op: &Op| match op {
            Op::Upload(_) => 0,
            Op::Bake(_) => 1,
            Op::Assign(_, _) => 2,
        };
        let phases: Vec<i32> = physics.ops.iter().map(phase).collect();
        let mut sorted = phases.clone();
        sorted.sort_unstable();
        assert_eq!(phases, sorted, "uploads, then bakes, then assigns");
        assert_eq!(phases.iter().filter(|&&p| p == 0).count(), 25);
        assert_eq!(phases.iter().filter(|&&p| p == 2).count(), 25);
    }

    #[test]
    fn test_trees_match_scatter_placement() {
        let (config, heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer = CollisionStreamer::new(&config, || ());

        let camera = Vec3::new(10.0 * 16.0, 5.0, 10.0 * 16.0);
        streamer.update(camera, &config, &heights, &mut physics);

        for slot in streamer.used_slots() {
            let mut rng = ParcelRng::for_cell(
                slot.parcel.x,
                slot.parcel.y,
                config.bounds.width(),
                config.seed,
            );
            let expected = place_tree(&config, &heights, slot.parcel, &mut rng)
                .expect("density 1.0 always places a tree");
            let tree = slot.tree.as_ref().expect("slot should carry a tree");
            assert_eq!(tree.position, expected.position);
            assert_eq!(tree.prototype, expected.prototype);
        }
    }

    #[test]
    fn test_tree_visuals_return_to_pool_on_recycle() {
        let (config, heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer = CollisionStreamer::new(&config, || ());

        let camera = Vec3::new(10.0 * 16.0, 5.0, 10.0 * 16.0);
        streamer.update(camera, &config, &heights, &mut physics);
        let allocated = streamer.visuals.allocated_count();
        assert_eq!(allocated, 25);

        // Sweep the camera across the map; recycled slots must reuse visuals
        for step in 0..6 {
            let camera = Vec3::new((10.0 + step as f32) * 16.0, 5.0, 10.0 * 16.0);
            streamer.update(camera, &config, &heights, &mut physics);
        }
        assert_eq!(streamer.visuals.allocated_count(), allocated);
    }

    #[test]
    fn test_used_rect_clamps_to_bounds() {
        let (config, heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer = CollisionStreamer::new(&config, || ());

        // Camera at the map corner: rect is cut to in-bounds parcels
        let camera = Vec3::new(0.5 * 16.0, 5.0, 0.5 * 16.0);
        let rect = streamer.used_rect(camera, &config);
        assert_eq!(rect.area(), 9);

        streamer.update(camera, &config, &heights, &mut physics);
        assert_invariants(&streamer, rect);
    }

    #[test]
    fn test_queries_work_with_single_threaded_visuals() {
        // Rc is not Send; construction, queries and dispose must still work
        let (config, _heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer: CollisionStreamer<std::rc::Rc<u32>> =
            CollisionStreamer::new(&config, || std::rc::Rc::new(7));

        assert_eq!(streamer.slot_count(), 0);
        assert_eq!(streamer.used_slots().count(), 0);
        assert_eq!(streamer.free_parcels().count(), 0);
        let rect = streamer.used_rect(Vec3::new(8.0, 0.0, 8.0), &config);
        assert_eq!(rect.area(), 9);
        streamer.dispose(&mut physics);
    }

    #[test]
    fn test_dispose_destroys_everything() {
        let (config, heights) = setup();
        let mut physics = MockPhysics::default();
        let mut streamer = CollisionStreamer::new(&config, || ());

        streamer.update(
            Vec3::new(10.0 * 16.0, 5.0, 10.0 * 16.0),
            &config,
            &heights,
            &mut physics,
        );
        streamer.dispose(&mut physics);
        assert_eq!(physics.live_meshes, 0);
        assert_eq!(physics.live_colliders, 0);
        assert_eq!(streamer.slot_count(), 0);
    }
}
