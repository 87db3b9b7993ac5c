use criterion::{criterion_group, criterion_main, Criterion, black_box};

use parcelterra::collision::mesh::GroundMesh;
use parcelterra::math::frustum::ClipVolume;
use parcelterra::math::hash::{lowbias32, ParcelRng};
use parcelterra::scatter::render_list::RenderList;
use parcelterra::scatter::scatterer::Scatterer;
use parcelterra::terrain::config::{DetailPrototype, TerrainConfig, TreeLod, TreePrototype};
use parcelterra::terrain::heightfield::HeightField;
use parcelterra::terrain::occupancy::OccupancyMask;
use parcelterra::terrain::parcel::{Parcel, ParcelRect};

use glam::{IVec2, Mat4, Vec3};

fn bench_config() -> TerrainConfig {
    let bounds = ParcelRect::new(IVec2::new(0, 0), IVec2::new(64, 64));
    TerrainConfig {
        parcel_size: 16.0,
        bounds,
        max_height: 40.0,
        noise_scale: 100.0,
        seed: 7,
        trees_per_parcel: 0.6,
        tree_prototypes: vec![TreePrototype {
            local_size: 10.0,
            lods: vec![
                TreeLod { min_screen_size: 0.2 },
                TreeLod { min_screen_size: 0.02 },
            ],
        }],
        detail_prototypes: vec![DetailPrototype {
            density: 8,
            min_scale_xz: 0.8,
            max_scale_xz: 1.2,
            min_scale_y: 0.7,
            max_scale_y: 1.4,
        }],
        detail_distance: 256.0,
        collision_radius: 3,
        occupancy: OccupancyMask::unoccupied(bounds),
    }
}

fn overhead_camera(position: Vec3) -> Mat4 {
    let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 2000.0);
    let view = Mat4::look_at_rh(position, position + Vec3::new(0.0, -1.0, 0.01), Vec3::Y);
    projection * view
}

fn bench_lowbias32(c: &mut Criterion) {
    c.bench_function("hash_lowbias32", |b| {
        let mut x = 0u32;
        b.iter(|| {
            x = x.wrapping_add(1);
            black_box(lowbias32(black_box(x)))
        });
    });
}

fn bench_parcel_rng_stream(c: &mut Criterion) {
    c.bench_function("parcel_rng_1024_draws", |b| {
        b.iter(|| {
            let mut rng = ParcelRng::for_cell(black_box(13), black_box(7), 64, 7);
            let mut sum = 0.0f32;
            for _ in 0..1024 {
                sum += rng.next_f32();
            }
            black_box(sum)
        });
    });
}

fn bench_height_sampling(c: &mut Criterion) {
    let config = bench_config();
    let heights = HeightField::new(&config);

    c.bench_function("height_at_grid_64x64", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for j in 0..64 {
                for i in 0..64 {
                    sum += heights.height_at(black_box(i as f32 * 3.7), black_box(j as f32 * 3.7));
                }
            }
            black_box(sum)
        });
    });
}

fn bench_scatter_frame(c: &mut Criterion) {
    let config = bench_config();
    let heights = HeightField::new(&config);
    let camera_pos = Vec3::new(512.0, 120.0, 512.0);
    let clip = ClipVolume::from_view_projection(&overhead_camera(camera_pos));
    let mut scatterer = Scatterer::new(16_384, 1 << 20);

    c.bench_function("scatter_full_frame_64x64", |b| {
        b.iter(|| {
            let stats = scatterer.scatter(
                black_box(&config),
                &heights,
                &clip,
                camera_pos,
                config.bounds,
            );
            black_box(stats)
        });
    });
}

fn bench_render_list_build(c: &mut Criterion) {
    let config = bench_config();
    let heights = HeightField::new(&config);
    let camera_pos = Vec3::new(512.0, 120.0, 512.0);
    let clip = ClipVolume::from_view_projection(&overhead_camera(camera_pos));
    let mut scatterer = Scatterer::new(16_384, 1 << 20);
    scatterer.scatter(&config, &heights, &clip, camera_pos, config.bounds);
    let (trees, details) = scatterer.instances();
    let trees = trees.to_vec();
    let details = details.to_vec();
    let mut list = RenderList::new();

    c.bench_function("render_list_build", |b| {
        b.iter(|| {
            list.build(black_box(&config), &trees, &details);
            black_box(list.batches().len())
        });
    });
}

fn bench_ground_mesh_regenerate(c: &mut Criterion) {
    let config = bench_config();
    let heights = HeightField::new(&config);
    let mut mesh = GroundMesh::new(config.verts_per_side());

    c.bench_function("ground_mesh_regenerate_17x17", |b| {
        let mut i = 0i32;
        b.iter(|| {
            i = (i + 1) % 64;
            mesh.regenerate(black_box(Parcel::new(i, 32)), &config, &heights);
            black_box(mesh.bounds)
        });
    });
}

criterion_group!(
    benches,
    bench_lowbias32,
    bench_parcel_rng_stream,
    bench_height_sampling,
    bench_scatter_frame,
    bench_render_list_build,
    bench_ground_mesh_regenerate,
);
criterion_main!(benches);
