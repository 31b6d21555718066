use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use cubit_blocks::BlockRegistry;
use cubit_chunk::{ChunkCoord, RENDER_CUBE, SY};
use cubit_gen::{TerrainGen, WorldGenConfig};
use cubit_mesh_cpu::{MeshBuilder, MeshOptions};

fn bench_build_cube(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_region");
    let reg = BlockRegistry::builtin().unwrap();
    let tg = TerrainGen::new(&WorldGenConfig::default(), &reg).unwrap();
    let chunk = tg.generate(&reg, ChunkCoord::new(0, 0, 0));
    let cube = RENDER_CUBE as i32;
    let surface = 64 - cube / 2;
    group.bench_function("surface_cube_smooth", |b| {
        let mb = MeshBuilder::new(&chunk, &reg, |x, z| tg.biome(x, z), MeshOptions::default());
        b.iter(|| {
            let out = mb.build_region((0, surface, 0), (cube, surface + cube, cube));
            black_box(out);
        })
    });
    group.bench_function("full_column_flat", |b| {
        let opts = MeshOptions {
            smooth_lighting: false,
            ..MeshOptions::default()
        };
        let mb = MeshBuilder::new(&chunk, &reg, |x, z| tg.biome(x, z), opts);
        b.iter(|| {
            let out = mb.build_region((0, 0, 0), (cube, SY as i32, cube));
            black_box(out);
        })
    });
    group.finish();
}

fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3))
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_build_cube
}
criterion_main!(benches);
