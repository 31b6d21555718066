use std::sync::Arc;

use cubit_blocks::{Block, BlockRegistry};
use cubit_chunk::{Channel, Chunk, ChunkCoord, SX, SY, SZ, Voxels};
use cubit_gen::{TerrainGen, WorldGenConfig};
use cubit_geom::{Face, Vec3};
use cubit_runtime::{GenRequest, GenResponse, Origin};
use cubit_world::{ChunkRef, World, WorldConfig};

const STONE: u8 = 1;
const SAPLING: u8 = 6;
const BEDROCK: u8 = 7;
const SAND: u8 = 12;
const FLOOR: i32 = 60;

fn reg() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::builtin().unwrap())
}

fn world_with(cfg: WorldConfig) -> World {
    World::new(cfg, reg(), &WorldGenConfig::default()).unwrap()
}

fn world() -> World {
    world_with(WorldConfig {
        mesh_budget_ms: 60_000,
        ..WorldConfig::default()
    })
}

/// Bedrock at y=0, stone up to `FLOOR`, open sky above.
fn flat(coord: ChunkCoord) -> Chunk {
    let mut c = Chunk::new(coord);
    for x in 0..SX {
        for z in 0..SZ {
            c.set_local(x, 0, z, Channel::Blocks, BEDROCK as i32);
            for y in 1..=FLOOR as usize {
                c.set_local(x, y, z, Channel::Blocks, STONE as i32);
            }
            for y in FLOOR as usize + 1..SY {
                c.set_local(x, y, z, Channel::SkyLight, 15);
            }
        }
    }
    c
}

/// Answers every outstanding generation request with `make`.
fn serve(w: &mut World, make: impl Fn(ChunkCoord) -> Chunk) -> usize {
    let mut served = 0;
    loop {
        let reqs = w.take_requests();
        if reqs.is_empty() {
            return served;
        }
        for r in reqs {
            if let GenRequest::Generate { coord, epoch } = r {
                let ok = w.accept(GenResponse {
                    coord,
                    epoch,
                    record: make(coord).to_record(),
                    origin: Origin::Generated,
                    t_ms: 0,
                });
                assert!(ok, "response for {coord} refused");
                served += 1;
            }
        }
    }
}

/// Loads the 3x3 block of flat chunks around the origin chunk.
fn flat_world() -> World {
    let mut w = world();
    for cx in -1..=1 {
        for cz in -1..=1 {
            let _ = w.get_chunk(cx * 16, 0, cz * 16);
        }
    }
    assert_eq!(serve(&mut w, flat), 9);
    w
}

fn sky(w: &World, x: i32, y: i32, z: i32) -> i32 {
    w.get(x, y, z, Channel::SkyLight)
}

#[test]
fn missing_chunk_is_requested_once_and_reads_defaults() {
    let mut w = world();
    assert!(matches!(w.get_chunk(5, 10, 5), ChunkRef::Pending));
    assert!(matches!(w.get_chunk(7, 90, 2), ChunkRef::Pending));
    let reqs = w.take_requests();
    assert_eq!(reqs.len(), 1);
    assert!(matches!(reqs[0], GenRequest::Generate { coord, .. } if coord == ChunkCoord::new(0, 0, 0)));
    assert_eq!(sky(&w, 5, 10, 5), 15);
    assert_eq!(w.block(5, 10, 5), 0);
    w.set_data(5, 10, 5, Channel::Blocks, STONE as i32);
    assert_eq!(w.block(5, 10, 5), 0);
    assert!(!w.is_loaded(5, 10, 5));
}

#[test]
fn cells_above_the_loadable_layer_are_absent() {
    let mut w = world();
    assert!(matches!(w.get_chunk(0, SY as i32 + 4, 0), ChunkRef::Absent));
    assert!(matches!(w.get_chunk(0, -1, 0), ChunkRef::Absent));
    assert!(w.take_requests().is_empty());
}

#[test]
fn responses_for_an_old_epoch_are_dropped() {
    let mut w = world();
    let _ = w.get_chunk(0, 0, 0);
    let Some(GenRequest::Generate { coord, epoch }) = w.take_requests().pop() else {
        panic!("expected a generate request");
    };
    let respond = |epoch| GenResponse {
        coord,
        epoch,
        record: flat(coord).to_record(),
        origin: Origin::Archive,
        t_ms: 0,
    };
    assert!(!w.accept(respond(epoch + 7)));
    assert!(w.chunk_at(coord).is_none());
    assert!(w.accept(respond(epoch)));
    assert!(matches!(w.get_chunk(3, 3, 3), ChunkRef::Ready(c) if c.coord == coord));
}

#[test]
fn misfiled_records_are_refused() {
    let mut w = world();
    let _ = w.get_chunk(0, 0, 0);
    let Some(GenRequest::Generate { coord, epoch }) = w.take_requests().pop() else {
        panic!("expected a generate request");
    };
    let wrong = flat(ChunkCoord::new(9, 0, 9)).to_record();
    assert!(!w.accept(GenResponse {
        coord,
        epoch,
        record: wrong,
        origin: Origin::Archive,
        t_ms: 0,
    }));
}

#[test]
fn wraparound_cancels_the_pending_chunk() {
    let mut w = world_with(WorldConfig {
        window: 4,
        ..WorldConfig::default()
    });
    let _ = w.get_chunk(0, 0, 0);
    let _ = w.get_chunk(4 * 16, 0, 0);
    let reqs = w.take_requests();
    let a = ChunkCoord::new(0, 0, 0);
    let b = ChunkCoord::new(4, 0, 0);
    assert!(matches!(reqs[0], GenRequest::Generate { coord, .. } if coord == a));
    assert!(reqs.contains(&GenRequest::Cancel { coord: a }));
    assert!(matches!(reqs.last(), Some(GenRequest::Generate { coord, .. }) if *coord == b));
}

#[test]
fn evicted_edits_still_reach_the_save_queue() {
    let mut w = world_with(WorldConfig {
        window: 4,
        ..WorldConfig::default()
    });
    let _ = w.get_chunk(0, 0, 0);
    serve(&mut w, flat);
    assert!(w.set_block((3, 70, 3), Block::new(STONE, 0)));
    let _ = w.get_chunk(4 * 16, 0, 0);
    assert!(w.chunk_at(ChunkCoord::new(0, 0, 0)).is_none());
    let rec = w.drain_save(0).expect("parked record");
    let back = Chunk::from_record(rec).unwrap();
    assert_eq!(back.block(3, 70, 3), STONE);
}

#[test]
fn reloading_an_evicted_chunk_keeps_unsaved_edits() {
    let mut w = world_with(WorldConfig {
        window: 4,
        ..WorldConfig::default()
    });
    let home = ChunkCoord::new(0, 0, 0);
    let _ = w.get_chunk(0, 0, 0);
    serve(&mut w, flat);
    assert!(w.set_block((3, 70, 3), Block::new(STONE, 0)));
    let _ = w.get_chunk(4 * 16, 0, 0);
    serve(&mut w, flat);
    assert!(w.chunk_at(home).is_none());

    assert!(matches!(w.get_chunk(0, 0, 0), ChunkRef::Ready(_)));
    let regenerated = w
        .take_requests()
        .into_iter()
        .any(|r| matches!(r, GenRequest::Generate { coord, .. } if coord == home));
    assert!(!regenerated);
    assert_eq!(w.block(3, 70, 3), STONE);

    assert!(w.set_block((4, 70, 4), Block::new(STONE, 0)));
    let rec = w.drain_save(0).expect("queued save");
    assert_eq!(rec.coord(), home);
    let saved = Chunk::from_record(rec).unwrap();
    assert_eq!(saved.block(3, 70, 3), STONE);
    assert_eq!(saved.block(4, 70, 4), STONE);
}

#[test]
fn digging_beside_an_absent_chunk_lets_no_light_in() {
    let mut w = world();
    // a sealed pocket along the west border, with the chunk to the west absent
    let pocket = |coord: ChunkCoord| {
        let mut c = flat(coord);
        for x in 1..=3 {
            c.set_local(x, 30, 8, Channel::Blocks, 0);
        }
        c
    };
    let _ = w.get_chunk(0, 0, 0);
    assert_eq!(serve(&mut w, pocket), 1);
    assert_eq!(sky(&w, 2, 30, 8), 0);

    assert!(w.set_block((0, 30, 8), Block::AIR));
    for x in 0..=3 {
        assert_eq!(sky(&w, x, 30, 8), 0, "x={x}");
    }
    assert!(!w.chunk_at(ChunkCoord::new(0, 0, 0)).unwrap().has_unresolved_light());
}

#[test]
fn opaque_block_shades_its_shaft_only() {
    let mut w = world();
    // stone walls up to y=100 with a single open shaft at (8, z=8)
    let walled = |coord: ChunkCoord| {
        let mut c = flat(coord);
        for x in 0..SX {
            for z in 0..SZ {
                let shaft = coord == ChunkCoord::new(0, 0, 0) && x == 8 && z == 8;
                if shaft {
                    continue;
                }
                for y in FLOOR as usize + 1..=100 {
                    c.set_local(x, y, z, Channel::Blocks, STONE as i32);
                    c.set_local(x, y, z, Channel::SkyLight, 0);
                }
            }
        }
        c
    };
    for cx in -1..=1 {
        for cz in -1..=1 {
            let _ = w.get_chunk(cx * 16, 0, cz * 16);
        }
    }
    serve(&mut w, walled);
    assert_eq!(sky(&w, 8, 61, 8), 15);

    assert!(w.set_block((8, 90, 8), Block::new(STONE, 0)));
    for y in 61..90 {
        assert_eq!(sky(&w, 8, y, 8), 0, "y={y}");
    }
    assert_eq!(sky(&w, 8, 91, 8), 15);
    assert_eq!(sky(&w, 9, 101, 8), 15);
    assert_eq!(sky(&w, 7, 110, 8), 15);

    assert!(w.set_block((8, 90, 8), Block::AIR));
    for y in 61..=90 {
        assert_eq!(sky(&w, 8, y, 8), 15, "y={y}");
    }
}

#[test]
fn open_field_block_leaves_side_light_behind() {
    let mut w = flat_world();
    assert!(w.set_block((8, 70, 8), Block::new(STONE, 0)));
    assert_eq!(sky(&w, 8, 70, 8), 0);
    assert_eq!(sky(&w, 8, 69, 8), 14);
    assert_eq!(sky(&w, 9, 69, 8), 15);
    assert!(w.set_block((8, 70, 8), Block::AIR));
    assert_eq!(sky(&w, 8, 69, 8), 15);
}

#[test]
fn emitters_light_and_unlight_their_surroundings() {
    let mut w = flat_world();
    let lightstone = Block::new(89, 0);
    assert!(w.set_block((8, 70, 8), lightstone));
    assert_eq!(w.get(8, 70, 8, Channel::BlockLight), 15);
    assert_eq!(w.get(8, 72, 8, Channel::BlockLight), 13);
    assert!(w.set_block((8, 70, 8), Block::AIR));
    for (x, y, z) in [(8, 70, 8), (8, 72, 8), (10, 70, 8)] {
        assert_eq!(w.get(x, y, z, Channel::BlockLight), 0);
    }
}

#[test]
fn bedrock_cannot_be_replaced() {
    let mut w = flat_world();
    assert!(!w.set_block((3, 0, 3), Block::AIR));
    assert_eq!(w.block(3, 0, 3), BEDROCK);
}

#[test]
fn placing_into_the_player_is_refused() {
    let mut w = flat_world();
    w.player_mut().pos = Vec3::new(4.5, 62.0, 4.5);
    assert!(!w.set_block((4, 61, 4), Block::new(STONE, 0)));
    assert_eq!(w.block(4, 61, 4), 0);
    // plants do not block movement
    assert!(w.set_block((4, 61, 4), Block::new(SAPLING, 0)));
    assert!(w.set_block((6, 61, 4), Block::new(STONE, 0)));
}

#[test]
fn sand_over_air_falls_and_lands() {
    let mut w = flat_world();
    assert!(w.set_block((5, 70, 5), Block::new(SAND, 0)));
    assert_eq!(w.block(5, 70, 5), 0);
    assert_eq!(w.entities().len(), 2);
    let e = w.entities()[1];
    assert_eq!(e.pos, Vec3::new(5.5, 70.5, 5.5));
    assert_eq!(e.vel, Vec3::ZERO);
    assert_eq!(e.payload, Some(Block::new(SAND, 0)));
    assert!(w.entity_mesh(&e).is_some_and(|m| m.quad_count() == 6));
    assert!(w.entity_mesh(w.player()).is_none());

    for _ in 0..200 {
        w.tick();
        if w.entities().len() == 1 {
            break;
        }
    }
    assert_eq!(w.entities().len(), 1);
    assert_eq!(w.block(5, FLOOR + 1, 5), SAND);
}

#[test]
fn removing_support_drops_the_whole_stack() {
    let mut w = flat_world();
    assert!(w.set_block((5, 61, 5), Block::new(SAND, 0)));
    assert!(w.set_block((5, 62, 5), Block::new(SAND, 0)));
    assert_eq!(w.entities().len(), 1);
    assert!(w.set_block((5, 60, 5), Block::AIR));
    assert_eq!(w.block(5, 61, 5), 0);
    assert_eq!(w.block(5, 62, 5), 0);
    assert_eq!(w.entities().len(), 3);
}

#[test]
fn player_settles_on_the_floor() {
    let mut w = flat_world();
    w.player_mut().pos = Vec3::new(8.5, 66.0, 8.5);
    for _ in 0..100 {
        w.tick();
    }
    let p = w.player();
    assert!(p.on_ground);
    let feet = p.pos.y - p.size.y / 2.0;
    assert!((feet - (FLOOR + 1) as f32).abs() < 0.01, "feet at {feet}");
    assert_eq!(w.current_tick(), 100);
}

#[test]
fn ray_pick_places_against_the_hit_face() {
    let mut w = flat_world();
    let hit = w
        .pick(Vec3::new(8.5, 70.5, 8.5), Vec3::new(0.0, -1.0, 0.0), 20.0)
        .expect("floor hit");
    assert_eq!(hit.block, (8, FLOOR, 8));
    assert_eq!(hit.face, Some(Face::PosY));
    assert!(w.place_against(&hit, Block::new(STONE, 0)));
    assert_eq!(w.block(8, FLOOR + 1, 8), STONE);
}

#[test]
fn edits_are_saved_one_chunk_per_interval() {
    let mut w = flat_world();
    assert_eq!(w.stats().queued_saves, 0);
    assert!(w.set_block((8, 70, 8), Block::new(STONE, 0)));
    assert!(w.set_block((9, 70, 8), Block::new(STONE, 0)));
    assert!(w.set_block((-8, 70, 8), Block::new(STONE, 0)));
    assert_eq!(w.stats().queued_saves, 2);
    let first = w.drain_save(10).expect("due");
    assert_eq!(first.coord(), ChunkCoord::new(0, 0, 0));
    assert!(w.drain_save(11).is_none());
    let interval = w.config().save_interval;
    let second = w.drain_save(10 + interval).expect("due again");
    assert_eq!(second.coord(), ChunkCoord::new(-1, 0, 0));
    assert!(w.drain_save(10 + 3 * interval).is_none());
}

#[test]
fn border_edits_dirty_the_neighbouring_cube() {
    let mut w = flat_world();
    assert!(w.set_block((15, 64, 8), Block::new(STONE, 0)));
    let east = w.chunk_at(ChunkCoord::new(1, 0, 0)).unwrap();
    assert!(east.cube(Chunk::cube_index(0, 64, 8)).dirty);
    assert!(east.cube(Chunk::cube_index(0, 48, 8)).dirty);
    assert!(!east.cube(Chunk::cube_index(0, 96, 8)).dirty);
    let home = w.chunk_at(ChunkCoord::new(0, 0, 0)).unwrap();
    assert!(home.cube(Chunk::cube_index(15, 63, 8)).dirty);
}

#[test]
fn cubes_mesh_only_with_all_neighbours_loaded() {
    let mut w = world();
    let eye = Vec3::new(8.0, 70.0, 8.0);
    assert!(w.meshes_around(eye, 0).is_empty());
    assert_eq!(serve(&mut w, flat), 1);
    assert!(w.meshes_around(eye, 0).is_empty());
    assert_eq!(serve(&mut w, flat), 8);
    let handles = w.meshes_around(eye, 0);
    assert_eq!(handles.len(), 1);
    assert!(w.mesh(handles[0]).is_some());
}

#[test]
fn dirty_meshes_are_rebuilt_in_place() {
    let mut w = flat_world();
    let eye = Vec3::new(8.0, 70.0, 8.0);
    let h = w.meshes_around(eye, 0)[0];
    assert_eq!(w.mesh(h).unwrap().quad_count(), 0);

    assert!(w.set_block((8, 70, 8), Block::new(STONE, 0)));
    w.begin_frame();
    assert_eq!(w.meshes_around(eye, 0), vec![h]);
    assert_eq!(w.mesh(h).unwrap().quad_count(), 6);
    let home = w.chunk_at(ChunkCoord::new(0, 0, 0)).unwrap();
    assert!(!home.cube(Chunk::cube_index(8, 70, 8)).dirty);
}

#[test]
fn dirty_cube_keeps_its_stale_mesh_while_a_neighbour_is_missing() {
    let mut w = world_with(WorldConfig {
        window: 4,
        mesh_budget_ms: 60_000,
        ..WorldConfig::default()
    });
    for cx in -1..=1 {
        for cz in -1..=1 {
            let _ = w.get_chunk(cx * 16, 0, cz * 16);
        }
    }
    assert_eq!(serve(&mut w, flat), 9);
    let eye = Vec3::new(8.0, 70.0, 8.0);
    let h = w.meshes_around(eye, 0)[0];

    // (5, 0, 0) shares the window slot of the eastern neighbour
    let _ = w.get_chunk(5 * 16, 0, 0);
    assert!(w.chunk_at(ChunkCoord::new(1, 0, 0)).is_none());
    assert!(w.set_block((8, 70, 8), Block::new(STONE, 0)));
    w.begin_frame();
    assert_eq!(w.meshes_around(eye, 0), vec![h]);
    assert_eq!(w.mesh(h).unwrap().quad_count(), 0);
    let home = w.chunk_at(ChunkCoord::new(0, 0, 0)).unwrap();
    assert!(home.cube(Chunk::cube_index(8, 70, 8)).dirty);
}

#[test]
fn empty_budget_builds_no_new_meshes() {
    let mut w = world_with(WorldConfig {
        mesh_budget_ms: 0,
        ..WorldConfig::default()
    });
    for cx in -1..=1 {
        for cz in -1..=1 {
            let _ = w.get_chunk(cx * 16, 0, cz * 16);
        }
    }
    serve(&mut w, flat);
    assert!(w.meshes_around(Vec3::new(8.0, 70.0, 8.0), 1).is_empty());
    assert_eq!(w.stats().meshes, 0);
}

#[test]
fn shells_are_visited_nearest_first() {
    let mut w = flat_world();
    let eye = Vec3::new(8.0, 70.0, 8.0);
    let handles = w.meshes_around(eye, 1);
    // the 3x3 ring needs chunks beyond the loaded block, so only the centre
    // column's cubes are available: y = 4, then y = 3 and y = 5
    assert_eq!(handles.len(), 3);
    let first = w.mesh(handles[0]).unwrap();
    assert_eq!(first.origin, [0, 64, 0]);
}

#[test]
fn streamed_terrain_meshes_after_neighbours_arrive() {
    let reg = reg();
    let gen_cfg = WorldGenConfig::default();
    let tg = TerrainGen::new(&gen_cfg, &reg).unwrap();
    let mut w = World::new(
        WorldConfig {
            mesh_budget_ms: 60_000,
            ..WorldConfig::default()
        },
        reg.clone(),
        &gen_cfg,
    )
    .unwrap();
    let eye = Vec3::new(8.0, 64.0, 8.0);
    let mut handles = Vec::new();
    for _ in 0..4 {
        handles = w.meshes_around(eye, 0);
        serve(&mut w, |c| tg.generate(&reg, c));
    }
    assert_eq!(handles.len(), 1);
    assert_eq!(w.stats().chunks_ready, 9);
    assert_eq!(w.stats().chunks_pending, 0);
}
