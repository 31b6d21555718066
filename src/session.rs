use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cubit_blocks::{Block, BlockRegistry};
use cubit_chunk::ChunkCoord;
use cubit_gen::{TerrainGen, WorldGenConfig};
use cubit_geom::Vec3;
use cubit_runtime::{ChunkArchive, DirArchive, GenRuntime, MemoryArchive};
use cubit_world::World;

use crate::settings::SessionConfig;

// Longest wait for the chunk under the player before a tick runs anyway
const GROUND_WAIT: Duration = Duration::from_secs(10);
const REACH: f32 = 8.0;
const EYE_HEIGHT: f32 = 0.7;

#[derive(Clone, Copy, Debug, Default)]
pub struct SessionReport {
    pub ticks: u64,
    pub chunks_ready: usize,
    pub chunks_requested: usize,
    pub meshes: usize,
    pub quads: usize,
    pub edits: usize,
    pub saves: usize,
    pub entities: usize,
    pub elapsed_ms: u128,
}

/// Headless run of the world: streams chunks from the worker, walks the
/// player, edits blocks through ray picks and meshes around the player.
pub struct Session {
    cfg: SessionConfig,
    world: World,
    runtime: GenRuntime,
    archive: Arc<dyn ChunkArchive>,
    report: SessionReport,
}

impl Session {
    pub fn new(
        cfg: SessionConfig,
        reg: Arc<BlockRegistry>,
        gen_cfg: &WorldGenConfig,
    ) -> Result<Self, Box<dyn Error>> {
        let archive: Arc<dyn ChunkArchive> = match &cfg.archive {
            Some(dir) => Arc::new(DirArchive::open(dir)?),
            None => Arc::new(MemoryArchive::new()),
        };
        let terrain = TerrainGen::new(gen_cfg, &reg)?;
        let runtime = GenRuntime::new(terrain, Arc::clone(&reg), Arc::clone(&archive), cfg.workers)?;
        let world = World::new(cfg.world.clone(), reg, gen_cfg)?;
        Ok(Self {
            cfg,
            world,
            runtime,
            archive,
            report: SessionReport::default(),
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    fn eye(&self) -> Vec3 {
        self.world.player().pos + Vec3::new(0.0, EYE_HEIGHT, 0.0)
    }

    /// Sends queued requests to the worker and installs whatever has come back.
    fn pump(&mut self) {
        for req in self.world.take_requests() {
            if matches!(req, cubit_runtime::GenRequest::Generate { .. }) {
                self.report.chunks_requested += 1;
            }
            self.runtime.submit(req);
        }
        for res in self.runtime.drain_results() {
            self.world.accept(res);
        }
    }

    /// Blocks until the chunk under the player is resolved or the wait runs out.
    fn wait_for_ground(&mut self) {
        let p = self.world.player().pos;
        let coord = ChunkCoord::containing(p.x.floor() as i32, 0, p.z.floor() as i32);
        let _ = self.world.get_chunk(p.x.floor() as i32, 0, p.z.floor() as i32);
        let t0 = Instant::now();
        while self.world.chunk_at(coord).is_none() && t0.elapsed() < GROUND_WAIT {
            self.pump();
            if let Some(res) = self.runtime.wait_result(Duration::from_millis(50)) {
                self.world.accept(res);
            }
        }
    }

    /// One frame: mesh around the player, exchange chunks with the worker,
    /// maybe edit, then advance the simulation and flush a save.
    pub fn step(&mut self) {
        let tick = self.world.current_tick();
        self.wait_for_ground();
        self.world.begin_frame();
        let handles = self.world.meshes_around(self.eye(), self.cfg.draw_dist);
        self.report.meshes = handles.len();
        self.report.quads = handles
            .iter()
            .filter_map(|h| self.world.mesh(*h))
            .map(|m| m.quad_count())
            .sum();
        self.report.quads += self
            .world
            .entities()
            .iter()
            .filter_map(|e| self.world.entity_mesh(e))
            .map(|m| m.quad_count())
            .sum::<usize>();
        self.pump();

        if self.cfg.edit_every > 0 && tick % self.cfg.edit_every == 0 {
            self.scripted_edit(tick);
        }
        // walk a slow circle
        let heading = tick as f32 / 64.0;
        let jump = self.world.player().on_ground && tick % 48 == 0;
        self.world
            .player_mut()
            .steer(Vec3::new(heading.cos(), 0.0, heading.sin()), jump, false);
        self.world.tick();

        if let Some(rec) = self.world.drain_save(self.world.current_tick()) {
            match self.archive.save(&rec) {
                Ok(()) => self.report.saves += 1,
                Err(e) => log::warn!("saving chunk {} failed: {e}", rec.coord()),
            }
        }
    }

    /// Alternates between digging the block in front of the player and
    /// dropping sand onto whatever the ray hits.
    fn scripted_edit(&mut self, tick: u64) {
        let angle = tick as f32 * 0.37;
        let dir = Vec3::new(angle.cos(), -0.6, angle.sin()).normalized();
        let Some(hit) = self.world.pick(self.eye(), dir, REACH) else {
            return;
        };
        let sand = self.world.registry().id_by_name("sand");
        let done = if (tick / self.cfg.edit_every.max(1)) % 2 == 0 {
            self.world.set_block(hit.block, Block::AIR)
        } else {
            match sand {
                Some(id) => self.world.place_against(&hit, Block::new(id, 0)),
                None => false,
            }
        };
        if done {
            self.report.edits += 1;
        }
        log::info!(target: "events", "[tick {}] ScriptedEdit at {:?} applied={}", tick, hit.block, done);
    }

    pub fn run(&mut self) -> SessionReport {
        let t0 = Instant::now();
        for _ in 0..self.cfg.ticks {
            self.step();
            let tick = self.world.current_tick();
            if tick % 64 == 0 {
                let (queued, inflight) = self.runtime.queue_debug_counts();
                let s = self.world.stats();
                log::info!(
                    "tick {tick}: chunks {} ready / {} pending, meshes {}, entities {}, saves queued {}, worker {queued} queued {inflight} in flight",
                    s.chunks_ready,
                    s.chunks_pending,
                    s.meshes,
                    s.entities,
                    s.queued_saves
                );
            }
        }
        let s = self.world.stats();
        self.report.ticks = self.world.current_tick();
        self.report.chunks_ready = s.chunks_ready;
        self.report.entities = s.entities;
        self.report.elapsed_ms = t0.elapsed().as_millis();
        self.report
    }

    pub fn shutdown(&mut self) {
        self.runtime.shutdown();
    }
}
