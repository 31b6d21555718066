use std::sync::Arc;
use std::time::Instant;

use cubit_blocks::{AIR, Block, BlockRegistry};
use cubit_chunk::{
    CUBES_Y, Channel, Chunk, ChunkCoord, ChunkError, ChunkRecord, MeshHandle, RENDER_CUBE, SX, SY,
    SZ, Voxels,
};
use cubit_gen::{NoiseField, WorldGenConfig, biome_field};
use cubit_geom::Vec3;
use cubit_lighting::{LightChannel, LightSeed, add_lights, remove_light, touch_light};
use cubit_mesh_cpu::{MeshBudget, MeshBuild, MeshBuilder, MeshOptions, block_entity_mesh};
use cubit_physics::{RayHit, colliding, move_box, terrain_obstacle, trace_ray};
use cubit_runtime::{GenRequest, GenResponse};

use crate::config::{WorldConfig, WorldError};
use crate::entity::Entity;
use crate::meshes::{CubeKey, MeshArena};
use crate::save::SaveQueue;
use crate::window::{ChunkStatus, ChunkWindow, SlotState, WindowEvent};

pub type Cell = (i32, i32, i32);

/// Where the player starts before any terrain has streamed in.
pub const SPAWN: Vec3 = Vec3::new(0.5, SY as f32 + 2.0, 0.5);

/// Result of a chunk lookup that may start generation.
#[derive(Debug)]
pub enum ChunkRef<'a> {
    Ready(&'a Chunk),
    Pending,
    Absent,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub chunks_ready: usize,
    pub chunks_pending: usize,
    pub meshes: usize,
    pub entities: usize,
    pub queued_saves: usize,
}

/// The chunk window plus everything simulated on top of it: edits, light,
/// mesh scheduling, entities and the save queue.
///
/// Chunk generation happens elsewhere: requests collect in an outbox
/// ([`World::take_requests`]) and results come back through [`World::accept`].
pub struct World {
    cfg: WorldConfig,
    reg: Arc<BlockRegistry>,
    window: ChunkWindow,
    biome: NoiseField,
    arena: MeshArena,
    budget: MeshBudget,
    opts: MeshOptions,
    saves: SaveQueue,
    outbox: Vec<GenRequest>,
    entities: Vec<Entity>,
    tick: u64,
}

impl World {
    pub fn new(
        cfg: WorldConfig,
        reg: Arc<BlockRegistry>,
        gen_cfg: &WorldGenConfig,
    ) -> Result<Self, WorldError> {
        cfg.validate()?;
        let opts = MeshOptions {
            smooth_lighting: cfg.smooth_lighting,
            fluid_shaping: cfg.fluid_shaping,
        };
        Ok(Self {
            window: ChunkWindow::new(cfg.window),
            biome: biome_field(gen_cfg),
            arena: MeshArena::new(),
            budget: MeshBudget::from_millis(cfg.mesh_budget_ms),
            opts,
            saves: SaveQueue::new(cfg.save_interval),
            outbox: Vec::new(),
            entities: vec![Entity::player(SPAWN)],
            tick: 0,
            reg,
            cfg,
        })
    }

    #[inline]
    pub fn registry(&self) -> &BlockRegistry {
        &self.reg
    }

    #[inline]
    pub fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    #[inline]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn biome(&self, x: i32, z: i32) -> f32 {
        self.biome.sample_2d(x as f32, z as f32)
    }

    // ---- chunk window ----

    /// Looks up the chunk holding a world cell, requesting generation on a miss.
    pub fn get_chunk(&mut self, x: i32, y: i32, z: i32) -> ChunkRef<'_> {
        let coord = ChunkCoord::containing(x, y, z);
        match self.request(coord) {
            ChunkStatus::Absent => ChunkRef::Absent,
            ChunkStatus::Pending => ChunkRef::Pending,
            ChunkStatus::Ready => match self.window.chunk(coord) {
                Some(c) => ChunkRef::Ready(c),
                None => ChunkRef::Pending,
            },
        }
    }

    /// Resolved chunk at `coord`; never allocates or requests.
    #[inline]
    pub fn chunk_at(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.window.chunk(coord)
    }

    fn request(&mut self, coord: ChunkCoord) -> ChunkStatus {
        let status = self.window.acquire(coord);
        self.flush_window_events();
        // a parked record may have been reinstalled on the spot
        if status == ChunkStatus::Pending && self.window.chunk(coord).is_some() {
            return ChunkStatus::Ready;
        }
        status
    }

    fn flush_window_events(&mut self) {
        for ev in self.window.drain_events() {
            match ev {
                WindowEvent::Request { coord, epoch } => {
                    if !self.restore_parked(coord, epoch) {
                        self.outbox.push(GenRequest::Generate { coord, epoch });
                    }
                }
                WindowEvent::Evicted(slot) => match slot.state {
                    SlotState::Pending { .. } => {
                        log::debug!(target: "events", "[tick {}] ChunkCancelled {}", self.tick, slot.coord);
                        self.outbox.push(GenRequest::Cancel { coord: slot.coord });
                    }
                    SlotState::Ready(chunk) => {
                        log::debug!(target: "events", "[tick {}] ChunkEvicted {}", self.tick, slot.coord);
                        for (_, cube) in chunk.cubes() {
                            if let Some(h) = cube.mesh {
                                self.arena.release(h);
                            }
                        }
                        if self.saves.contains(slot.coord) {
                            self.saves.park(chunk.to_record());
                        }
                    }
                },
            }
        }
    }

    /// Reinstalls a chunk that left the window with unsaved edits. The archive
    /// copy is older than the parked record, so regenerating would lose them.
    fn restore_parked(&mut self, coord: ChunkCoord, epoch: u64) -> bool {
        let Some(rec) = self.saves.unpark(coord) else {
            return false;
        };
        let chunk = match Chunk::from_record(rec) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("parked record for {coord} is unusable: {e}");
                return false;
            }
        };
        if !self.window.resolve(coord, epoch, chunk) {
            return false;
        }
        log::debug!(target: "events", "[tick {}] ChunkRestored {}", self.tick, coord);
        self.stitch_light(coord);
        true
    }

    /// Generation requests and cancellations produced since the last call.
    pub fn take_requests(&mut self) -> Vec<GenRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Installs a generation result. Returns false when the slot has moved on
    /// (evicted or re-requested) or the record is malformed.
    pub fn accept(&mut self, res: GenResponse) -> bool {
        let coord = res.coord;
        if coord.cy != 0 {
            log::warn!("dropping chunk result: {}", ChunkError::OutOfVerticalRange(coord));
            return false;
        }
        let chunk = match Chunk::from_record(res.record) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("dropping chunk result for {coord}: {e}");
                return false;
            }
        };
        if chunk.coord != coord {
            log::warn!("dropping chunk result for {coord}: record holds {}", chunk.coord);
            return false;
        }
        if !self.window.resolve(coord, res.epoch, chunk) {
            log::info!(target: "events", "[tick {}] StaleChunkDropped {} epoch={}", self.tick, coord, res.epoch);
            return false;
        }
        log::debug!(target: "events", "[tick {}] ChunkReady {} origin={:?} t_ms={}", self.tick, coord, res.origin, res.t_ms);
        self.stitch_light(coord);
        true
    }

    /// Lets light cross the borders between a freshly loaded chunk and its
    /// loaded horizontal neighbours.
    fn stitch_light(&mut self, coord: ChunkCoord) {
        let reg = Arc::clone(&self.reg);
        let (ox, _, oz) = coord.origin();
        let (w, d) = (SX as i32, SZ as i32);
        for ch in LightChannel::ALL {
            let chan = ch.channel();
            let mut seeds: Vec<LightSeed> = Vec::new();
            for (dx, dz) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                if self.chunk_at(coord.offset(dx, 0, dz)).is_none() {
                    continue;
                }
                let span = if dx != 0 { d } else { w };
                for t in 0..span {
                    // `a` inside the new chunk, `b` across the border
                    let (ax, az) = match (dx, dz) {
                        (-1, _) => (ox, oz + t),
                        (1, _) => (ox + w - 1, oz + t),
                        (_, -1) => (ox + t, oz),
                        _ => (ox + t, oz + d - 1),
                    };
                    let (bx, bz) = (ax + dx, az + dz);
                    for y in 0..SY as i32 {
                        let la = self.get(ax, y, az, chan);
                        let lb = self.get(bx, y, bz, chan);
                        if lb - reg.opacity(self.block(ax, y, az)) as i32 - 1 > la {
                            seeds.push(((bx, y, bz), lb));
                        } else if la - reg.opacity(self.block(bx, y, bz)) as i32 - 1 > lb {
                            seeds.push(((ax, y, az), la));
                        }
                    }
                }
            }
            if !seeds.is_empty() {
                let n = add_lights(self, &reg, &seeds, ch);
                log::trace!("stitched {coord} {ch:?}: {} seeds, {n} writes", seeds.len());
            }
        }
    }

    // ---- cell access ----

    /// Writes one channel of a loaded cell, marks every rendering cube whose mesh
    /// can see the cell dirty and queues the chunk for saving. Writes into absent
    /// chunks and writes of an unchanged value are dropped.
    pub fn set_data(&mut self, x: i32, y: i32, z: i32, ch: Channel, value: i32) {
        let coord = ChunkCoord::containing(x, y, z);
        let (lx, ly, lz) = ChunkCoord::local(x, y, z);
        let Some(chunk) = self.window.chunk_mut(coord) else {
            return;
        };
        if chunk.get_local(lx, ly, lz, ch) == value {
            return;
        }
        chunk.set_local(lx, ly, lz, ch, value);
        self.touch_around(x, y, z);
        self.saves.push(coord);
    }

    /// Dirties the rendering cubes of the 27 cells around `(x, y, z)`.
    fn touch_around(&mut self, x: i32, y: i32, z: i32) {
        let r = RENDER_CUBE as i32;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                    // neighbours sharing this cell's cube add nothing
                    if (dx != 0 && nx.div_euclid(r) == x.div_euclid(r))
                        || (dy != 0 && ny.div_euclid(r) == y.div_euclid(r))
                        || (dz != 0 && nz.div_euclid(r) == z.div_euclid(r))
                    {
                        continue;
                    }
                    if !(0..SY as i32).contains(&ny) {
                        continue;
                    }
                    let (lx, ly, lz) = ChunkCoord::local(nx, ny, nz);
                    if let Some(c) = self.window.chunk_mut(ChunkCoord::containing(nx, ny, nz)) {
                        c.touch_local(lx, ly, lz);
                    }
                }
            }
        }
    }

    // ---- block edits ----

    /// Replaces the block at `pos`, keeping both light channels consistent and
    /// letting unsupported falling blocks drop. Returns false when the edit was
    /// refused or the chunk is not loaded.
    pub fn set_block(&mut self, pos: Cell, block: Block) -> bool {
        let (x, y, z) = pos;
        if !self.is_loaded(x, y, z) {
            return false;
        }
        let reg = Arc::clone(&self.reg);
        let old = self.block(x, y, z);
        if reg.get(old).indestructible {
            log::debug!(target: "events", "[tick {}] EditRefused ({x},{y},{z}) indestructible", self.tick);
            return false;
        }
        if reg.is_physical(block.id) && self.traps_player(pos) {
            log::debug!(target: "events", "[tick {}] EditRefused ({x},{y},{z}) player", self.tick);
            return false;
        }

        if reg.emission(old) > 0 {
            remove_light(self, &reg, pos, LightChannel::Block);
        }
        self.set_data(x, y, z, Channel::Blocks, block.id as i32);
        self.set_data(x, y, z, Channel::Metadata, block.data as i32);
        let new = reg.get(block.id);
        if new.opacity > 0 {
            remove_light(self, &reg, pos, LightChannel::Sky);
            if new.emission == 0 {
                remove_light(self, &reg, pos, LightChannel::Block);
            }
        } else {
            touch_light(self, &reg, pos, LightChannel::Sky);
            touch_light(self, &reg, pos, LightChannel::Block);
        }
        if new.emission > 0 {
            add_lights(self, &reg, &[(pos, new.emission as i32)], LightChannel::Block);
        }
        log::info!(target: "events", "[tick {}] BlockSet ({x},{y},{z}) {} -> {}", self.tick, old, block.id);

        let above = (x, y + 1, z);
        if block.id == AIR && reg.falls(self.block(above.0, above.1, above.2)) {
            let falling = self.block_at(above);
            if self.set_block(above, Block::AIR) {
                self.spawn_falling(above, falling);
            }
        }
        if new.falls && self.is_loaded(x, y - 1, z) && self.block(x, y - 1, z) == AIR && self.set_block(pos, Block::AIR) {
            self.spawn_falling(pos, block);
        }
        true
    }

    fn traps_player(&self, pos: Cell) -> bool {
        let p = &self.entities[0];
        colliding(&|x: i32, y: i32, z: i32| (x, y, z) == pos, p.pos, p.size)
    }

    #[inline]
    pub fn block_at(&self, pos: Cell) -> Block {
        let (x, y, z) = pos;
        Block::new(self.block(x, y, z), self.get(x, y, z, Channel::Metadata) as u8)
    }

    fn spawn_falling(&mut self, cell: Cell, block: Block) {
        log::info!(target: "events", "[tick {}] FallingBlockSpawned ({},{},{}) id={}", self.tick, cell.0, cell.1, cell.2, block.id);
        self.entities.push(Entity::falling_block(cell, block));
    }

    /// First non-air block along a ray through loaded chunks.
    pub fn pick(&self, start: Vec3, dir: Vec3, max_len: f32) -> Option<RayHit> {
        trace_ray(self, start, dir, max_len)
    }

    /// Places `block` against the face a ray pick hit. Picks with no entry face
    /// (started inside a block) place nothing.
    pub fn place_against(&mut self, hit: &RayHit, block: Block) -> bool {
        let Some(face) = hit.face else {
            return false;
        };
        let (dx, dy, dz) = face.delta();
        let (x, y, z) = hit.block;
        self.set_block((x + dx, y + dy, z + dz), block)
    }

    // ---- entities ----

    #[inline]
    pub fn player(&self) -> &Entity {
        &self.entities[0]
    }

    #[inline]
    pub fn player_mut(&mut self) -> &mut Entity {
        &mut self.entities[0]
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Advances every entity by one 1/32 s step. Falling blocks that come to rest
    /// are turned back into blocks.
    pub fn tick(&mut self) {
        self.tick += 1;
        log::trace!(target: "events", "[tick {}] Tick", self.tick);
        let reg = Arc::clone(&self.reg);
        for i in 0..self.entities.len() {
            let mut e = self.entities[i];
            e.accelerate();
            for (j, other) in self.entities.iter().enumerate() {
                if j != i {
                    e.push_from(other);
                }
            }
            e.on_ground = {
                let blocked = terrain_obstacle(&*self, &reg);
                move_box(&blocked, e.size, &mut e.pos, &mut e.vel, e.sneak)
            };
            self.entities[i] = e;
        }

        let mut landed = Vec::new();
        let mut i = self.entities.len();
        while i > 1 {
            i -= 1;
            let e = self.entities[i];
            let Some(block) = e.payload else {
                continue;
            };
            if e.on_ground {
                self.entities.swap_remove(i);
                landed.push((e.pos.floor_cell(), block));
            } else if e.pos.y < 0.0 {
                self.entities.swap_remove(i);
                log::debug!(target: "events", "[tick {}] FallingBlockLost id={}", self.tick, block.id);
            }
        }
        for (cell, block) in landed {
            let placed = self.set_block(cell, block);
            log::info!(target: "events", "[tick {}] FallingBlockLanded ({},{},{}) id={} placed={}", self.tick, cell.0, cell.1, cell.2, block.id, placed);
        }
    }

    // ---- meshing ----

    /// Resets the per-frame mesh budget and ages mesh and chunk slots.
    pub fn begin_frame(&mut self) {
        self.budget.reset();
        self.arena.decay();
        self.window.decay_usage();
    }

    /// Handles of the meshes around `pos`, nearest shell first, building missing
    /// ones within budget and rebuilding dirty ones unconditionally.
    pub fn meshes_around(&mut self, pos: Vec3, dist: i32) -> Vec<MeshHandle> {
        let r = RENDER_CUBE as f32;
        let center = (
            (pos.x / r).floor() as i32,
            (pos.y / r).floor() as i32,
            (pos.z / r).floor() as i32,
        );
        let mut out = Vec::new();
        for d in 0..=dist.max(0) {
            for dx in -d..=d {
                for dy in -d..=d {
                    for dz in -d..=d {
                        if dx.abs().max(dy.abs()).max(dz.abs()) != d {
                            continue;
                        }
                        let q = (center.0 + dx, center.1 + dy, center.2 + dz);
                        if !(0..CUBES_Y as i32).contains(&q.1) {
                            continue;
                        }
                        if let Some(h) = self.cube_mesh(q) {
                            out.push(h);
                        }
                    }
                }
            }
        }
        out
    }

    fn cube_mesh(&mut self, q: Cell) -> Option<MeshHandle> {
        let r = RENDER_CUBE as i32;
        let min = (q.0 * r, q.1 * r, q.2 * r);
        let coord = ChunkCoord::containing(min.0, min.1, min.2);
        if self.request(coord) != ChunkStatus::Ready {
            return None;
        }
        let (lx, ly, lz) = ChunkCoord::local(min.0, min.1, min.2);
        let cube = Chunk::cube_index(lx, ly, lz);
        let key = CubeKey { chunk: coord, cube };
        let rc = *self.window.chunk(coord)?.cube(cube);
        let live = rc.mesh.filter(|h| self.arena.owner(*h) == Some(key));

        if live.is_none() || rc.dirty {
            if !self.neighbours_ready(coord) || (live.is_none() && !self.budget.can_start(false)) {
                // the stale mesh stays on screen until a rebuild can run
                if let Some(h) = live {
                    self.arena.mark_used(h);
                }
                return live;
            }
            let t0 = Instant::now();
            let mesh = self.build_region(min, (min.0 + r, min.1 + r, min.2 + r));
            self.budget.charge(t0.elapsed());
            let h = match live {
                Some(h) => h,
                None => {
                    let (h, prev) = self.arena.alloc(key);
                    if let Some(prev) = prev {
                        self.forget_mesh(prev, h);
                    }
                    h
                }
            };
            self.arena.replace(h, mesh);
            let c = self.window.chunk_mut(coord)?;
            let rc = c.cube_mut(cube);
            rc.mesh = Some(h);
            rc.dirty = false;
        }
        let h = self.window.chunk(coord)?.cube(cube).mesh?;
        self.arena.mark_used(h);
        Some(h)
    }

    fn forget_mesh(&mut self, owner: CubeKey, h: MeshHandle) {
        if let Some(c) = self.window.chunk_mut(owner.chunk) {
            let rc = c.cube_mut(owner.cube);
            if rc.mesh == Some(h) {
                rc.mesh = None;
            }
        }
    }

    fn neighbours_ready(&mut self, coord: ChunkCoord) -> bool {
        let mut ready = true;
        for dx in -1..=1 {
            for dz in -1..=1 {
                ready &= self.request(coord.offset(dx, 0, dz)) == ChunkStatus::Ready;
            }
        }
        ready
    }

    /// Meshes an arbitrary world region against the current state.
    pub fn build_region(&self, min: Cell, max: Cell) -> MeshBuild {
        MeshBuilder::new(self, &self.reg, |x, z| self.biome(x, z), self.opts).build_region(min, max)
    }

    /// Unit-cube mesh for a falling block, centred on the origin. `None` for
    /// entities without a block payload.
    pub fn entity_mesh(&self, e: &Entity) -> Option<MeshBuild> {
        let block = e.payload?;
        let (x, _, z) = e.pos.floor_cell();
        Some(block_entity_mesh(&self.reg, block, self.biome(x, z)))
    }

    #[inline]
    pub fn mesh(&self, h: MeshHandle) -> Option<&MeshBuild> {
        self.arena.get(h)
    }

    // ---- persistence ----

    /// At most one edited chunk per save interval, ready for the archive.
    pub fn drain_save(&mut self, now: u64) -> Option<ChunkRecord> {
        let window = &self.window;
        self.saves
            .take_due(now, |c| window.chunk(c).map(Chunk::to_record))
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            chunks_ready: self.window.ready_count(),
            chunks_pending: self.window.pending_count(),
            meshes: self.arena.live(),
            entities: self.entities.len(),
            queued_saves: self.saves.len(),
        }
    }
}

impl Voxels for World {
    fn get(&self, x: i32, y: i32, z: i32, ch: Channel) -> i32 {
        match self.window.chunk(ChunkCoord::containing(x, y, z)) {
            Some(c) => {
                let (lx, ly, lz) = ChunkCoord::local(x, y, z);
                c.get_local(lx, ly, lz, ch)
            }
            None => ch.default_value(),
        }
    }

    #[inline]
    fn set(&mut self, x: i32, y: i32, z: i32, ch: Channel, value: i32) {
        self.set_data(x, y, z, ch, value);
    }

    fn is_loaded(&self, x: i32, y: i32, z: i32) -> bool {
        self.window.chunk(ChunkCoord::containing(x, y, z)).is_some()
    }
}
