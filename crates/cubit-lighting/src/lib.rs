//! Two-channel flood-fill light propagation and retraction.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use cubit_blocks::BlockRegistry;
use cubit_chunk::{Channel, LIGHT_MAX, LIGHT_UNRESOLVED, SY, Voxels};

pub type Cell = (i32, i32, i32);

/// A light source: position and strength.
pub type LightSeed = (Cell, i32);

// face indices: 0=+Y,1=-Y,2=+X,3=-X,4=+Z,5=-Z (matches mesher)
pub const NEIGHBORS: [Cell; 6] = [
    (0, 1, 0),
    (0, -1, 0),
    (1, 0, 0),
    (-1, 0, 0),
    (0, 0, 1),
    (0, 0, -1),
];
const DOWN: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightChannel {
    Sky,
    Block,
}

impl LightChannel {
    pub const ALL: [LightChannel; 2] = [LightChannel::Sky, LightChannel::Block];

    #[inline]
    pub fn channel(self) -> Channel {
        match self {
            LightChannel::Sky => Channel::SkyLight,
            LightChannel::Block => Channel::BlockLight,
        }
    }
}

/// Light level to render brightness: `0.8^(15 - level)`.
#[inline]
pub fn attenuation(level: i32) -> f32 {
    0.8f32.powi(LIGHT_MAX - level.clamp(0, LIGHT_MAX))
}

#[inline]
fn step(c: Cell, d: Cell) -> Cell {
    (c.0 + d.0, c.1 + d.1, c.2 + d.2)
}

/// Whether the light read at `c` may seed a fill. Unloaded chunks only report
/// defaults; the open space above the world is the one real unloaded source.
#[inline]
fn can_seed<V: Voxels + ?Sized>(world: &V, c: Cell) -> bool {
    c.1 >= SY as i32 || world.is_loaded(c.0, c.1, c.2)
}

/// Multi-source breadth-first fill. Returns the number of cells whose value changed.
///
/// A seed is planted only where it is at least as bright as the stored value. Full
/// skylight moving down into a transparent cell keeps its strength and jumps the queue.
pub fn add_lights<V: Voxels + ?Sized>(
    world: &mut V,
    reg: &BlockRegistry,
    seeds: &[LightSeed],
    ch: LightChannel,
) -> usize {
    let chan = ch.channel();
    let mut queue: VecDeque<LightSeed> = VecDeque::with_capacity(seeds.len() * 4);
    let mut writes = 0usize;
    for &(pos, value) in seeds {
        if !can_seed(world, pos) {
            continue;
        }
        let cur = world.get(pos.0, pos.1, pos.2, chan);
        if value >= cur {
            if value != cur && world.is_loaded(pos.0, pos.1, pos.2) {
                writes += 1;
            }
            world.set(pos.0, pos.1, pos.2, chan, value);
            queue.push_back((pos, value));
        }
    }
    while let Some((pos, value)) = queue.pop_front() {
        for (i, d) in NEIGHBORS.iter().enumerate() {
            let adj = step(pos, *d);
            // unloaded space never remembers a write
            if !world.is_loaded(adj.0, adj.1, adj.2) {
                continue;
            }
            let opacity = reg.opacity(world.block(adj.0, adj.1, adj.2)) as i32;
            let adj_value = world.get(adj.0, adj.1, adj.2, chan);
            let mut next = value - opacity - 1;
            if opacity == 0
                && i == DOWN
                && value == LIGHT_MAX
                && ch == LightChannel::Sky
                && value > adj_value
            {
                next = value;
                queue.push_front((adj, next));
            } else if next > adj_value {
                queue.push_back((adj, next));
            } else {
                continue;
            }
            world.set(adj.0, adj.1, adj.2, chan, next);
            writes += 1;
        }
    }
    writes
}

/// Retracts the light that flowed out of `pos`, then refills from what remains.
pub fn remove_light<V: Voxels + ?Sized>(
    world: &mut V,
    reg: &BlockRegistry,
    pos: Cell,
    ch: LightChannel,
) {
    let chan = ch.channel();
    let mut queue: VecDeque<Cell> = VecDeque::new();
    queue.push_back(pos);
    let mut marked = 0usize;
    while let Some(cur) = queue.pop_front() {
        let loc = world.get(cur.0, cur.1, cur.2, chan);
        world.set(cur.0, cur.1, cur.2, chan, LIGHT_UNRESOLVED);
        marked += 1;
        for (i, d) in NEIGHBORS.iter().enumerate() {
            let adj = step(cur, *d);
            if !world.is_loaded(adj.0, adj.1, adj.2) {
                continue;
            }
            let adj_light = world.get(adj.0, adj.1, adj.2, chan);
            if adj_light > 0 && adj_light < loc {
                queue.push_back(adj);
            } else if adj_light == LIGHT_MAX && i == DOWN && ch == LightChannel::Sky {
                // sky columns are positional, not distance decayed
                queue.push_back(adj);
            }
        }
    }
    let seeds = find_light(world, pos, ch);
    log::trace!(
        "remove_light {:?} at {:?}: {} cells cleared, {} reseeds",
        ch,
        pos,
        marked,
        seeds.len()
    );
    add_lights(world, reg, &seeds, ch);
}

/// Resets the sentinel region connected to `pos` to zero and collects the lit cells
/// bordering it as reseed sources.
pub fn find_light<V: Voxels + ?Sized>(world: &mut V, pos: Cell, ch: LightChannel) -> Vec<LightSeed> {
    let chan = ch.channel();
    let mut result = Vec::new();
    let mut queue: VecDeque<Cell> = VecDeque::new();
    world.set(pos.0, pos.1, pos.2, chan, 0);
    queue.push_back(pos);
    while let Some(cur) = queue.pop_front() {
        for d in NEIGHBORS.iter() {
            let adj = step(cur, *d);
            let adj_light = world.get(adj.0, adj.1, adj.2, chan);
            if adj_light == LIGHT_UNRESOLVED {
                world.set(adj.0, adj.1, adj.2, chan, 0);
                queue.push_back(adj);
            } else if adj_light > 0 && can_seed(world, adj) {
                result.push((adj, adj_light));
            }
        }
    }
    result
}

/// Zeroes `pos` and lets its neighbours' current light flow back in.
pub fn touch_light<V: Voxels + ?Sized>(
    world: &mut V,
    reg: &BlockRegistry,
    pos: Cell,
    ch: LightChannel,
) {
    let chan = ch.channel();
    world.set(pos.0, pos.1, pos.2, chan, 0);
    let seeds: Vec<LightSeed> = NEIGHBORS
        .iter()
        .map(|d| step(pos, *d))
        .filter(|adj| can_seed(world, *adj))
        .map(|adj| (adj, world.get(adj.0, adj.1, adj.2, chan)))
        .collect();
    add_lights(world, reg, &seeds, ch);
}
