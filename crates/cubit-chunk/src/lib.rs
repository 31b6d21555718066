//! Chunk storage: four dense channels per chunk plus coordinate transforms.
#![forbid(unsafe_code)]

mod chunk;
mod record;

pub use chunk::{Chunk, MeshHandle, RenderCube};
pub use record::{ChunkError, ChunkRecord};

use cubit_blocks::BlockId;
use serde::{Deserialize, Serialize};

pub const SX: usize = 16;
pub const SY: usize = 128;
pub const SZ: usize = 16;
pub const CHUNK_VOLUME: usize = SX * SY * SZ;

/// Edge length of a rendering cube (the remeshing unit).
pub const RENDER_CUBE: usize = 16;
pub const CUBES_X: usize = SX / RENDER_CUBE;
pub const CUBES_Y: usize = SY / RENDER_CUBE;
pub const CUBES_Z: usize = SZ / RENDER_CUBE;
pub const CUBES_PER_CHUNK: usize = CUBES_X * CUBES_Y * CUBES_Z;

pub const LIGHT_MAX: i32 = 15;
/// Transient retraction marker; never rendered or persisted.
pub const LIGHT_UNRESOLVED: i32 = -1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Chunk containing a world cell (floor division, valid for negatives).
    #[inline]
    pub fn containing(x: i32, y: i32, z: i32) -> Self {
        Self {
            cx: x.div_euclid(SX as i32),
            cy: y.div_euclid(SY as i32),
            cz: z.div_euclid(SZ as i32),
        }
    }

    /// Chunk-local offsets of a world cell, always non-negative.
    #[inline]
    pub fn local(x: i32, y: i32, z: i32) -> (usize, usize, usize) {
        (
            x.rem_euclid(SX as i32) as usize,
            y.rem_euclid(SY as i32) as usize,
            z.rem_euclid(SZ as i32) as usize,
        )
    }

    /// World coordinate of the chunk's minimum corner.
    #[inline]
    pub fn origin(self) -> (i32, i32, i32) {
        (
            self.cx * SX as i32,
            self.cy * SY as i32,
            self.cz * SZ as i32,
        )
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.cx, self.cy, self.cz)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Blocks,
    Metadata,
    SkyLight,
    BlockLight,
}

impl Channel {
    /// Value read from absent chunks: open sky, otherwise empty and dark.
    #[inline]
    pub fn default_value(self) -> i32 {
        match self {
            Channel::SkyLight => LIGHT_MAX,
            _ => 0,
        }
    }
}

/// Global-coordinate voxel access shared by lighting, meshing, and physics.
///
/// Reads from unloaded space return [`Channel::default_value`]; writes there are dropped.
pub trait Voxels {
    fn get(&self, x: i32, y: i32, z: i32, ch: Channel) -> i32;
    fn set(&mut self, x: i32, y: i32, z: i32, ch: Channel, value: i32);
    fn is_loaded(&self, x: i32, y: i32, z: i32) -> bool;

    #[inline]
    fn block(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.get(x, y, z, Channel::Blocks) as BlockId
    }
}
