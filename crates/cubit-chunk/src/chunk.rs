use cubit_blocks::BlockId;

use crate::{
    CHUNK_VOLUME, CUBES_PER_CHUNK, CUBES_Y, CUBES_Z, Channel, ChunkCoord, LIGHT_UNRESOLVED,
    RENDER_CUBE, SX, SY, SZ, Voxels,
};

/// Index of a slot in the mesh arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderCube {
    pub mesh: Option<MeshHandle>,
    pub dirty: bool,
}

#[derive(Clone, Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    blocks: Vec<u8>,
    metadata: Vec<u8>,
    sky: Vec<i8>,
    block_light: Vec<i8>,
    cubes: [RenderCube; CUBES_PER_CHUNK],
}

impl Chunk {
    /// All air, all dark.
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            blocks: vec![0; CHUNK_VOLUME],
            metadata: vec![0; CHUNK_VOLUME],
            sky: vec![0; CHUNK_VOLUME],
            block_light: vec![0; CHUNK_VOLUME],
            cubes: [RenderCube::default(); CUBES_PER_CHUNK],
        }
    }

    pub(crate) fn from_parts(
        coord: ChunkCoord,
        blocks: Vec<u8>,
        metadata: Vec<u8>,
        sky: Vec<i8>,
        block_light: Vec<i8>,
    ) -> Self {
        Self {
            coord,
            blocks,
            metadata,
            sky,
            block_light,
            cubes: [RenderCube::default(); CUBES_PER_CHUNK],
        }
    }

    // Y-major so vertical scans stay contiguous
    #[inline]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < SX && y < SY && z < SZ, "local ({x},{y},{z}) out of range");
        y + z * SY + x * SY * SZ
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize, ch: Channel) -> i32 {
        let i = Self::index(x, y, z);
        match ch {
            Channel::Blocks => self.blocks[i] as i32,
            Channel::Metadata => self.metadata[i] as i32,
            Channel::SkyLight => self.sky[i] as i32,
            Channel::BlockLight => self.block_light[i] as i32,
        }
    }

    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, ch: Channel, value: i32) {
        let i = Self::index(x, y, z);
        match ch {
            Channel::Blocks => self.blocks[i] = value as u8,
            Channel::Metadata => self.metadata[i] = value as u8,
            Channel::SkyLight => self.sky[i] = value as i8,
            Channel::BlockLight => self.block_light[i] = value as i8,
        }
    }

    #[inline]
    pub fn block_local(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::index(x, y, z)]
    }

    pub fn contains_world(&self, x: i32, y: i32, z: i32) -> bool {
        ChunkCoord::containing(x, y, z) == self.coord
    }

    /// True while a retraction pass has left sentinel values behind.
    pub fn has_unresolved_light(&self) -> bool {
        let s = LIGHT_UNRESOLVED as i8;
        self.sky.iter().chain(self.block_light.iter()).any(|&v| v == s)
    }

    #[inline]
    pub fn cube_index(x: usize, y: usize, z: usize) -> usize {
        let (x, y, z) = (x / RENDER_CUBE, y / RENDER_CUBE, z / RENDER_CUBE);
        y + z * CUBES_Y + x * CUBES_Y * CUBES_Z
    }

    /// Local minimum corner of a rendering cube.
    #[inline]
    pub fn cube_origin(index: usize) -> (usize, usize, usize) {
        let y = index % CUBES_Y;
        let z = (index / CUBES_Y) % CUBES_Z;
        let x = index / (CUBES_Y * CUBES_Z);
        (x * RENDER_CUBE, y * RENDER_CUBE, z * RENDER_CUBE)
    }

    #[inline]
    pub fn cube(&self, index: usize) -> &RenderCube {
        &self.cubes[index]
    }

    #[inline]
    pub fn cube_mut(&mut self, index: usize) -> &mut RenderCube {
        &mut self.cubes[index]
    }

    pub fn cubes(&self) -> impl Iterator<Item = (usize, &RenderCube)> {
        self.cubes.iter().enumerate()
    }

    /// Marks the rendering cube holding a local cell as needing a rebuild.
    pub fn touch_local(&mut self, x: usize, y: usize, z: usize) {
        self.cubes[Self::cube_index(x, y, z)].dirty = true;
    }

    pub(crate) fn channels(&self) -> (&[u8], &[u8], &[i8], &[i8]) {
        (&self.blocks, &self.metadata, &self.sky, &self.block_light)
    }
}

impl Voxels for Chunk {
    fn get(&self, x: i32, y: i32, z: i32, ch: Channel) -> i32 {
        if !self.contains_world(x, y, z) {
            return ch.default_value();
        }
        let (lx, ly, lz) = ChunkCoord::local(x, y, z);
        self.get_local(lx, ly, lz, ch)
    }

    fn set(&mut self, x: i32, y: i32, z: i32, ch: Channel, value: i32) {
        if !self.contains_world(x, y, z) {
            return;
        }
        let (lx, ly, lz) = ChunkCoord::local(x, y, z);
        self.set_local(lx, ly, lz, ch, value);
    }

    fn is_loaded(&self, x: i32, y: i32, z: i32) -> bool {
        self.contains_world(x, y, z)
    }
}
