use std::error::Error;

use cubit_blocks::{AIR, BlockId, BlockRegistry};
use cubit_chunk::{Channel, Chunk, ChunkCoord, LIGHT_MAX, SX, SY, SZ};
use cubit_lighting::{LightChannel, LightSeed, add_lights};

use crate::config::{TerrainParams, WorldGenConfig};
use crate::noise::NoiseField;

#[derive(Clone, Copy, Debug)]
struct Palette {
    fill: BlockId,
    top: BlockId,
    soil: BlockId,
    base: BlockId,
}

/// Pure function of coordinate: the same config always yields the same chunk.
pub struct TerrainGen {
    params: TerrainParams,
    palette: Palette,
    density: NoiseField,
    biome: NoiseField,
}

fn resolve(reg: &BlockRegistry, name: &str) -> Result<BlockId, Box<dyn Error>> {
    reg.id_by_name(name)
        .ok_or_else(|| format!("worldgen block '{name}' is not in the block table").into())
}

/// Per-column tint field; meshing samples the same field generation uses.
pub fn biome_field(cfg: &WorldGenConfig) -> NoiseField {
    NoiseField::new(
        cfg.biome.noise,
        cfg.seed.wrapping_add(1),
        cfg.biome.octaves,
        cfg.biome.feature_size,
    )
}

impl TerrainGen {
    pub fn new(cfg: &WorldGenConfig, reg: &BlockRegistry) -> Result<Self, Box<dyn Error>> {
        let t = &cfg.terrain;
        let palette = Palette {
            fill: resolve(reg, &t.fill)?,
            top: resolve(reg, &t.top)?,
            soil: resolve(reg, &t.soil)?,
            base: resolve(reg, &t.base)?,
        };
        let density = NoiseField::new(t.noise, cfg.seed, t.octaves, t.feature_size);
        let biome = biome_field(cfg);
        Ok(Self {
            params: t.clone(),
            palette,
            density,
            biome,
        })
    }

    /// Noise minus the height falloff; solid above the threshold.
    #[inline]
    pub fn density(&self, x: i32, y: i32, z: i32) -> f32 {
        let n = self.density.sample(x as f32, y as f32, z as f32);
        n - (y - self.params.sea_level) as f32 / self.params.falloff
    }

    #[inline]
    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.density(x, y, z) > self.params.threshold
    }

    /// Grass tint factor for a column, in [0, 1].
    #[inline]
    pub fn biome(&self, x: i32, z: i32) -> f32 {
        self.biome.sample_2d(x as f32, z as f32)
    }

    pub fn generate(&self, reg: &BlockRegistry, coord: ChunkCoord) -> Chunk {
        let mut chunk = Chunk::new(coord);
        let (ox, oy, oz) = coord.origin();
        for x in 0..SX {
            for z in 0..SZ {
                for y in 0..SY {
                    if self.is_solid(ox + x as i32, oy + y as i32, oz + z as i32) {
                        chunk.set_local(x, y, z, Channel::Blocks, self.palette.fill as i32);
                    }
                }
            }
        }

        let soil_end = 1 + self.params.soil_depth;
        let mut sky: Vec<LightSeed> = Vec::new();
        let mut emitters: Vec<LightSeed> = Vec::new();
        for x in 0..SX {
            for z in 0..SZ {
                let mut depth = 0u32;
                for y in (0..SY).rev() {
                    let wy = oy + y as i32;
                    let world = (ox + x as i32, wy, oz + z as i32);
                    if chunk.block_local(x, y, z) == AIR {
                        depth = 0;
                        if y == SY - 1 {
                            sky.push((world, LIGHT_MAX));
                        }
                    } else {
                        depth += 1;
                    }
                    if depth == 1 {
                        chunk.set_local(x, y, z, Channel::Blocks, self.palette.top as i32);
                    } else if depth > 1 && depth <= soil_end {
                        chunk.set_local(x, y, z, Channel::Blocks, self.palette.soil as i32);
                    }
                    if wy == 0 {
                        chunk.set_local(x, y, z, Channel::Blocks, self.palette.base as i32);
                    }
                    let em = reg.emission(chunk.block_local(x, y, z));
                    if em > 0 {
                        emitters.push((world, em as i32));
                    }
                }
            }
        }
        add_lights(&mut chunk, reg, &sky, LightChannel::Sky);
        if !emitters.is_empty() {
            add_lights(&mut chunk, reg, &emitters, LightChannel::Block);
        }
        log::debug!(
            "generated chunk {} ({} open columns, {} emitters)",
            coord,
            sky.len(),
            emitters.len()
        );
        chunk
    }
}
