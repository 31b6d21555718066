use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use std::collections::HashMap;

use super::config::{BlockDef, BlocksConfig};
use super::types::{AIR, BlockId, FaceTable, Layer, RenderPass, Shape, Tint};

const BUILTIN_BLOCKS: &str = include_str!("../blocks.toml");

pub const MAX_LIGHT: u8 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateId(BlockId),
    DuplicateName(String),
    AirRedefined(String),
    LightOutOfRange { name: String, value: u8 },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateId(id) => write!(f, "block id {id} defined twice"),
            RegistryError::DuplicateName(n) => write!(f, "block name '{n}' defined twice"),
            RegistryError::AirRedefined(n) => {
                write!(f, "block '{n}' uses id 0, which is reserved for air")
            }
            RegistryError::LightOutOfRange { name, value } => {
                write!(f, "block '{name}' has light value {value} above {MAX_LIGHT}")
            }
        }
    }
}

impl Error for RegistryError {}

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub opacity: u8,
    pub emission: u8,
    pub solid: bool,
    pub physical: bool,
    pub draw_self_adjacent: bool,
    pub falls: bool,
    pub indestructible: bool,
    pub shape: Shape,
    pub pass: RenderPass,
    pub tint: Tint,
    pub tiles: FaceTable,
    pub underlay: Option<Layer>,
    pub max_level: u8,
}

impl BlockType {
    fn air() -> Self {
        Self {
            id: AIR,
            name: "air".into(),
            opacity: 0,
            emission: 0,
            solid: false,
            physical: false,
            draw_self_adjacent: true,
            falls: false,
            indestructible: false,
            shape: Shape::None,
            pass: RenderPass::Opaque,
            tint: Tint::None,
            tiles: FaceTable::default(),
            underlay: None,
            max_level: 0,
        }
    }

    // Ids without a definition behave as an untextured opaque cube.
    fn unknown(id: BlockId) -> Self {
        Self {
            id,
            name: String::new(),
            opacity: MAX_LIGHT,
            emission: 0,
            solid: true,
            physical: true,
            draw_self_adjacent: false,
            falls: false,
            indestructible: false,
            shape: Shape::Cube,
            pass: RenderPass::Opaque,
            tint: Tint::None,
            tiles: FaceTable::default(),
            underlay: None,
            max_level: 0,
        }
    }

    fn from_def(def: BlockDef) -> Self {
        let shape = def.shape.unwrap_or_default();
        let solid = def.solid.unwrap_or(shape == Shape::Cube);
        Self {
            id: def.id,
            name: def.name,
            opacity: def.opacity.unwrap_or(MAX_LIGHT),
            emission: def.emission.unwrap_or(0),
            solid,
            physical: def.physical.unwrap_or(shape != Shape::Cross),
            draw_self_adjacent: def.draw_self_adjacent.unwrap_or(false),
            falls: def.falls.unwrap_or(false),
            indestructible: def.indestructible.unwrap_or(false),
            shape,
            pass: def.pass.unwrap_or_default(),
            tint: def.tint.unwrap_or_default(),
            tiles: FaceTable::new(def.tiles.unwrap_or_default()),
            underlay: def.underlay.map(|l| Layer {
                tiles: FaceTable::new(l.tiles),
                tint: l.tint.unwrap_or_default(),
            }),
            max_level: def.max_level.unwrap_or(8).max(1),
        }
    }

    #[inline]
    pub fn is_air(&self) -> bool {
        self.id == AIR
    }

    #[inline]
    pub fn tile(&self, face: usize, data: u8) -> Option<u16> {
        self.tiles.tile(face, data)
    }

    #[inline]
    pub fn face_color(&self, face: usize, biome: f32) -> [f32; 3] {
        self.tint.color(face, biome)
    }
}

/// Dense table indexed by block id. Every id resolves to some type.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Air plus 255 unknown ids.
    pub fn new() -> Self {
        let mut blocks = Vec::with_capacity(256);
        blocks.push(BlockType::air());
        for id in 1..=255u8 {
            blocks.push(BlockType::unknown(id));
        }
        let mut by_name = HashMap::new();
        by_name.insert("air".to_string(), AIR);
        Self { blocks, by_name }
    }

    /// The default block table shipped with the crate.
    pub fn builtin() -> Result<Self, Box<dyn Error>> {
        Self::from_toml_str(BUILTIN_BLOCKS)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(src)?;
        Ok(Self::from_config(cfg)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let src = fs::read_to_string(path.as_ref())?;
        let reg = Self::from_toml_str(&src)?;
        log::info!(
            "loaded {} block types from {}",
            reg.by_name.len().saturating_sub(1),
            path.as_ref().display()
        );
        Ok(reg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, RegistryError> {
        let mut reg = Self::new();
        let mut defined = [false; 256];
        for def in cfg.blocks.into_iter() {
            if def.id == AIR {
                if def.name == "air" {
                    continue;
                }
                return Err(RegistryError::AirRedefined(def.name));
            }
            if defined[def.id as usize] {
                return Err(RegistryError::DuplicateId(def.id));
            }
            if reg.by_name.contains_key(&def.name) {
                return Err(RegistryError::DuplicateName(def.name));
            }
            for value in [def.opacity, def.emission].into_iter().flatten() {
                if value > MAX_LIGHT {
                    return Err(RegistryError::LightOutOfRange {
                        name: def.name,
                        value,
                    });
                }
            }
            defined[def.id as usize] = true;
            let ty = BlockType::from_def(def);
            reg.by_name.insert(ty.name.clone(), ty.id);
            let slot = ty.id as usize;
            reg.blocks[slot] = ty;
        }
        Ok(reg)
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> &BlockType {
        &self.blocks[id as usize]
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn opacity(&self, id: BlockId) -> u8 {
        self.get(id).opacity
    }

    #[inline]
    pub fn emission(&self, id: BlockId) -> u8 {
        self.get(id).emission
    }

    #[inline]
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.get(id).solid
    }

    #[inline]
    pub fn is_physical(&self, id: BlockId) -> bool {
        self.get(id).physical
    }

    #[inline]
    pub fn falls(&self, id: BlockId) -> bool {
        self.get(id).falls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses() {
        let reg = BlockRegistry::builtin().expect("builtin blocks");
        assert_eq!(reg.id_by_name("stone"), Some(1));
        assert_eq!(reg.opacity(0), 0);
        assert_eq!(reg.opacity(18), 3);
        assert_eq!(reg.emission(89), 15);
        assert!(reg.falls(12) && reg.falls(13));
        assert!(!reg.is_solid(20));
        assert!(reg.is_physical(8));
        assert!(!reg.is_physical(6));
    }

    #[test]
    fn unknown_ids_are_opaque_cubes() {
        let reg = BlockRegistry::builtin().expect("builtin blocks");
        let ty = reg.get(200);
        assert_eq!(ty.opacity, MAX_LIGHT);
        assert!(ty.solid && ty.physical);
        assert_eq!(ty.tile(0, 0), None);
    }
}
