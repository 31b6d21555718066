use serde::{Deserialize, Serialize};

pub type BlockId = u8;

pub const AIR: BlockId = 0;

/// A block id together with its metadata byte.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub data: u8,
}

impl Block {
    pub const AIR: Block = Block { id: AIR, data: 0 };

    #[inline]
    pub const fn new(id: BlockId, data: u8) -> Self {
        Self { id, data }
    }
}

// Shape decides which emitter the mesher uses
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    #[default]
    Cube,
    Cross,
    Fluid,
    None,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPass {
    #[default]
    Opaque = 0,
    Translucent = 1,
}

impl RenderPass {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Material color mode. Biome-tinted faces are colored `[biome, 1, 0]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tint {
    #[default]
    None,
    Biome,
    BiomeTop,
}

impl Tint {
    /// Face indices follow the mesher order: 0 = +Y, 1 = -Y, then sides.
    #[inline]
    pub fn color(self, face: usize, biome: f32) -> [f32; 3] {
        match self {
            Tint::Biome => [biome, 1.0, 0.0],
            Tint::BiomeTop if face == 0 => [biome, 1.0, 0.0],
            _ => [1.0, 1.0, 1.0],
        }
    }
}

/// Atlas tiles per face, one row per metadata variant.
///
/// Rows shorter than six entries repeat cyclically; a negative entry skips the face.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceTable {
    rows: Vec<Vec<i16>>,
}

impl FaceTable {
    pub fn new(rows: Vec<Vec<i16>>) -> Self {
        let rows = rows.into_iter().filter(|r| !r.is_empty()).collect();
        Self { rows }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn variants(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn tile(&self, face: usize, data: u8) -> Option<u16> {
        if self.rows.is_empty() {
            return None;
        }
        let row = &self.rows[data as usize % self.rows.len()];
        let t = row[face % row.len()];
        if t < 0 { None } else { Some(t as u16) }
    }
}

/// Extra face layer drawn beneath a block at the same position (e.g. tinted grass sides).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layer {
    pub tiles: FaceTable,
    pub tint: Tint,
}
