use serde::Deserialize;

use crate::types::{RenderPass, Shape, Tint};

// Top-level blocks config file
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlockDef {
    pub name: String,
    pub id: u8,
    // Light dimming in levels per step; 15 blocks light entirely
    #[serde(default)]
    pub opacity: Option<u8>,
    #[serde(default)]
    pub emission: Option<u8>,
    // Hides neighbouring faces when meshing
    #[serde(default)]
    pub solid: Option<bool>,
    // Collides with entity boxes
    #[serde(default)]
    pub physical: Option<bool>,
    #[serde(default)]
    pub draw_self_adjacent: Option<bool>,
    #[serde(default)]
    pub falls: Option<bool>,
    #[serde(default)]
    pub indestructible: Option<bool>,
    #[serde(default)]
    pub shape: Option<Shape>,
    #[serde(default)]
    pub pass: Option<RenderPass>,
    #[serde(default)]
    pub tint: Option<Tint>,
    #[serde(default)]
    pub tiles: Option<Vec<Vec<i16>>>,
    #[serde(default)]
    pub underlay: Option<LayerDef>,
    // Highest metadata level for fluid shaping
    #[serde(default)]
    pub max_level: Option<u8>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LayerDef {
    pub tiles: Vec<Vec<i16>>,
    #[serde(default)]
    pub tint: Option<Tint>,
}
