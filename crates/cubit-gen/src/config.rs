use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    #[default]
    Simplex,
    Value,
    OpenSimplex2,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub seed: i32,
    #[serde(default)]
    pub terrain: TerrainParams,
    #[serde(default)]
    pub biome: BiomeParams,
}

impl WorldGenConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(src)?)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainParams {
    #[serde(default)]
    pub noise: NoiseKind,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_feature_size")]
    pub feature_size: f32,
    #[serde(default = "default_sea_level")]
    pub sea_level: i32,
    #[serde(default = "default_falloff")]
    pub falloff: f32,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    // Subsoil layers beneath the top block
    #[serde(default = "default_soil_depth")]
    pub soil_depth: u32,
    #[serde(default = "default_fill")]
    pub fill: String,
    #[serde(default = "default_top")]
    pub top: String,
    #[serde(default = "default_soil")]
    pub soil: String,
    #[serde(default = "default_base")]
    pub base: String,
}
fn default_octaves() -> u32 {
    6
}
fn default_feature_size() -> f32 {
    128.0
}
fn default_sea_level() -> i32 {
    64
}
fn default_falloff() -> f32 {
    256.0
}
fn default_threshold() -> f32 {
    0.5
}
fn default_soil_depth() -> u32 {
    3
}
fn default_fill() -> String {
    "stone".into()
}
fn default_top() -> String {
    "grass".into()
}
fn default_soil() -> String {
    "dirt".into()
}
fn default_base() -> String {
    "bedrock".into()
}
impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            noise: NoiseKind::Simplex,
            octaves: default_octaves(),
            feature_size: default_feature_size(),
            sea_level: default_sea_level(),
            falloff: default_falloff(),
            threshold: default_threshold(),
            soil_depth: default_soil_depth(),
            fill: default_fill(),
            top: default_top(),
            soil: default_soil(),
            base: default_base(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomeParams {
    #[serde(default)]
    pub noise: NoiseKind,
    #[serde(default = "default_biome_octaves")]
    pub octaves: u32,
    #[serde(default = "default_biome_size")]
    pub feature_size: f32,
}
fn default_biome_octaves() -> u32 {
    1
}
fn default_biome_size() -> f32 {
    16.0
}
impl Default for BiomeParams {
    fn default() -> Self {
        Self {
            noise: NoiseKind::Simplex,
            octaves: default_biome_octaves(),
            feature_size: default_biome_size(),
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<WorldGenConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: WorldGenConfig = toml::from_str(&s)?;
    Ok(cfg)
}
