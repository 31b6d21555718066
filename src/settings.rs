use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use cubit_world::WorldConfig;
use serde::Deserialize;

/// Contents of `cubit.toml`.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub world: WorldConfig,
    /// Mesh radius around the player, in rendering cubes.
    #[serde(default = "default_draw_dist")]
    pub draw_dist: i32,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Generation threads; 0 uses every core.
    #[serde(default)]
    pub workers: usize,
    /// Directory for chunk files; chunks stay in memory when unset.
    #[serde(default)]
    pub archive: Option<PathBuf>,
    /// Ticks between scripted block edits.
    #[serde(default = "default_edit_every")]
    pub edit_every: u64,
}

fn default_draw_dist() -> i32 {
    3
}
fn default_ticks() -> u64 {
    640
}
fn default_edit_every() -> u64 {
    16
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            draw_dist: default_draw_dist(),
            ticks: default_ticks(),
            workers: 0,
            archive: None,
            edit_every: default_edit_every(),
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: SessionConfig = toml::from_str(src)?;
        cfg.world.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}
