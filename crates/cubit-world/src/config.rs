use std::error::Error;
use std::fmt;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct WorldConfig {
    /// Chunk window edge; must be a power of two.
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_true")]
    pub smooth_lighting: bool,
    #[serde(default)]
    pub fluid_shaping: bool,
    #[serde(default = "default_mesh_budget_ms")]
    pub mesh_budget_ms: u64,
    /// Ticks between chunk saves.
    #[serde(default = "default_save_interval")]
    pub save_interval: u64,
}

fn default_window() -> usize {
    64
}
fn default_true() -> bool {
    true
}
fn default_mesh_budget_ms() -> u64 {
    10
}
fn default_save_interval() -> u64 {
    320
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            smooth_lighting: true,
            fluid_shaping: false,
            mesh_budget_ms: default_mesh_budget_ms(),
            save_interval: default_save_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    WindowNotPowerOfTwo(usize),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::WindowNotPowerOfTwo(n) => {
                write!(f, "chunk window size {n} is not a power of two")
            }
        }
    }
}

impl Error for WorldError {}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), WorldError> {
        if !self.window.is_power_of_two() {
            return Err(WorldError::WindowNotPowerOfTwo(self.window));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let cfg: WorldConfig = toml::from_str("window = 32\nsmooth_lighting = false\n").unwrap();
        assert_eq!(cfg.window, 32);
        assert!(!cfg.smooth_lighting);
        assert_eq!(cfg.save_interval, 320);
        assert_eq!(cfg.mesh_budget_ms, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn window_must_be_a_power_of_two() {
        let cfg = WorldConfig {
            window: 48,
            ..WorldConfig::default()
        };
        assert_eq!(cfg.validate(), Err(WorldError::WindowNotPowerOfTwo(48)));
    }
}
