//! Noise fields and deterministic terrain generation.
#![forbid(unsafe_code)]

pub mod config;
mod noise;
mod simplex;
mod terrain;
mod value;

pub use config::{BiomeParams, NoiseKind, TerrainParams, WorldGenConfig, load_config_from_path};
pub use noise::NoiseField;
pub use terrain::{TerrainGen, biome_field};
