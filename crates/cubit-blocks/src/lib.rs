//! Block type table: per-id light, collision, and rendering attributes.
#![forbid(unsafe_code)]

pub mod config;
pub mod registry;
pub mod types;

pub use registry::{BlockRegistry, BlockType, RegistryError};
pub use types::{AIR, Block, BlockId, FaceTable, Layer, RenderPass, Shape, Tint};
