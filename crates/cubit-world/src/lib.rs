//! Windowed chunk store with block edits, light upkeep, mesh scheduling and entities.
#![forbid(unsafe_code)]

mod config;
mod entity;
mod meshes;
mod save;
mod window;
mod world;

pub use config::{WorldConfig, WorldError};
pub use entity::{
    AIR_CONTROL, Entity, GRAVITY, GROUND_DRAG, JUMP_STRENGTH, PLAYER_SIZE, PUSH_APART,
    WALK_STRENGTH,
};
pub use meshes::{CubeKey, MeshArena};
pub use save::SaveQueue;
pub use window::{ChunkSlot, ChunkStatus, ChunkWindow, SlotState, WindowEvent};
pub use world::{Cell, ChunkRef, SPAWN, World, WorldStats};
