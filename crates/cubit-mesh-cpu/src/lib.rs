//! CPU meshing: face-culled block geometry with per-vertex smooth light.
#![forbid(unsafe_code)]

mod budget;
mod builder;
mod mesh_build;
mod tables;

pub use budget::MeshBudget;
pub use builder::{MeshBuilder, MeshOptions, block_entity_mesh};
pub use cubit_geom::Face;
pub use mesh_build::MeshBuild;
pub use tables::{CROSS_CORNERS, FACE_CORNERS, atlas_uv};
