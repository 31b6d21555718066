//! Grid kinematics: voxel ray traversal and per-axis box movement.
#![forbid(unsafe_code)]

mod collide;
mod ray;

pub use collide::{BISECT_TOLERANCE, colliding, move_box, terrain_obstacle};
pub use ray::{RayHit, Step, step_to_next_block, trace_ray};
