use cubit_blocks::BlockRegistry;
use cubit_chunk::Voxels;
use cubit_geom::{Aabb, Vec3};

/// Bisection stops once the bracket is narrower than this.
pub const BISECT_TOLERANCE: f32 = 0.0005;

/// Blocking predicate over the loaded world: a column whose chunk is absent
/// blocks movement, otherwise physical blocks do.
pub fn terrain_obstacle<'a, V: Voxels + ?Sized>(
    world: &'a V,
    reg: &'a BlockRegistry,
) -> impl Fn(i32, i32, i32) -> bool + 'a {
    move |x, y, z| !world.is_loaded(x, 0, z) || reg.is_physical(world.block(x, y, z))
}

/// True when any cell under a box of `size` centred at `pos` is blocked.
pub fn colliding<F>(blocked: &F, pos: Vec3, size: Vec3) -> bool
where
    F: Fn(i32, i32, i32) -> bool + ?Sized,
{
    Aabb::from_center_size(pos, size)
        .cells()
        .any(|(x, y, z)| blocked(x, y, z))
}

/// Integrates `vel` into `pos` one axis at a time, stopping each axis at the
/// last free position found by bisection. Returns true when a downward move
/// was stopped.
///
/// With `sneak` set, horizontal moves that would leave the supporting ground
/// are refused.
pub fn move_box<F>(blocked: &F, size: Vec3, pos: &mut Vec3, vel: &mut Vec3, sneak: bool) -> bool
where
    F: Fn(i32, i32, i32) -> bool + ?Sized,
{
    let mut ground = false;
    let ahead_x = Vec3::new(pos.x + vel.x, pos.y, pos.z);
    let order = if colliding(blocked, ahead_x, size) {
        [2, 0, 1]
    } else {
        [0, 2, 1]
    };
    let keep_footing = sneak && vel.y < 0.0 && colliding(blocked, Vec3::new(pos.x, pos.y + vel.y, pos.z), size);
    for axis in order {
        let fall = vel.y;
        let hits = |p: Vec3| {
            colliding(blocked, p, size)
                || (keep_footing && axis != 1 && !colliding(blocked, Vec3::new(p.x, p.y + fall, p.z), size))
        };
        let mut start = pos[axis];
        let mut end = start + vel[axis];
        let mut probe = *pos;
        probe[axis] = end;
        if !hits(probe) {
            pos[axis] = end;
            continue;
        }
        if axis == 1 && vel[axis] < 0.0 {
            ground = true;
        }
        vel[axis] = 0.0;
        loop {
            let mid = (start + end) / 2.0;
            probe[axis] = mid;
            if hits(probe) {
                end = mid;
            } else {
                start = mid;
            }
            if (start - end).abs() <= BISECT_TOLERANCE {
                break;
            }
        }
        pos[axis] = start;
        log::trace!("move_box: axis {axis} blocked, settled at {start:.4}");
    }
    ground
}
