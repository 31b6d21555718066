use cubit_chunk::Voxels;
use cubit_geom::{Face, Vec3};

type Cell = (i32, i32, i32);

/// Result of one traversal step: distance travelled and the face of the
/// entered cell that was crossed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub len: f32,
    pub face: Face,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub block: Cell,
    /// Impact point relative to the hit cell's minimum corner.
    pub offset: Vec3,
    /// Face the ray entered through; `None` when the ray started inside the block.
    pub face: Option<Face>,
}

// Longer than any exit distance for a unit direction (max is sqrt(3)).
const NO_EXIT: f32 = 2.0;

/// Advances `block`/`offset` through the nearest cell wall along unit `dir`.
///
/// `offset` is the position inside `block`, each component in `[0, 1]`. Returns
/// `None` only for a zero direction.
pub fn step_to_next_block(block: &mut Cell, offset: &mut Vec3, dir: Vec3) -> Option<Step> {
    let mut best: Option<(f32, Face)> = None;
    for face in Face::ALL {
        let n = face.normal();
        let d = n.dot(dir);
        // only walls the ray moves toward
        if d >= 0.0 {
            continue;
        }
        let mut to = *offset;
        if n.x + n.y + n.z < 0.0 {
            to += n;
        }
        let t = -n.dot(to) / d;
        let limit = best.map_or(NO_EXIT, |(t, _)| t);
        if t >= 0.0 && t < limit {
            best = Some((t, face));
        }
    }
    let (t, face) = best?;
    let (dx, dy, dz) = face.delta();
    *block = (block.0 - dx, block.1 - dy, block.2 - dz);
    *offset += dir * t + face.normal();
    for axis in 0..3 {
        offset[axis] = offset[axis].clamp(0.0, 1.0);
    }
    Some(Step { len: t, face })
}

/// Walks cells from `start` along unit `dir` until a non-air block or `max_len`.
pub fn trace_ray<V: Voxels + ?Sized>(world: &V, start: Vec3, dir: Vec3, max_len: f32) -> Option<RayHit> {
    let mut block = start.floor_cell();
    let mut offset = start.fract_pos();
    let mut face = None;
    let mut total = 0.0;
    while world.block(block.0, block.1, block.2) == 0 && total < max_len {
        let step = step_to_next_block(&mut block, &mut offset, dir)?;
        total += step.len;
        face = Some(step.face);
    }
    if world.block(block.0, block.1, block.2) != 0 && total < max_len {
        Some(RayHit {
            block,
            offset,
            face,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_crosses_the_nearest_wall() {
        let mut block = (0, 0, 0);
        let mut offset = Vec3::new(0.25, 0.5, 0.5);
        let step = step_to_next_block(&mut block, &mut offset, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(block, (1, 0, 0));
        assert!((step.len - 0.75).abs() < 1e-6);
        assert_eq!(step.face, Face::NegX);
        assert!(offset.x.abs() < 1e-6);
        assert!((offset.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn step_downward_enters_through_top() {
        let mut block = (3, 10, 3);
        let mut offset = Vec3::new(0.5, 0.5, 0.5);
        let step = step_to_next_block(&mut block, &mut offset, Vec3::new(0.0, -1.0, 0.0)).unwrap();
        assert_eq!(block, (3, 9, 3));
        assert_eq!(step.face, Face::PosY);
        assert!((offset.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_direction_does_not_step() {
        let mut block = (0, 0, 0);
        let mut offset = Vec3::splat(0.5);
        assert!(step_to_next_block(&mut block, &mut offset, Vec3::ZERO).is_none());
        assert_eq!(block, (0, 0, 0));
    }
}
