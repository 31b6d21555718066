use cubit_blocks::Block;
use cubit_geom::{Aabb, Vec3};

pub const WALK_STRENGTH: f32 = 31.25 / 700.0;
pub const JUMP_STRENGTH: f32 = 31.25 / 110.0;
/// Per-tick vertical acceleration at 32 ticks per second.
pub const GRAVITY: f32 = -9.8 / 320.0;
pub const GROUND_DRAG: f32 = 0.7;
pub const AIR_CONTROL: f32 = 0.025;
pub const PUSH_APART: f32 = 0.05;
const SNEAK_FACTOR: f32 = 0.25;

pub const PLAYER_SIZE: Vec3 = Vec3::new(0.6, 1.7, 0.6);

/// A moving box. `payload` marks a falling block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entity {
    pub size: Vec3,
    pub pos: Vec3,
    pub vel: Vec3,
    pub walk_force: Vec3,
    pub sneak: bool,
    pub on_ground: bool,
    pub payload: Option<Block>,
}

impl Entity {
    pub fn player(pos: Vec3) -> Self {
        Self {
            size: PLAYER_SIZE,
            pos,
            vel: Vec3::ZERO,
            walk_force: Vec3::ZERO,
            sneak: false,
            on_ground: false,
            payload: None,
        }
    }

    /// Unit box centred on `cell`, at rest.
    pub fn falling_block(cell: (i32, i32, i32), block: Block) -> Self {
        Self {
            size: Vec3::ONE,
            pos: Vec3::from_cell(cell.0, cell.1, cell.2) + Vec3::splat(0.5),
            vel: Vec3::ZERO,
            walk_force: Vec3::ZERO,
            sneak: false,
            on_ground: false,
            payload: Some(block),
        }
    }

    /// Sets the walking force from a desired direction; only its horizontal part is used.
    pub fn steer(&mut self, dir: Vec3, jump: bool, sneak: bool) {
        let flat = Vec3::new(dir.x, 0.0, dir.z).normalized();
        let strength = if sneak { WALK_STRENGTH * SNEAK_FACTOR } else { WALK_STRENGTH };
        let mut force = flat * strength;
        if jump {
            force.y = JUMP_STRENGTH;
        }
        self.walk_force = force;
        self.sneak = sneak;
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.pos, self.size)
    }

    #[inline]
    pub fn is_falling_block(&self) -> bool {
        self.payload.is_some()
    }

    /// Applies walking force and gravity for one tick.
    pub(crate) fn accelerate(&mut self) {
        if self.on_ground {
            self.vel = self.vel * GROUND_DRAG;
            self.vel += self.walk_force;
        } else {
            self.vel += self.walk_force * AIR_CONTROL;
        }
        self.vel.y += GRAVITY;
    }

    /// Nudges `self` away from `other` when their boxes are closer than half their
    /// combined extent.
    pub(crate) fn push_from(&mut self, other: &Entity) {
        let diff = self.pos - other.pos;
        let sum = self.size + other.size;
        let rel = Vec3::new(diff.x / sum.x, diff.y / sum.y, diff.z / sum.z) * 2.0;
        if rel.length() < 1.0 && diff.length() > 0.0 {
            self.vel += diff.normalized() * PUSH_APART;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falling_block_is_centred_and_still() {
        let e = Entity::falling_block((3, 70, -2), Block::new(12, 0));
        assert_eq!(e.pos, Vec3::new(3.5, 70.5, -1.5));
        assert_eq!(e.vel, Vec3::ZERO);
        assert_eq!(e.aabb().min, Vec3::new(3.0, 70.0, -2.0));
        assert!(e.is_falling_block());
    }

    #[test]
    fn sneaking_walks_at_a_quarter() {
        let mut e = Entity::player(Vec3::ZERO);
        e.steer(Vec3::new(3.0, 5.0, 0.0), false, true);
        assert!((e.walk_force.x - WALK_STRENGTH * 0.25).abs() < 1e-7);
        assert_eq!(e.walk_force.y, 0.0);
        e.steer(Vec3::ZERO, true, false);
        assert_eq!(e.walk_force, Vec3::new(0.0, JUMP_STRENGTH, 0.0));
    }

    #[test]
    fn ground_drag_then_walk_then_gravity() {
        let mut e = Entity::player(Vec3::ZERO);
        e.on_ground = true;
        e.vel = Vec3::new(1.0, 0.0, 0.0);
        e.walk_force = Vec3::new(0.0, 0.0, 0.5);
        e.accelerate();
        assert!((e.vel.x - 0.7).abs() < 1e-6);
        assert!((e.vel.z - 0.5).abs() < 1e-6);
        assert!((e.vel.y - GRAVITY).abs() < 1e-7);
    }

    #[test]
    fn overlapping_boxes_push_apart() {
        let mut a = Entity::player(Vec3::new(0.2, 0.0, 0.0));
        let b = Entity::player(Vec3::ZERO);
        a.push_from(&b);
        assert!((a.vel.x - PUSH_APART).abs() < 1e-6);

        let mut far = Entity::player(Vec3::new(5.0, 0.0, 0.0));
        far.push_from(&b);
        assert_eq!(far.vel, Vec3::ZERO);
    }
}
