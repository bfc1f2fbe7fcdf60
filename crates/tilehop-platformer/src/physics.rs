use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tolerance used by overlap tests to ignore floating-point noise.
pub const EPS: f32 = 1.0 / 1024.0;
/// Player bounding box (width, height) in tiles.
pub const PLAYER_SIZE: Vec2 = Vec2::new(1.0, 2.0);
/// Gravity acceleration (tiles/s^2, downward is +y).
pub const DEFAULT_GRAVITY: f32 = 20.0;
/// Physics ticks per second.
pub const PHYSICS_FPS: u32 = 60;
/// Upper bound on ticks run for a single rendered frame.
pub const MAX_TICKS_PER_FRAME: u32 = 8;

/// Initial upward speed of a jump or double jump.
pub const JUMP_VEL: f32 = 13.0;
/// Acceleration while walking in the direction of motion.
pub const WALK_ACC: f32 = 16.0;
/// Deceleration while walking against the direction of motion.
pub const WALK_DEC: f32 = 32.0;
/// Walking speed cap.
pub const WALK_VEL: f32 = 20.0;
/// Ticks after leaving the ground during which a jump still counts as grounded.
pub const COYOTE_FRAMES: u32 = 2;
/// Upward speed while flying (debug builds only bind the key).
pub const FLY_SPEED: f32 = 10.0;

/// Player movement tuning, loadable from the `[player]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub jump_vel: f32,
    pub walk_acc: f32,
    pub walk_dec: f32,
    pub walk_vel: f32,
    pub coyote_frames: u32,
    pub fly_speed: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            jump_vel: JUMP_VEL,
            walk_acc: WALK_ACC,
            walk_dec: WALK_DEC,
            walk_vel: WALK_VEL,
            coyote_frames: COYOTE_FRAMES,
            fly_speed: FLY_SPEED,
        }
    }
}

/// Move `v` toward zero by `amount`, stopping at zero instead of overshooting.
pub fn approach_zero(v: f32, amount: f32) -> f32 {
    if v.abs() <= amount {
        0.0
    } else {
        v - amount.copysign(v)
    }
}
