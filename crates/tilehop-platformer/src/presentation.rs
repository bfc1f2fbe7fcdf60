use glam::Vec2;

use tilehop_core::geom::Rect;

use crate::physics::PLAYER_SIZE;
use crate::player::{JumpState, Player};

/// Distance the player may drift from the camera target before it follows.
pub const CAMERA_DEAD_ZONE: f32 = 4.0;
/// Time constant of the follow motion, in seconds.
pub const CAMERA_FOLLOW: f32 = 0.5;
/// Once triggered, the camera keeps moving for at least this long.
pub const CAMERA_MIN_MOVE_TIME: f32 = 0.25;

/// What a renderer needs to draw the player for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    /// Interpolated bounding box.
    pub rect: Rect,
    pub jumpstate: JumpState,
}

impl PlayerView {
    /// Snapshot `player` blended `alpha` of the way from its previous tick.
    pub fn of(player: &Player, alpha: f32) -> Self {
        let pos = player.interpolated_pos(alpha);
        Self {
            rect: Rect::new(
                pos.x - PLAYER_SIZE.x / 2.0,
                pos.y - PLAYER_SIZE.y,
                PLAYER_SIZE.x,
                PLAYER_SIZE.y,
            ),
            jumpstate: player.jumpstate(),
        }
    }
}

/// Lazy camera that trails the player once it leaves a dead zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    target: Vec2,
    move_time: f32,
}

impl Camera {
    pub fn new(target: Vec2) -> Self {
        Self {
            target,
            move_time: 0.0,
        }
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Jump straight to `target`, e.g. after a respawn far away.
    pub fn snap(&mut self, target: Vec2) {
        self.target = target;
        self.move_time = 0.0;
    }

    /// Advance by one rendered frame of `dt` seconds towards `focus`.
    pub fn follow(&mut self, focus: Vec2, dt: f32) {
        let d = focus - self.target;
        let v = d / CAMERA_FOLLOW;
        self.move_time -= dt;
        if d.length_squared() > CAMERA_DEAD_ZONE * CAMERA_DEAD_ZONE {
            self.move_time = CAMERA_MIN_MOVE_TIME;
            self.target += v * dt;
        } else if self.move_time > 0.0 {
            self.target += v * dt;
        }
    }
}
