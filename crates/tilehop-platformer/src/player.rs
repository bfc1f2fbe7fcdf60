use glam::Vec2;
use serde::{Deserialize, Serialize};

use tilehop_core::geom::{Rect, collide};
use tilehop_core::intent::MotionIntent;
use tilehop_core::stats::PlayerStats;

use crate::grid::TileGrid;
use crate::physics::{EPS, PLAYER_SIZE, PlayerTuning, approach_zero};
use crate::tile::{DEFAULT_FRICTION, Tile, TileKind};

/// Jump progression. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JumpState {
    Grounded,
    #[default]
    Airborne,
    DoubleJumped,
    Slamming,
}

/// Something the level has to react to after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    /// Touched a danger tile or was killed on request; respawn.
    Killed,
    /// Touched a goal tile; show the win screen.
    LevelCompleted,
    /// Touched a checkpoint tile at this world position.
    CheckpointReached(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// The player character.
///
/// `pos` is the bottom-centre of the bounding box (the feet).
#[derive(Debug, Clone)]
pub struct Player {
    prev_pos: Vec2,
    pos: Vec2,
    vel: Vec2,
    inputs: MotionIntent,
    jumpstate: JumpState,
    killed: bool,
    level_completed: bool,
    coyote_frames_left: u32,
    stats: PlayerStats,
    tuning: PlayerTuning,
}

impl Player {
    /// Create a player and spawn it at `pos`.
    pub fn new(pos: Vec2, tuning: PlayerTuning) -> Self {
        let mut player = Self {
            prev_pos: pos,
            pos,
            vel: Vec2::ZERO,
            inputs: MotionIntent::empty(),
            jumpstate: JumpState::Airborne,
            killed: false,
            level_completed: false,
            coyote_frames_left: 0,
            stats: PlayerStats::default(),
            tuning,
        };
        player.spawn(pos);
        player
    }

    /// Reset motion state at `pos`. Counters are kept.
    pub fn spawn(&mut self, pos: Vec2) {
        self.prev_pos = pos;
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.inputs = MotionIntent::empty();
        self.jumpstate = JumpState::Airborne;
        self.coyote_frames_left = 0;
        self.killed = false;
        self.level_completed = false;
        self.stats.times_spawned += 1;
    }

    /// Kill the player. A death is only counted once per life.
    pub fn kill(&mut self) {
        if !self.killed {
            self.killed = true;
            self.stats.deaths += 1;
            tracing::debug!(x = self.pos.x, y = self.pos.y, "player killed");
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn prev_pos(&self) -> Vec2 {
        self.prev_pos
    }

    pub fn vel(&self) -> Vec2 {
        self.vel
    }

    pub fn jumpstate(&self) -> JumpState {
        self.jumpstate
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn level_completed(&self) -> bool {
        self.level_completed
    }

    pub fn tuning(&self) -> &PlayerTuning {
        &self.tuning
    }

    /// Bounding box in world coordinates.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.pos.x - PLAYER_SIZE.x / 2.0,
            self.pos.y - PLAYER_SIZE.y,
            PLAYER_SIZE.x,
            PLAYER_SIZE.y,
        )
    }

    /// Position between the last two ticks, `alpha` in `[0, 1]`.
    pub fn interpolated_pos(&self, alpha: f32) -> Vec2 {
        self.prev_pos.lerp(self.pos, alpha.clamp(0.0, 1.0))
    }

    /// Whether the feet rest on the world floor or on top of a solid tile.
    pub fn on_ground<G: TileGrid>(&self, grid: &G) -> bool {
        self.ground_friction(grid).is_some()
    }

    /// Advance one fixed physics step of length `dt`.
    ///
    /// `intents` are merged into whatever was queued and consumed by this
    /// tick. Returns the events the level must handle, in the order they
    /// happened; a terminal event ends the tick.
    pub fn update<G: TileGrid>(
        &mut self,
        grid: &G,
        intents: MotionIntent,
        dt: f32,
    ) -> Vec<PlayerEvent> {
        self.inputs |= intents;
        self.prev_pos = self.pos;

        if self.killed {
            return vec![PlayerEvent::Killed];
        }
        if self.level_completed {
            return vec![PlayerEvent::LevelCompleted];
        }

        let inputs = self.inputs;
        let mut events = Vec::new();

        let friction = self.ground_friction(grid);
        self.update_jumpstate(friction.is_some());
        self.resolve_jump(inputs);
        self.walk(inputs, dt);
        self.apply_vertical(grid, inputs, friction, dt);

        let axes = if self.vel.x.abs() >= self.vel.y.abs() {
            [Axis::X, Axis::Y]
        } else {
            [Axis::Y, Axis::X]
        };
        for axis in axes {
            self.move_axis(grid, axis, dt, &mut events);
            if self.killed || self.level_completed {
                break;
            }
        }

        self.inputs = MotionIntent::empty();

        if self.killed {
            events.push(PlayerEvent::Killed);
        } else if self.level_completed {
            tracing::debug!(x = self.pos.x, y = self.pos.y, "goal reached");
            events.push(PlayerEvent::LevelCompleted);
        }
        events
    }

    /// X coordinates sampled beneath the feet.
    fn foot_xs(&self) -> [f32; 3] {
        let half = PLAYER_SIZE.x / 2.0;
        [self.pos.x - half + EPS, self.pos.x, self.pos.x + half - EPS]
    }

    /// Highest friction of the solid tiles the feet rest on, or the default
    /// friction on the world floor. `None` when not grounded.
    fn ground_friction<G: TileGrid>(&self, grid: &G) -> Option<f32> {
        let feet_y = self.pos.y + EPS;
        let friction = self
            .foot_xs()
            .into_iter()
            .filter_map(|x| grid.contact(x, feet_y))
            .filter(|(tile, collider)| tile.is_solid() && collider.top() >= self.pos.y - EPS)
            .map(|(tile, _)| tile.friction)
            .reduce(f32::max);

        match friction {
            Some(f) => Some(f),
            None if self.pos.y >= 0.0 => Some(DEFAULT_FRICTION),
            None => None,
        }
    }

    fn update_jumpstate(&mut self, grounded: bool) {
        if grounded {
            self.jumpstate = JumpState::Grounded;
            self.coyote_frames_left = self.tuning.coyote_frames;
        } else if self.jumpstate == JumpState::Grounded {
            if self.coyote_frames_left == 0 {
                self.jumpstate = JumpState::Airborne;
            } else {
                self.coyote_frames_left -= 1;
            }
        }
    }

    fn resolve_jump(&mut self, inputs: MotionIntent) {
        if inputs.contains(MotionIntent::JUMP) && self.jumpstate == JumpState::Grounded {
            self.vel.y = -self.tuning.jump_vel;
            self.stats.jumps += 1;
            self.jumpstate = JumpState::Airborne;
            self.coyote_frames_left = 0;
        } else if inputs.contains(MotionIntent::DOUBLE_JUMP)
            && self.jumpstate == JumpState::Airborne
        {
            self.vel.y = -self.tuning.jump_vel;
            self.stats.double_jumps += 1;
            self.jumpstate = JumpState::DoubleJumped;
        } else if inputs.contains(MotionIntent::SLAM) && self.jumpstate != JumpState::Grounded {
            self.jumpstate = JumpState::Slamming;
        } else if inputs.contains(MotionIntent::SLAM) {
            self.vel.y = 0.0;
        }

        if self.jumpstate == JumpState::Slamming && !inputs.contains(MotionIntent::SLAM) {
            self.jumpstate = JumpState::DoubleJumped;
        }
    }

    /// Left is applied before right, so holding both ends the tick with the
    /// right intent's adjustment on top of the left one.
    fn walk(&mut self, inputs: MotionIntent, dt: f32) {
        if inputs.contains(MotionIntent::WALK_LEFT) {
            self.vel.x = self.walk_toward(self.vel.x, -1.0, dt);
        }
        if inputs.contains(MotionIntent::WALK_RIGHT) {
            self.vel.x = self.walk_toward(self.vel.x, 1.0, dt);
        }
    }

    fn walk_toward(&self, vx: f32, dir: f32, dt: f32) -> f32 {
        let t = &self.tuning;
        if vx * dir < 0.0 {
            vx + dir * t.walk_dec * dt
        } else if vx.abs() < t.walk_vel {
            let v = vx + dir * t.walk_acc * dt;
            if v.abs() > t.walk_vel { dir * t.walk_vel } else { v }
        } else {
            vx
        }
    }

    fn apply_vertical<G: TileGrid>(
        &mut self,
        grid: &G,
        inputs: MotionIntent,
        friction: Option<f32>,
        dt: f32,
    ) {
        let flying = inputs.contains(MotionIntent::FLY);
        match friction {
            Some(friction) => {
                self.vel.y = self.vel.y.min(0.0);
                if !inputs.walking() {
                    self.vel.x = approach_zero(self.vel.x, friction * dt);
                }
            },
            None if flying => {},
            None => {
                let scale = if self.jumpstate == JumpState::Slamming { 2.0 } else { 1.0 };
                self.vel.y += grid.gravity() * scale * dt;
            },
        }
        if flying {
            self.vel.y = -self.tuning.fly_speed;
        }
    }

    fn move_axis<G: TileGrid>(
        &mut self,
        grid: &G,
        axis: Axis,
        dt: f32,
        events: &mut Vec<PlayerEvent>,
    ) {
        match axis {
            Axis::X => self.pos.x += self.vel.x * dt,
            Axis::Y => self.pos.y += self.vel.y * dt,
        }
        self.resolve(grid, axis, events);

        if axis == Axis::Y && self.pos.y > 0.0 {
            self.pos.y = 0.0;
            self.vel.y = self.vel.y.min(0.0);
        }
    }

    /// 3×4 grid of points on the bounding box: left, centre and right
    /// columns; top, one third, two thirds and bottom rows.
    fn sample_points(&self) -> [Vec2; 12] {
        let r = self.rect();
        let xs = [r.left(), r.left() + r.w / 2.0, r.right()];
        let ys = [r.top(), r.top() + r.h / 3.0, r.top() + 2.0 * r.h / 3.0, r.bottom()];
        let mut points = [Vec2::ZERO; 12];
        for (i, y) in ys.into_iter().enumerate() {
            for (j, x) in xs.into_iter().enumerate() {
                points[i * 3 + j] = Vec2::new(x, y);
            }
        }
        points
    }

    fn resolve<G: TileGrid>(&mut self, grid: &G, axis: Axis, events: &mut Vec<PlayerEvent>) {
        for point in self.sample_points() {
            let Some((tile, collider)) = grid.contact(point.x, point.y) else {
                continue;
            };
            if tile.is_solid() {
                self.push_out(axis, &tile, collider);
            } else {
                self.touch(&tile, collider, events);
            }
            if self.killed || self.level_completed {
                return;
            }
        }
    }

    fn push_out(&mut self, axis: Axis, tile: &Tile, collider: Rect) {
        let rect = self.rect();
        let c = collide(rect, collider);
        match axis {
            Axis::X => {
                if !c.x_touches || !rect.overlaps_y_strictly(&collider, EPS) {
                    return;
                }
                self.pos.x = c.new_pos.x + PLAYER_SIZE.x / 2.0;
                let tile_is_right = collider.centre().x > rect.centre().x;
                let into = if tile_is_right { self.vel.x > 0.0 } else { self.vel.x < 0.0 };
                if into {
                    self.vel.x = -self.vel.x * tile.bounce.side;
                }
            },
            Axis::Y => {
                if !c.y_touches || !rect.overlaps_x_strictly(&collider, EPS) {
                    return;
                }
                self.pos.y = c.new_pos.y + PLAYER_SIZE.y;
                let tile_is_below = collider.centre().y > rect.centre().y;
                if tile_is_below && self.vel.y > 0.0 {
                    self.vel.y = -self.vel.y * tile.bounce.top;
                } else if !tile_is_below && self.vel.y < 0.0 {
                    self.vel.y = -self.vel.y * tile.bounce.bottom;
                }
            },
        }
    }

    /// Effects of non-solid tiles. Edge contact alone does not count.
    fn touch(&mut self, tile: &Tile, collider: Rect, events: &mut Vec<PlayerEvent>) {
        let rect = self.rect();
        if !rect.overlaps_x_strictly(&collider, EPS) || !rect.overlaps_y_strictly(&collider, EPS) {
            return;
        }
        match tile.kind {
            TileKind::Danger => self.kill(),
            TileKind::Goal => self.level_completed = true,
            TileKind::Checkpoint => {
                let event = PlayerEvent::CheckpointReached(collider.centre());
                if !events.contains(&event) {
                    events.push(event);
                }
            },
            TileKind::Empty | TileKind::Solid => {},
        }
    }
}
