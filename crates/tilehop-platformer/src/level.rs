use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use tilehop_core::intent::MotionIntent;
use tilehop_core::personal_best::PbOutcome;
use tilehop_core::stats::{PlayerStats, Stats};
use tilehop_core::time::format_ticks;

use crate::grid::TileMap;
use crate::physics::{DEFAULT_GRAVITY, MAX_TICKS_PER_FRAME, PHYSICS_FPS, PlayerTuning};
use crate::player::{Player, PlayerEvent};
use crate::presentation::{Camera, PlayerView};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelState {
    #[default]
    Active,
    Paused,
    WinScreen,
}

/// Request for the owning scene, consumed at the end of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelChange {
    Prev,
    Next,
    Reset,
    MainMenu,
}

/// Edge-triggered level commands coming from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelCommand {
    Pause,
    Reset,
    NextLevel,
    Suicide,
}

/// Buttons of the pause and win overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayAction {
    Resume,
    Proceed,
    MainMenu,
    PrevLevel,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayButton {
    pub action: OverlayAction,
    /// Disabled buttons are shown but do nothing.
    pub enabled: bool,
}

impl OverlayButton {
    const fn on(action: OverlayAction) -> Self {
        Self {
            action,
            enabled: true,
        }
    }
}

/// What happened during one `Level::update`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelEvent {
    /// The player died and was respawned.
    Died,
    /// A new checkpoint cell became the spawn.
    CheckpointActivated(IVec2),
    /// The goal was reached with these stats.
    Completed(Stats),
}

/// Simulation settings shared by every level of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSettings {
    pub fps: u32,
    pub max_ticks_per_frame: u32,
    pub gravity: f32,
    pub tuning: PlayerTuning,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            fps: PHYSICS_FPS,
            max_ticks_per_frame: MAX_TICKS_PER_FRAME,
            gravity: DEFAULT_GRAVITY,
            tuning: PlayerTuning::default(),
        }
    }
}

impl LevelSettings {
    pub fn tick_secs(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }
}

/// Contents of the win overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinSummary {
    pub stats: Stats,
    pub previous: Option<Stats>,
    pub new_pb: bool,
}

impl WinSummary {
    pub fn new(stats: Stats, outcome: PbOutcome) -> Self {
        Self {
            stats,
            previous: outcome.previous,
            new_pb: outcome.new_pb,
        }
    }

    /// Run line and personal-best line, times as `seconds;frames`.
    pub fn lines(&self, fps: u32) -> [String; 2] {
        let fmt = |s: &Stats| {
            format!(
                "{} / {} / {}",
                format_ticks(s.time, fps),
                s.total_jumps(),
                s.deaths
            )
        };
        let mut run = format!("Time / Jumps / Deaths: {}", fmt(&self.stats));
        if self.new_pb {
            run.push_str(" (New PB!)");
        }
        let pb = self.previous.as_ref().map_or_else(|| "N/A".to_string(), fmt);
        [run, format!("Personal Best: {pb}")]
    }
}

/// One playable level: tile map, player, camera and the fixed-step clock.
#[derive(Debug, Clone)]
pub struct Level {
    index: usize,
    map: TileMap,
    spawn: IVec2,
    active_checkpoint: Option<IVec2>,
    player: Player,
    camera: Camera,
    state: LevelState,
    change: Option<LevelChange>,
    continuous: bool,
    frame_acc: f32,
    pending: MotionIntent,
    time: u32,
    restarts: u32,
    settings: LevelSettings,
    summary: Option<WinSummary>,
}

impl Level {
    /// `continuous` levels belong to a challenge run and hide the
    /// previous-level and restart buttons of the win overlay.
    pub fn new(index: usize, map: TileMap, continuous: bool, settings: LevelSettings) -> Self {
        let map = map.with_gravity(settings.gravity);
        let spawn = map.spawn_cell();
        let spawn_pos = map.spawn_point(spawn);
        Self {
            index,
            spawn,
            active_checkpoint: None,
            player: Player::new(spawn_pos, settings.tuning),
            camera: Camera::new(spawn_pos),
            map,
            state: LevelState::Active,
            change: None,
            continuous,
            frame_acc: 0.0,
            pending: MotionIntent::empty(),
            time: 0,
            restarts: 0,
            settings,
            summary: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn settings(&self) -> &LevelSettings {
        &self.settings
    }

    pub fn active_checkpoint(&self) -> Option<IVec2> {
        self.active_checkpoint
    }

    /// World position the player respawns at.
    pub fn spawn_point(&self) -> Vec2 {
        self.map.spawn_point(self.spawn)
    }

    /// Level time, restarts and the player's counters combined.
    pub fn stats(&self) -> Stats {
        Stats::from_parts(self.time, self.restarts, self.player.stats())
    }

    pub fn player_stats(&self) -> PlayerStats {
        *self.player.stats()
    }

    pub fn summary(&self) -> Option<&WinSummary> {
        self.summary.as_ref()
    }

    /// Fraction of a physics tick accumulated since the last one.
    pub fn alpha(&self) -> f32 {
        (self.frame_acc * self.settings.fps as f32).clamp(0.0, 1.0)
    }

    pub fn player_view(&self) -> PlayerView {
        PlayerView::of(&self.player, self.alpha())
    }

    /// Elapsed level time as `seconds;frames`.
    pub fn clock(&self) -> String {
        format_ticks(self.time, self.settings.fps)
    }

    /// Pending scene change, cleared on read.
    pub fn take_change(&mut self) -> Option<LevelChange> {
        self.change.take()
    }

    /// Queue motion intents for the next physics tick.
    pub fn push_intents(&mut self, intents: MotionIntent) {
        self.pending |= intents;
    }

    pub fn command(&mut self, command: LevelCommand) {
        match command {
            LevelCommand::Pause => {
                self.state = match self.state {
                    LevelState::Active => LevelState::Paused,
                    LevelState::Paused => LevelState::Active,
                    LevelState::WinScreen => LevelState::WinScreen,
                };
            },
            LevelCommand::Reset => {
                self.restarts += 1;
                self.change = Some(LevelChange::Reset);
            },
            LevelCommand::NextLevel => {
                if self.state == LevelState::WinScreen {
                    self.change = Some(LevelChange::Next);
                }
            },
            LevelCommand::Suicide => {
                if self.state == LevelState::Active {
                    self.player.kill();
                }
            },
        }
    }

    /// Buttons of the overlay currently shown; empty while playing.
    pub fn overlay(&self) -> Vec<OverlayButton> {
        let prev = OverlayButton {
            action: OverlayAction::PrevLevel,
            enabled: self.index != 0,
        };
        match self.state {
            LevelState::Active => Vec::new(),
            LevelState::Paused => {
                let mut buttons = vec![
                    OverlayButton::on(OverlayAction::Resume),
                    OverlayButton::on(OverlayAction::MainMenu),
                ];
                if !self.continuous {
                    buttons.push(prev);
                }
                buttons.push(OverlayButton::on(OverlayAction::Restart));
                buttons
            },
            LevelState::WinScreen => {
                let mut buttons = vec![
                    OverlayButton::on(OverlayAction::Proceed),
                    OverlayButton::on(OverlayAction::MainMenu),
                ];
                if !self.continuous {
                    buttons.push(prev);
                    buttons.push(OverlayButton::on(OverlayAction::Restart));
                }
                buttons
            },
        }
    }

    /// Press an overlay button. Returns `false` when it is not shown or
    /// disabled.
    pub fn choose(&mut self, action: OverlayAction) -> bool {
        let available = self
            .overlay()
            .iter()
            .any(|b| b.action == action && b.enabled);
        if !available {
            return false;
        }
        match action {
            OverlayAction::Resume => self.state = LevelState::Active,
            OverlayAction::Proceed => self.change = Some(LevelChange::Next),
            OverlayAction::MainMenu => self.change = Some(LevelChange::MainMenu),
            OverlayAction::PrevLevel => self.change = Some(LevelChange::Prev),
            OverlayAction::Restart => {
                if self.state != LevelState::WinScreen {
                    self.restarts += 1;
                }
                self.change = Some(LevelChange::Reset);
            },
        }
        true
    }

    /// Fill the win overlay once the owning scene has checked personal bests.
    pub fn show_summary(&mut self, outcome: PbOutcome) {
        self.summary = Some(WinSummary::new(self.stats(), outcome));
    }

    /// Advance by one rendered frame of `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Vec<LevelEvent> {
        let mut events = Vec::new();
        if self.state != LevelState::Active {
            self.pending = MotionIntent::empty();
            return events;
        }

        let step = self.settings.tick_secs();
        self.frame_acc += dt.max(0.0);
        let mut ticks = 0;
        while self.frame_acc >= step && self.state == LevelState::Active {
            if ticks == self.settings.max_ticks_per_frame {
                let dropped = (self.frame_acc / step) as u32;
                tracing::warn!(dropped, "physics falling behind, dropping ticks");
                self.frame_acc = self.frame_acc.rem_euclid(step);
                break;
            }
            self.frame_acc -= step;
            ticks += 1;
            self.tick(step, &mut events);
        }

        let focus = self.player.interpolated_pos(self.alpha());
        self.camera.follow(focus, dt);
        events
    }

    fn tick(&mut self, step: f32, events: &mut Vec<LevelEvent>) {
        self.time += 1;
        let intents = self.pending.take();
        for event in self.player.update(&self.map, intents, step) {
            match event {
                PlayerEvent::Killed => {
                    self.respawn();
                    events.push(LevelEvent::Died);
                },
                PlayerEvent::LevelCompleted => {
                    self.state = LevelState::WinScreen;
                    let stats = self.stats();
                    tracing::debug!(level = self.index, time = stats.time, "level completed");
                    events.push(LevelEvent::Completed(stats));
                },
                PlayerEvent::CheckpointReached(at) => {
                    if let Some(cell) = self.activate_checkpoint(at) {
                        events.push(LevelEvent::CheckpointActivated(cell));
                    }
                },
            }
        }
    }

    fn respawn(&mut self) {
        let at = self.spawn_point();
        tracing::debug!(level = self.index, x = at.x, y = at.y, "respawning player");
        self.player.spawn(at);
        self.camera.snap(at);
    }

    /// Make the checkpoint at `at` the spawn. `None` when it already is.
    fn activate_checkpoint(&mut self, at: Vec2) -> Option<IVec2> {
        let cell = self.map.cell_of(at.x, at.y)?;
        if self.active_checkpoint == Some(cell) {
            return None;
        }
        tracing::debug!(level = self.index, x = cell.x, y = cell.y, "checkpoint activated");
        self.active_checkpoint = Some(cell);
        self.spawn = IVec2::new(cell.x, cell.y + 1);
        Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn flat() -> TileMap {
        TileMap::parse("......\n.P....\n######\n").unwrap()
    }

    fn level(map: TileMap) -> Level {
        Level::new(1, map, false, LevelSettings::default())
    }

    #[test]
    fn new_level_spawns_player() {
        let lvl = level(flat());
        assert_eq!(lvl.state(), LevelState::Active);
        assert_eq!(lvl.player().pos(), lvl.spawn_point());
        assert_eq!(lvl.player_stats().times_spawned, 1);
        assert_eq!(lvl.camera().target(), lvl.spawn_point());
    }

    #[test]
    fn fixed_step_counts_ticks() {
        let mut lvl = level(flat());
        lvl.update(DT * 0.5);
        assert_eq!(lvl.stats().time, 0);
        assert!(lvl.alpha() > 0.4 && lvl.alpha() < 0.6);
        lvl.update(DT * 0.6);
        assert_eq!(lvl.stats().time, 1);
        lvl.update(DT * 3.0);
        assert_eq!(lvl.stats().time, 4);
    }

    #[test]
    fn long_frames_drop_ticks() {
        let mut lvl = level(flat());
        lvl.update(1.0);
        assert_eq!(lvl.stats().time, MAX_TICKS_PER_FRAME);
        lvl.update(0.0);
        assert_eq!(lvl.stats().time, MAX_TICKS_PER_FRAME, "backlog was dropped");
    }

    #[test]
    fn pause_toggles_and_freezes_time() {
        let mut lvl = level(flat());
        lvl.command(LevelCommand::Pause);
        assert_eq!(lvl.state(), LevelState::Paused);
        lvl.push_intents(MotionIntent::JUMP);
        lvl.update(DT * 10.0);
        assert_eq!(lvl.stats().time, 0);

        lvl.command(LevelCommand::Pause);
        assert_eq!(lvl.state(), LevelState::Active);
        lvl.update(DT);
        assert_eq!(lvl.player_stats().jumps, 0, "paused input is discarded");
    }

    #[test]
    fn queued_intents_reach_the_next_tick() {
        let mut lvl = level(flat());
        lvl.update(DT);
        lvl.push_intents(MotionIntent::JUMP);
        lvl.update(DT * 0.5);
        assert_eq!(lvl.player_stats().jumps, 0);
        lvl.update(DT * 0.5);
        assert_eq!(lvl.player_stats().jumps, 1);
    }

    #[test]
    fn reset_counts_restart() {
        let mut lvl = level(flat());
        lvl.command(LevelCommand::Reset);
        assert_eq!(lvl.stats().restarts, 1);
        assert_eq!(lvl.take_change(), Some(LevelChange::Reset));
        assert_eq!(lvl.take_change(), None);
    }

    #[test]
    fn next_level_only_from_win_screen() {
        let mut lvl = level(flat());
        lvl.command(LevelCommand::NextLevel);
        assert_eq!(lvl.take_change(), None);
    }

    #[test]
    fn suicide_respawns_with_a_death() {
        let mut lvl = level(flat());
        lvl.update(DT);
        lvl.command(LevelCommand::Suicide);
        let events = lvl.update(DT);
        assert_eq!(events, vec![LevelEvent::Died]);
        assert_eq!(lvl.stats().deaths, 1);
        assert_eq!(lvl.player_stats().times_spawned, 2);
        assert!(!lvl.player().is_killed());
    }

    #[test]
    fn lava_kills_and_respawns_at_spawn() {
        let map = TileMap::parse("......\n.P..L.\n######\n").unwrap();
        let mut lvl = level(map);
        let mut died = false;
        for _ in 0..120 {
            lvl.push_intents(MotionIntent::WALK_RIGHT);
            if lvl.update(DT).contains(&LevelEvent::Died) {
                died = true;
                break;
            }
        }
        assert!(died);
        assert_eq!(lvl.player().pos(), lvl.spawn_point());
        assert_eq!(lvl.stats().deaths, 1);
    }

    #[test]
    fn camera_snaps_back_to_spawn_on_death() {
        let map = TileMap::parse("..........\n.P......L.\n##########\n").unwrap();
        let mut lvl = level(map);
        let mut trailed = false;
        for _ in 0..240 {
            lvl.push_intents(MotionIntent::WALK_RIGHT);
            let died = lvl.update(DT).contains(&LevelEvent::Died);
            if died {
                break;
            }
            trailed |= lvl.camera().target() != lvl.spawn_point();
        }
        assert!(trailed, "camera never left the spawn");
        assert_eq!(lvl.stats().deaths, 1);
        assert_eq!(lvl.camera().target(), lvl.spawn_point());
    }

    #[test]
    fn checkpoint_moves_spawn() {
        let map = TileMap::parse("......\n.P.C..\n######\n").unwrap();
        let mut lvl = level(map);
        let original = lvl.spawn_point();
        let mut activated = Vec::new();
        for _ in 0..60 {
            lvl.push_intents(MotionIntent::WALK_RIGHT);
            for e in lvl.update(DT) {
                if let LevelEvent::CheckpointActivated(cell) = e {
                    activated.push(cell);
                }
            }
        }
        assert_eq!(activated, vec![IVec2::new(3, 1)], "activated once");
        assert_eq!(lvl.active_checkpoint(), Some(IVec2::new(3, 1)));
        assert_eq!(lvl.spawn_point(), Vec2::new(0.5, -1.0));
        assert_ne!(lvl.spawn_point(), original);
    }

    fn completed_level(continuous: bool, index: usize) -> Level {
        let map = TileMap::parse("......\n.P.F..\n######\n").unwrap();
        let mut lvl = Level::new(index, map, continuous, LevelSettings::default());
        for _ in 0..120 {
            lvl.push_intents(MotionIntent::WALK_RIGHT);
            let events = lvl.update(DT);
            if events.iter().any(|e| matches!(e, LevelEvent::Completed(_))) {
                break;
            }
        }
        assert_eq!(lvl.state(), LevelState::WinScreen);
        lvl
    }

    #[test]
    fn goal_shows_win_screen_and_stops_clock() {
        let mut lvl = completed_level(false, 1);
        let time = lvl.stats().time;
        assert!(time > 0);
        lvl.update(DT * 5.0);
        assert_eq!(lvl.stats().time, time);

        lvl.command(LevelCommand::Pause);
        assert_eq!(lvl.state(), LevelState::WinScreen);
        lvl.command(LevelCommand::NextLevel);
        assert_eq!(lvl.take_change(), Some(LevelChange::Next));
    }

    #[test]
    fn pause_overlay_buttons() {
        let mut lvl = level(flat());
        assert!(lvl.overlay().is_empty());
        assert!(!lvl.choose(OverlayAction::Resume));

        lvl.command(LevelCommand::Pause);
        let actions: Vec<_> = lvl.overlay().iter().map(|b| b.action).collect();
        assert_eq!(
            actions,
            vec![
                OverlayAction::Resume,
                OverlayAction::MainMenu,
                OverlayAction::PrevLevel,
                OverlayAction::Restart
            ]
        );
        assert!(lvl.choose(OverlayAction::Restart));
        assert_eq!(lvl.stats().restarts, 1);
        assert_eq!(lvl.take_change(), Some(LevelChange::Reset));

        assert!(lvl.choose(OverlayAction::Resume));
        assert_eq!(lvl.state(), LevelState::Active);
    }

    #[test]
    fn prev_level_disabled_on_first_level() {
        let mut lvl = Level::new(0, flat(), false, LevelSettings::default());
        lvl.command(LevelCommand::Pause);
        let prev = lvl
            .overlay()
            .into_iter()
            .find(|b| b.action == OverlayAction::PrevLevel)
            .unwrap();
        assert!(!prev.enabled);
        assert!(!lvl.choose(OverlayAction::PrevLevel));
        assert_eq!(lvl.take_change(), None);
    }

    #[test]
    fn continuous_overlays_hide_navigation() {
        let mut lvl = Level::new(2, flat(), true, LevelSettings::default());
        lvl.command(LevelCommand::Pause);
        assert!(!lvl.overlay().iter().any(|b| b.action == OverlayAction::PrevLevel));

        let won = completed_level(true, 2);
        let actions: Vec<_> = won.overlay().iter().map(|b| b.action).collect();
        assert_eq!(actions, vec![OverlayAction::Proceed, OverlayAction::MainMenu]);
    }

    #[test]
    fn win_restart_does_not_count() {
        let mut lvl = completed_level(false, 1);
        assert!(lvl.choose(OverlayAction::Restart));
        assert_eq!(lvl.stats().restarts, 0);
        assert_eq!(lvl.take_change(), Some(LevelChange::Reset));
    }

    #[test]
    fn summary_lines() {
        let mut lvl = completed_level(false, 1);
        lvl.show_summary(PbOutcome {
            previous: None,
            new_pb: true,
        });
        let summary = lvl.summary().copied().unwrap();
        let [run, pb] = summary.lines(60);
        assert!(run.starts_with("Time / Jumps / Deaths: "));
        assert!(run.ends_with(" / 0 / 0 (New PB!)"), "{run}");
        assert_eq!(pb, "Personal Best: N/A");
    }

    #[test]
    fn summary_formats_previous_pb() {
        let previous = Stats {
            time: 125,
            jumps: 3,
            double_jumps: 1,
            deaths: 2,
            restarts: 0,
        };
        let summary = WinSummary {
            stats: Stats {
                time: 130,
                ..previous
            },
            previous: Some(previous),
            new_pb: false,
        };
        let [run, pb] = summary.lines(60);
        assert_eq!(run, "Time / Jumps / Deaths: 2;10 / 4 / 2");
        assert_eq!(pb, "Personal Best: 2;05 / 4 / 2");
    }
}
