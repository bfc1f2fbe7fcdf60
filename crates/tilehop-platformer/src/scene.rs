use std::path::PathBuf;

use tilehop_core::personal_best::{CHALLENGE_RUN_KEY, PbOutcome, PersonalBests, level_key};
use tilehop_core::stats::{PlayerStats, Stats};
use tilehop_core::time::format_ticks;

use crate::catalog::{Catalog, CatalogError};
use crate::config::Config;
use crate::input::FrameInput;
use crate::level::{Level, LevelChange, LevelEvent, LevelSettings, OverlayAction};

/// Scene switch requested by a menu or a level, applied at the end of the
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    MainMenu,
    LevelSelect,
    Level(usize),
    Challenge,
    Exit,
}

/// Menu buttons of the main menu, the level select screen and the
/// challenge results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Play,
    LevelSelect,
    Level(usize),
    Challenge,
    Back,
    Quit,
}

/// One row of the level select screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSelectEntry {
    pub index: usize,
    pub name: String,
    pub pb: Option<Stats>,
}

/// What scenes may touch while running a frame.
struct SceneContext<'a> {
    catalog: &'a Catalog,
    pbs: &'a mut PersonalBests,
    settings: LevelSettings,
    pbs_changed: bool,
}

impl SceneContext<'_> {
    fn record(&mut self, key: &str, stats: Stats) -> PbOutcome {
        let outcome = self.pbs.record(key, stats);
        self.pbs_changed |= outcome.new_pb;
        outcome
    }
}

/// Forward one frame of input to `level` and run it.
fn drive_level(level: &mut Level, input: &FrameInput, dt: f32) -> Vec<LevelEvent> {
    level.push_intents(input.intents);
    for command in &input.commands {
        level.command(*command);
    }
    level.update(dt)
}

/// Single-level play started from the level select screen.
#[derive(Debug, Clone)]
pub struct LevelScene {
    level: Level,
}

impl LevelScene {
    pub fn start(
        catalog: &Catalog,
        index: usize,
        settings: LevelSettings,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            level: catalog.level(index, false, settings)?,
        })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    fn frame(
        &mut self,
        ctx: &mut SceneContext<'_>,
        input: &FrameInput,
        dt: f32,
    ) -> Result<(Vec<LevelEvent>, Option<Transition>), CatalogError> {
        let events = drive_level(&mut self.level, input, dt);
        for event in &events {
            if let LevelEvent::Completed(stats) = event {
                let outcome = ctx.record(&level_key(self.level.index()), *stats);
                self.level.show_summary(outcome);
            }
        }

        let Some(change) = self.level.take_change() else {
            return Ok((events, None));
        };
        let index = self.level.index();
        let next = match change {
            LevelChange::MainMenu => return Ok((events, Some(Transition::MainMenu))),
            LevelChange::Prev if index == 0 => return Ok((events, Some(Transition::MainMenu))),
            LevelChange::Prev => index - 1,
            LevelChange::Next => index + 1,
            LevelChange::Reset => index,
        };
        match ctx.catalog.make_level(next, false, ctx.settings)? {
            Some(level) => {
                self.level = level;
                Ok((events, None))
            },
            None => Ok((events, Some(Transition::MainMenu))),
        }
    }
}

/// Final results of a challenge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeSummary {
    pub total: Stats,
    pub previous: Option<Stats>,
    pub new_pb: bool,
}

impl ChallengeSummary {
    pub fn lines(&self, fps: u32) -> [String; 3] {
        let pb = |value: String| -> String {
            match &self.previous {
                Some(_) => format!(" ; PB: {value}"),
                None => String::new(),
            }
        };
        let prev = self.previous.unwrap_or_default();
        [
            format!(
                "Completion time: {}{}",
                format_ticks(self.total.time, fps),
                pb(format_ticks(prev.time, fps))
            ),
            format!(
                "Total jumps: {}{}",
                self.total.total_jumps(),
                pb(prev.total_jumps().to_string())
            ),
            format!(
                "Total deaths/resets: {}{}",
                self.total.total_respawns(),
                pb(prev.total_respawns().to_string())
            ),
        ]
    }
}

/// Every level in order, in continuous mode, with stats summed across
/// resets and levels.
#[derive(Debug, Clone)]
pub struct ChallengeRun {
    level: Option<Level>,
    total: Stats,
    total_player: PlayerStats,
    summary: Option<ChallengeSummary>,
}

impl ChallengeRun {
    pub fn start(catalog: &Catalog, settings: LevelSettings) -> Result<Self, CatalogError> {
        Ok(Self {
            level: catalog.make_level(0, true, settings)?,
            total: Stats::default(),
            total_player: PlayerStats::default(),
            summary: None,
        })
    }

    /// Level being played, `None` once the run is over.
    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut Level> {
        self.level.as_mut()
    }

    pub fn total(&self) -> Stats {
        self.total
    }

    pub fn total_player(&self) -> PlayerStats {
        self.total_player
    }

    pub fn summary(&self) -> Option<&ChallengeSummary> {
        self.summary.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.summary.is_some()
    }

    fn bank(&mut self, level: &Level) {
        self.total += level.stats();
        self.total_player += level.player_stats();
    }

    fn finish(&mut self, ctx: &mut SceneContext<'_>) {
        let outcome = ctx.record(CHALLENGE_RUN_KEY, self.total);
        tracing::debug!(time = self.total.time, new_pb = outcome.new_pb, "challenge run finished");
        self.summary = Some(ChallengeSummary {
            total: self.total,
            previous: outcome.previous,
            new_pb: outcome.new_pb,
        });
    }

    fn frame(
        &mut self,
        ctx: &mut SceneContext<'_>,
        input: &FrameInput,
        dt: f32,
    ) -> Result<(Vec<LevelEvent>, Option<Transition>), CatalogError> {
        let Some(level) = self.level.as_mut() else {
            return Ok((Vec::new(), None));
        };
        let events = drive_level(level, input, dt);
        for event in &events {
            if let LevelEvent::Completed(stats) = event {
                let outcome = ctx.record(&level_key(level.index()), *stats);
                level.show_summary(outcome);
            }
        }

        let Some(change) = level.take_change() else {
            return Ok((events, None));
        };
        let index = level.index();
        match change {
            LevelChange::MainMenu => return Ok((events, Some(Transition::MainMenu))),
            LevelChange::Prev => {
                tracing::warn!(index, "previous level requested during a challenge run");
                return Ok((events, Some(Transition::MainMenu)));
            },
            LevelChange::Reset => {
                let finished = self.level.take();
                if let Some(old) = finished {
                    self.bank(&old);
                }
                self.level = ctx.catalog.make_level(index, true, ctx.settings)?;
            },
            LevelChange::Next => {
                let finished = self.level.take();
                if let Some(old) = finished {
                    self.bank(&old);
                    // moving on to another level is not a respawn
                    let spawned = &mut self.total_player.times_spawned;
                    *spawned = spawned.saturating_sub(1);
                }
                self.level = ctx.catalog.make_level(index + 1, true, ctx.settings)?;
                if self.level.is_none() {
                    self.finish(ctx);
                }
            },
        }
        Ok((events, None))
    }
}

/// The scene currently shown.
#[derive(Debug, Clone)]
pub enum Scene {
    MainMenu,
    LevelSelect,
    Level(LevelScene),
    Challenge(ChallengeRun),
    Exit,
}

impl Scene {
    pub fn name(&self) -> &'static str {
        match self {
            Scene::MainMenu => "main_menu",
            Scene::LevelSelect => "level_select",
            Scene::Level(_) => "level",
            Scene::Challenge(_) => "challenge",
            Scene::Exit => "exit",
        }
    }

    /// The level being played, if any.
    pub fn level(&self) -> Option<&Level> {
        match self {
            Scene::Level(s) => Some(s.level()),
            Scene::Challenge(run) => run.level(),
            _ => None,
        }
    }

    fn level_mut(&mut self) -> Option<&mut Level> {
        match self {
            Scene::Level(s) => Some(s.level_mut()),
            Scene::Challenge(run) => run.level_mut(),
            _ => None,
        }
    }
}

/// Owns the catalog, personal bests and the current scene.
#[derive(Debug)]
pub struct Game {
    catalog: Catalog,
    pbs: PersonalBests,
    pbs_path: Option<PathBuf>,
    settings: LevelSettings,
    scene: Scene,
    pending: Option<Transition>,
}

impl Game {
    /// `pbs_path` is where personal bests are saved; `None` keeps them in
    /// memory only.
    pub fn new(
        catalog: Catalog,
        pbs: PersonalBests,
        pbs_path: Option<PathBuf>,
        settings: LevelSettings,
    ) -> Self {
        Self {
            catalog,
            pbs,
            pbs_path,
            settings,
            scene: Scene::MainMenu,
            pending: None,
        }
    }

    /// Load personal bests from the configured data directory. A file that
    /// cannot be read or parsed is logged and left untouched: play starts
    /// with no PBs and nothing is saved this session.
    pub fn from_config(config: &Config, catalog: Catalog) -> Self {
        let path = config.data.personal_bests_path();
        let (pbs, pbs_path) = match PersonalBests::load(&path) {
            Ok(pbs) => (pbs, Some(path)),
            Err(e) => {
                tracing::warn!(
                    "Failed to load personal bests: {e}, not saving to {}",
                    path.display()
                );
                (PersonalBests::default(), None)
            },
        };
        Self::new(catalog, pbs, pbs_path, config.level_settings())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn personal_bests(&self) -> &PersonalBests {
        &self.pbs
    }

    pub fn settings(&self) -> &LevelSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.scene, Scene::Exit)
    }

    /// Queue a scene switch for the end of the current frame.
    pub fn request(&mut self, transition: Transition) {
        self.pending = Some(transition);
    }

    /// Press a menu button. Returns `false` if the current scene has no
    /// such button.
    pub fn choose(&mut self, choice: MenuChoice) -> bool {
        let transition = match (&self.scene, choice) {
            (Scene::MainMenu, MenuChoice::Play) => Transition::Level(0),
            (Scene::MainMenu, MenuChoice::LevelSelect) => Transition::LevelSelect,
            (Scene::MainMenu | Scene::LevelSelect, MenuChoice::Challenge) => Transition::Challenge,
            (Scene::MainMenu, MenuChoice::Quit) => Transition::Exit,
            (Scene::LevelSelect, MenuChoice::Level(i)) if i < self.catalog.len() => {
                Transition::Level(i)
            },
            (Scene::LevelSelect, MenuChoice::Back) => Transition::MainMenu,
            (Scene::Challenge(run), MenuChoice::Back) if run.is_finished() => Transition::MainMenu,
            _ => return false,
        };
        self.request(transition);
        true
    }

    /// Press a button on the pause or win overlay of the current level.
    pub fn overlay_choice(&mut self, action: OverlayAction) -> bool {
        self.scene
            .level_mut()
            .is_some_and(|level| level.choose(action))
    }

    /// Entries for the level select screen.
    pub fn level_select(&self) -> Vec<LevelSelectEntry> {
        self.catalog
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| LevelSelectEntry {
                index,
                name: entry.name.clone(),
                pb: self.pbs.get(&level_key(index)).copied(),
            })
            .collect()
    }

    /// Run one rendered frame, then apply any scene switch.
    pub fn frame(&mut self, input: &FrameInput, dt: f32) -> Result<Vec<LevelEvent>, CatalogError> {
        let mut ctx = SceneContext {
            catalog: &self.catalog,
            pbs: &mut self.pbs,
            settings: self.settings,
            pbs_changed: false,
        };
        let (events, transition) = match &mut self.scene {
            Scene::Level(scene) => scene.frame(&mut ctx, input, dt)?,
            Scene::Challenge(run) => run.frame(&mut ctx, input, dt)?,
            Scene::MainMenu | Scene::LevelSelect | Scene::Exit => (Vec::new(), None),
        };
        if ctx.pbs_changed {
            self.save_pbs();
        }
        if let Some(transition) = transition {
            self.pending.get_or_insert(transition);
        }
        if let Some(transition) = self.pending.take() {
            self.apply(transition)?;
        }
        Ok(events)
    }

    fn apply(&mut self, transition: Transition) -> Result<(), CatalogError> {
        tracing::debug!(from = self.scene.name(), ?transition, "scene transition");
        self.scene = match transition {
            Transition::MainMenu => Scene::MainMenu,
            Transition::LevelSelect => Scene::LevelSelect,
            Transition::Level(index) => {
                Scene::Level(LevelScene::start(&self.catalog, index, self.settings)?)
            },
            Transition::Challenge => {
                Scene::Challenge(ChallengeRun::start(&self.catalog, self.settings)?)
            },
            Transition::Exit => Scene::Exit,
        };
        Ok(())
    }

    fn save_pbs(&self) {
        let Some(path) = &self.pbs_path else {
            return;
        };
        if let Err(e) = self.pbs.save(path) {
            tracing::warn!("Failed to save personal bests: {e}");
        }
    }
}
