//! End-to-end runs: key state through the input layer, scenes, levels, and
//! the personal-best store on disk.

use glam::IVec2;

use tilehop_core::personal_best::PersonalBests;
use tilehop_platformer::level::LevelState;
use tilehop_platformer::{
    Catalog, Config, FrameInput, Game, InputAggregator, KeyState, LevelEvent, LevelSettings,
    MenuChoice, Scene,
};

const DT: f32 = 1.0 / 60.0;

/// Host loop stand-in: owns key state and the aggregator.
struct Driver {
    game: Game,
    input: InputAggregator,
    keys: KeyState,
}

impl Driver {
    fn new(game: Game, config: &Config) -> Self {
        Self {
            game,
            input: InputAggregator::new(config.bindings.clone()),
            keys: KeyState::default(),
        }
    }

    fn frame(&mut self, held: &[&str]) -> Vec<LevelEvent> {
        self.keys.advance(held.iter().copied());
        let input: FrameInput = self.input.poll(&self.keys);
        self.game.frame(&input, DT).unwrap()
    }

    fn level_state(&self) -> Option<LevelState> {
        self.game.scene().level().map(|l| l.state())
    }
}

fn catalog_from(dir: &std::path::Path, name: &str, source: &str) -> Catalog {
    let path = dir.join(name);
    std::fs::write(&path, source).unwrap();
    Catalog::from_file(&path).unwrap()
}

fn config_in(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.data.dir = dir.join("data");
    config
}

#[test]
fn keyboard_run_to_goal_saves_pb() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog_from(dir.path(), "dash.txt", "; Dash\n........\n.P...F..\n########\n");
    let config = config_in(dir.path());
    let mut d = Driver::new(Game::from_config(&config, catalog), &config);

    assert!(d.game.choose(MenuChoice::Play));
    d.frame(&[]);
    assert_eq!(d.level_state(), Some(LevelState::Active));

    let mut completed = None;
    for _ in 0..300 {
        for event in d.frame(&["D"]) {
            if let LevelEvent::Completed(stats) = event {
                completed = Some(stats);
            }
        }
        if completed.is_some() {
            break;
        }
    }
    let stats = completed.expect("goal reached");
    assert_eq!(d.level_state(), Some(LevelState::WinScreen));
    assert_eq!(stats.deaths, 0);

    let saved = PersonalBests::load(&config.data.personal_bests_path()).unwrap();
    assert_eq!(saved.get("0"), Some(&stats));

    // key still held from the run, so release first
    d.frame(&[]);
    d.frame(&["Enter"]);
    assert!(matches!(d.game.scene(), Scene::MainMenu), "only one level");
}

#[test]
fn malformed_pb_entry_does_not_wipe_other_levels() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog_from(dir.path(), "dash.txt", "; Dash\n........\n.P...F..\n########\n");
    let config = config_in(dir.path());
    let path = config.data.personal_bests_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[\"7\"]\ntime = 500\n\n[\"8\"]\ntime = \"oops\"\n").unwrap();

    let mut d = Driver::new(Game::from_config(&config, catalog), &config);
    assert_eq!(d.game.personal_bests().get("7").map(|s| s.time), Some(500));
    d.game.choose(MenuChoice::Play);
    d.frame(&[]);
    for _ in 0..300 {
        d.frame(&["D"]);
        if d.level_state() == Some(LevelState::WinScreen) {
            break;
        }
    }
    assert_eq!(d.level_state(), Some(LevelState::WinScreen));

    let saved = PersonalBests::load(&path).unwrap();
    assert_eq!(saved.get("7").map(|s| s.time), Some(500));
    assert!(saved.get("0").is_some());
    assert!(saved.get("8").is_none());
}

#[test]
fn escape_pauses_and_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog_from(dir.path(), "flat.txt", "......\n.P....\n######\n");
    let config = config_in(dir.path());
    let mut d = Driver::new(Game::from_config(&config, catalog), &config);
    d.game.choose(MenuChoice::Play);
    d.frame(&[]);

    d.frame(&["Escape"]);
    assert_eq!(d.level_state(), Some(LevelState::Paused));
    let clock = d.game.scene().level().unwrap().stats().time;
    for _ in 0..10 {
        d.frame(&["Escape", "D"]);
    }
    let level = d.game.scene().level().unwrap();
    assert_eq!(level.stats().time, clock);
    assert_eq!(level.player().pos(), level.spawn_point());

    d.frame(&[]);
    d.frame(&["Escape"]);
    assert_eq!(d.level_state(), Some(LevelState::Active));
}

#[test]
fn lava_respawns_at_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog_from(dir.path(), "hot.txt", "..........\n.P.C.L.F..\n##########\n");
    let config = config_in(dir.path());
    let mut d = Driver::new(Game::from_config(&config, catalog), &config);
    d.game.choose(MenuChoice::Play);
    d.frame(&[]);

    let mut events = Vec::new();
    for _ in 0..300 {
        events.extend(d.frame(&["Right"]));
        if events.contains(&LevelEvent::Died) {
            break;
        }
    }
    assert!(events.contains(&LevelEvent::CheckpointActivated(IVec2::new(3, 1))));
    assert!(events.contains(&LevelEvent::Died));

    let level = d.game.scene().level().unwrap();
    assert_eq!(level.active_checkpoint(), Some(IVec2::new(3, 1)));
    assert_eq!(level.player().pos(), level.spawn_point());
    assert_eq!(level.stats().deaths, 1);
}

#[test]
fn builtin_levels_settle_on_spawn() {
    let catalog = Catalog::builtin();
    for index in 0..catalog.len() {
        let mut level = catalog.level(index, false, LevelSettings::default()).unwrap();
        let spawn = level.spawn_point();
        for _ in 0..60 {
            assert!(level.update(DT).is_empty(), "level {index}: idle player hit something");
        }
        assert!(level.player().on_ground(level.map()), "level {index}");
        assert_eq!(level.player().pos(), spawn, "level {index}");
    }
}
