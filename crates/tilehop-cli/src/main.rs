mod script;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tilehop_core::personal_best::{CHALLENGE_RUN_KEY, PersonalBests};
use tilehop_core::stats::Stats;
use tilehop_core::time::format_ticks;
use tilehop_platformer::scene::Transition;
use tilehop_platformer::{
    Catalog, Config, Game, InputAggregator, KeyState, LevelEvent, LevelState, Scene,
};

use script::Step;

/// Frames run when no script is given.
const IDLE_FRAMES: u32 = 120;

/// Headless tilehop runner
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file, instead of $TILEHOP_CONFIG or config/tilehop.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a level with scripted key input
    Run {
        /// Catalog index, or path to an ASCII level file
        level: String,
        /// Input script: one `<frames> [KEY...]` per line
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Rendered frames per second fed to the level
        #[arg(long, default_value_t = 60.0)]
        frame_rate: f32,
        /// Do not write personal bests
        #[arg(long)]
        no_save: bool,
    },
    /// Play every catalog level in order as one challenge run
    Challenge {
        #[arg(short, long)]
        script: Option<PathBuf>,
        #[arg(long, default_value_t = 60.0)]
        frame_rate: f32,
        #[arg(long)]
        no_save: bool,
    },
    /// Print stored personal bests
    Pbs,
    /// List catalog levels
    Levels,
    /// Write the default config file if none exists
    InitConfig,
}

fn init_logging(verbose: bool) {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match args.command {
        Command::Run {
            level,
            script,
            frame_rate,
            no_save,
        } => {
            let (catalog, index) = resolve_level(&level)?;
            let game = new_game(&config, catalog, no_save);
            play(game, &config, Transition::Level(index), script.as_deref(), frame_rate)
        },
        Command::Challenge {
            script,
            frame_rate,
            no_save,
        } => {
            let game = new_game(&config, Catalog::builtin(), no_save);
            play(game, &config, Transition::Challenge, script.as_deref(), frame_rate)
        },
        Command::Pbs => print_pbs(&config),
        Command::Levels => {
            let game = new_game(&config, Catalog::builtin(), true);
            for entry in game.level_select() {
                let pb = entry
                    .pb
                    .map_or_else(|| "-".to_string(), |s| summary(&s, config.physics.fps));
                println!("{:>3}  {:<24} {pb}", entry.index, entry.name);
            }
            Ok(())
        },
        Command::InitConfig => {
            let path = args
                .config
                .unwrap_or_else(|| PathBuf::from(tilehop_platformer::config::DEFAULT_CONFIG_PATH));
            if Config::write_default(&path)? {
                println!("wrote {}", path.display());
            } else {
                println!("{} already exists", path.display());
            }
            Ok(())
        },
    }
}

/// A number picks from the built-in catalog, anything else is a level file.
fn resolve_level(arg: &str) -> Result<(Catalog, usize)> {
    if let Ok(index) = arg.parse::<usize>() {
        let catalog = Catalog::builtin();
        if index >= catalog.len() {
            bail!("no level {index}, the catalog has {} levels", catalog.len());
        }
        return Ok((catalog, index));
    }
    let catalog = Catalog::from_file(Path::new(arg))?;
    Ok((catalog, 0))
}

fn new_game(config: &Config, catalog: Catalog, no_save: bool) -> Game {
    let game = Game::from_config(config, catalog);
    if !no_save {
        return game;
    }
    Game::new(
        game.catalog().clone(),
        game.personal_bests().clone(),
        None,
        *game.settings(),
    )
}

fn play(
    mut game: Game,
    config: &Config,
    start: Transition,
    script: Option<&Path>,
    frame_rate: f32,
) -> Result<()> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        bail!("frame rate must be positive, got {frame_rate}");
    }
    let steps: Vec<Step> = match script {
        Some(path) => script::load(path)?,
        None => script::idle(IDLE_FRAMES),
    };

    let input = InputAggregator::new(config.bindings.clone());
    let mut keys = KeyState::default();
    let dt = 1.0 / frame_rate;
    let fps = config.physics.fps;

    game.request(start);
    game.frame(&Default::default(), 0.0)
        .context("failed to start level")?;

    let mut frames = 0u64;
    'script: for step in &steps {
        for _ in 0..step.frames {
            keys.advance(&step.keys);
            let events = game.frame(&input.poll(&keys), dt)?;
            frames += 1;
            for event in events {
                report(&event, fps);
            }
            if !matches!(game.scene(), Scene::Level(_) | Scene::Challenge(_)) {
                tracing::info!(scene = game.scene().name(), "left the level");
                break 'script;
            }
        }
    }

    println!("frames: {frames}");
    match game.scene() {
        Scene::Level(scene) => {
            let level = scene.level();
            println!("level: {}", level.index());
            print_level_outcome(level.state(), &level.stats(), fps);
            if let Some(win) = level.summary() {
                for line in win.lines(fps) {
                    println!("{line}");
                }
            }
        },
        Scene::Challenge(run) => match (run.summary(), run.level()) {
            (Some(done), _) => {
                println!("outcome: challenge complete");
                for line in done.lines(fps) {
                    println!("{line}");
                }
            },
            (None, Some(level)) => {
                println!("level: {}", level.index());
                print_level_outcome(level.state(), &(run.total() + level.stats()), fps);
            },
            (None, None) => println!("outcome: challenge ended"),
        },
        other => println!("outcome: {}", other.name()),
    }
    Ok(())
}

fn report(event: &LevelEvent, fps: u32) {
    match event {
        LevelEvent::Died => tracing::info!("died"),
        LevelEvent::CheckpointActivated(cell) => {
            tracing::info!(x = cell.x, y = cell.y, "checkpoint")
        },
        LevelEvent::Completed(stats) => {
            tracing::info!(time = %format_ticks(stats.time, fps), "level completed")
        },
    }
}

fn print_level_outcome(state: LevelState, stats: &Stats, fps: u32) {
    let outcome = match state {
        LevelState::Active => "in progress",
        LevelState::Paused => "paused",
        LevelState::WinScreen => "completed",
    };
    println!("outcome: {outcome}");
    println!("ticks: {}", stats.time);
    println!("{}", summary(stats, fps));
}

fn summary(stats: &Stats, fps: u32) -> String {
    format!(
        "time {}  jumps {}  deaths {}  restarts {}",
        format_ticks(stats.time, fps),
        stats.total_jumps(),
        stats.deaths,
        stats.restarts
    )
}

fn print_pbs(config: &Config) -> Result<()> {
    let path = config.data.personal_bests_path();
    let pbs = PersonalBests::load(&path)
        .with_context(|| format!("failed to load personal bests from {}", path.display()))?;
    if pbs.is_empty() {
        println!("no personal bests in {}", path.display());
        return Ok(());
    }
    let catalog = Catalog::builtin();
    for (key, stats) in pbs.iter() {
        let name = match key {
            CHALLENGE_RUN_KEY => "Challenge run".to_string(),
            _ => key
                .parse::<usize>()
                .ok()
                .and_then(|i| catalog.get(i))
                .map_or_else(|| format!("Level {key}"), |e| e.name.clone()),
        };
        println!("{name:<24} {}", summary(stats, config.physics.fps));
    }
    Ok(())
}
