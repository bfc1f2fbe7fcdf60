use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::input::KeyBindings;
use crate::level::LevelSettings;
use crate::physics::{DEFAULT_GRAVITY, MAX_TICKS_PER_FRAME, PHYSICS_FPS, PlayerTuning};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "TILEHOP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/tilehop.toml";
/// Smallest supported window.
pub const MIN_WINDOW_WIDTH: u32 = 800;
pub const MIN_WINDOW_HEIGHT: u32 = 600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowState {
    #[default]
    Windowed,
    Borderless,
    Fullscreen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub state: WindowState,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            state: WindowState::Windowed,
            width: MIN_WINDOW_WIDTH,
            height: MIN_WINDOW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Physics ticks per second.
    pub fps: u32,
    pub gravity: f32,
    pub max_ticks_per_frame: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fps: PHYSICS_FPS,
            gravity: DEFAULT_GRAVITY,
            max_ticks_per_frame: MAX_TICKS_PER_FRAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub personal_bests: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            personal_bests: PathBuf::from("pbs.toml"),
        }
    }
}

impl DataConfig {
    pub fn personal_bests_path(&self) -> PathBuf {
        self.dir.join(&self.personal_bests)
    }
}

/// Top-level game configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub physics: PhysicsConfig,
    pub player: PlayerTuning,
    pub data: DataConfig,
    pub bindings: KeyBindings,
}

const HEADER: &str = "\
# tilehop configuration
#
# window.state is one of Windowed, Borderless or Fullscreen.
# Window sizes below 800x600 are not supported and get raised.
# Key names are matched case-insensitively; an action may have several keys.

";

impl Config {
    /// Load from `$TILEHOP_CONFIG` or `config/tilehop.toml`. Falls back to
    /// defaults if the file is missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Like [`Config::load`] for an explicit path.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", path.display());
                    Config::default()
                },
            },
            Err(_) => Config::default(),
        }
    }

    /// Strict parse, with out-of-range values clamped.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut cfg: Config = toml::from_str(content)?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(format!("{HEADER}{}", toml::to_string(self)?))
    }

    /// Write the default config to `path` unless a file already exists.
    /// Returns whether a file was written.
    pub fn write_default(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = Config::default().to_toml_string()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(true)
    }

    pub fn level_settings(&self) -> LevelSettings {
        LevelSettings {
            fps: self.physics.fps,
            max_ticks_per_frame: self.physics.max_ticks_per_frame,
            gravity: self.physics.gravity,
            tuning: self.player,
        }
    }

    fn sanitize(&mut self) {
        if self.window.width < MIN_WINDOW_WIDTH {
            tracing::warn!(width = self.window.width, "window width below {MIN_WINDOW_WIDTH}, raising");
            self.window.width = MIN_WINDOW_WIDTH;
        }
        if self.window.height < MIN_WINDOW_HEIGHT {
            tracing::warn!(height = self.window.height, "window height below {MIN_WINDOW_HEIGHT}, raising");
            self.window.height = MIN_WINDOW_HEIGHT;
        }
        if self.physics.fps == 0 {
            tracing::warn!("physics fps must be positive, using {PHYSICS_FPS}");
            self.physics.fps = PHYSICS_FPS;
        }
        if self.physics.max_ticks_per_frame == 0 {
            self.physics.max_ticks_per_frame = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.window.state, WindowState::Windowed);
        assert_eq!((cfg.window.width, cfg.window.height), (800, 600));
        assert_eq!(cfg.physics.fps, 60);
        assert_eq!(cfg.physics.gravity, 20.0);
        assert_eq!(cfg.player.jump_vel, 13.0);
        assert_eq!(cfg.data.personal_bests_path(), Path::new("data").join("pbs.toml"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = Config::from_toml_str(
            r#"
[window]
state = "Fullscreen"

[player]
walk_vel = 12.0
"#,
        )
        .unwrap();
        assert_eq!(cfg.window.state, WindowState::Fullscreen);
        assert_eq!(cfg.window.width, 800);
        assert_eq!(cfg.player.walk_vel, 12.0);
        assert_eq!(cfg.player.jump_vel, 13.0);
        assert_eq!(cfg.physics, PhysicsConfig::default());
    }

    #[test]
    fn small_window_is_clamped() {
        let cfg = Config::from_toml_str("[window]\nwidth = 640\nheight = 480\n").unwrap();
        assert_eq!((cfg.window.width, cfg.window.height), (800, 600));
    }

    #[test]
    fn zero_fps_is_replaced() {
        let cfg = Config::from_toml_str("[physics]\nfps = 0\n").unwrap();
        assert_eq!(cfg.physics.fps, PHYSICS_FPS);
    }

    #[test]
    fn unknown_window_state_is_an_error() {
        assert!(matches!(
            Config::from_toml_str("[window]\nstate = \"Maximised\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unparseable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tilehop.toml");
        std::fs::write(&path, "[[[nope").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(Config::load_from(&dir.path().join("missing.toml")), Config::default());
    }

    #[test]
    fn write_default_roundtrips_and_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("tilehop.toml");
        assert!(Config::write_default(&path).unwrap());
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# tilehop configuration"));
        assert_eq!(Config::load_from(&path), Config::default());

        std::fs::write(&path, "[physics]\ngravity = 5.0\n").unwrap();
        assert!(!Config::write_default(&path).unwrap());
        assert_eq!(Config::load_from(&path).physics.gravity, 5.0);
    }

    #[test]
    fn shipped_config_parses_without_fly_binding() {
        let cfg = Config::from_toml_str(include_str!("../../../config/tilehop.toml")).unwrap();
        assert_eq!(cfg.window, WindowConfig::default());
        assert_eq!(cfg.physics, PhysicsConfig::default());
        assert_eq!(cfg.bindings.fly, KeyBindings::default().fly);

        let input = crate::input::InputAggregator::new(cfg.bindings);
        let mut keys = crate::input::KeyState::default();
        keys.advance(["F"]);
        assert_eq!(
            input.poll(&keys).intents.contains(tilehop_core::intent::MotionIntent::FLY),
            cfg!(debug_assertions)
        );
    }

    #[test]
    fn level_settings_follow_config() {
        let cfg = Config::from_toml_str("[physics]\nfps = 120\ngravity = 30.0\n").unwrap();
        let s = cfg.level_settings();
        assert_eq!(s.fps, 120);
        assert_eq!(s.gravity, 30.0);
        assert_eq!(s.tuning, PlayerTuning::default());
    }
}
