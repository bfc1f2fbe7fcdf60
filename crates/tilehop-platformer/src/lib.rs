pub mod catalog;
pub mod config;
pub mod grid;
pub mod input;
pub mod level;
pub mod physics;
pub mod player;
pub mod presentation;
pub mod scene;
pub mod tile;

pub use catalog::{Catalog, CatalogError, LevelEntry};
pub use config::Config;
pub use grid::{LevelParseError, TileGrid, TileMap};
pub use input::{Action, FrameInput, InputAggregator, KeyBindings, KeyState};
pub use level::{Level, LevelCommand, LevelEvent, LevelSettings, LevelState};
pub use player::{JumpState, Player, PlayerEvent};
pub use scene::{Game, MenuChoice, Scene, Transition};
pub use tile::Tile;
