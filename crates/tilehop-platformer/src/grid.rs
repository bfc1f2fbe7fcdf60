use glam::{IVec2, Vec2};

use tilehop_core::geom::Rect;

use crate::physics::DEFAULT_GRAVITY;
use crate::tile::{AIR, SPAWN_GLYPH, Tile, tile_for_glyph};

/// Read-only view of the level the player moves through.
///
/// Coordinates are world units; each cell is a 1×1 tile.
pub trait TileGrid {
    /// Collider of the cell containing `(x, y)`, or `None` when the cell is
    /// outside the map or holds an empty tile.
    fn collider(&self, x: f32, y: f32) -> Option<Rect>;

    /// Tile of the cell containing `(x, y)`; air outside the map.
    fn tile(&self, x: f32, y: f32) -> Tile;

    /// Downward acceleration in tiles/s².
    fn gravity(&self) -> f32;

    /// Tile and collider of a non-empty cell.
    fn contact(&self, x: f32, y: f32) -> Option<(Tile, Rect)> {
        let collider = self.collider(x, y)?;
        Some((self.tile(x, y), collider))
    }
}

/// Errors produced while parsing an ASCII level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelParseError {
    #[error("level has no rows")]
    Empty,
    #[error("row {row} is {found} tiles wide, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("level has no spawn marker '{SPAWN_GLYPH}'")]
    MissingSpawn,
    #[error("second spawn marker at column {column}, row {row}")]
    DuplicateSpawn { column: usize, row: usize },
}

/// A rectangular tile grid placed so its bottom edge sits at world `y = 0`
/// and it is centred horizontally on `x = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    tiles: Vec<Tile>,
    width: usize,
    height: usize,
    /// Spawn cell as (column, feet row): the player's feet rest on the top
    /// edge of row `spawn.y`.
    spawn: IVec2,
    gravity: f32,
}

impl TileMap {
    /// Build a map from row-major tiles.
    pub fn new(width: usize, height: usize, tiles: Vec<Tile>, spawn: IVec2) -> Self {
        assert_eq!(tiles.len(), width * height, "tile count must equal width * height");
        Self {
            tiles,
            width,
            height,
            spawn,
            gravity: DEFAULT_GRAVITY,
        }
    }

    /// Parse the ASCII level format. Lines starting with `;` and blank lines
    /// are skipped; unknown glyphs become air with a warning.
    pub fn parse(src: &str) -> Result<Self, LevelParseError> {
        let rows: Vec<&str> = src
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty() && !l.starts_with(';'))
            .collect();
        let Some(first) = rows.first() else {
            return Err(LevelParseError::Empty);
        };

        let width = first.chars().count();
        let height = rows.len();
        let mut tiles = Vec::with_capacity(width * height);
        let mut spawn = None;

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(LevelParseError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                if glyph == SPAWN_GLYPH {
                    if spawn.is_some() {
                        return Err(LevelParseError::DuplicateSpawn { column, row });
                    }
                    spawn = Some(IVec2::new(column as i32, row as i32 + 1));
                }
                let tile = tile_for_glyph(glyph).unwrap_or_else(|| {
                    tracing::warn!(%glyph, column, row, "unknown glyph in level, using air");
                    AIR
                });
                tiles.push(tile);
            }
        }

        let spawn = spawn.ok_or(LevelParseError::MissingSpawn)?;
        Ok(Self::new(width, height, tiles, spawn))
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// World position of the map's top-left corner.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(-(self.width as f32) / 2.0, -(self.height as f32))
    }

    pub fn spawn_cell(&self) -> IVec2 {
        self.spawn
    }

    /// World position of the player's feet for a spawn cell.
    pub fn spawn_point(&self, cell: IVec2) -> Vec2 {
        let offset = self.offset();
        Vec2::new(cell.x as f32 + offset.x + 0.5, cell.y as f32 + offset.y)
    }

    /// Cell containing a world position, `None` outside the map.
    pub fn cell_of(&self, x: f32, y: f32) -> Option<IVec2> {
        let offset = self.offset();
        let cx = (x - offset.x).floor();
        let cy = (y - offset.y).floor();
        if !cx.is_finite() || !cy.is_finite() {
            return None;
        }
        let (cx, cy) = (cx as i64, cy as i64);
        if cx < 0 || cy < 0 || cx >= self.width as i64 || cy >= self.height as i64 {
            return None;
        }
        Some(IVec2::new(cx as i32, cy as i32))
    }

    /// Tile at a cell; air outside the map.
    pub fn cell_tile(&self, cell: IVec2) -> Tile {
        if cell.x < 0 || cell.y < 0 {
            return AIR;
        }
        let (x, y) = (cell.x as usize, cell.y as usize);
        if x >= self.width || y >= self.height {
            return AIR;
        }
        self.tiles[y * self.width + x]
    }
}

impl TileGrid for TileMap {
    fn collider(&self, x: f32, y: f32) -> Option<Rect> {
        let cell = self.cell_of(x, y)?;
        if self.cell_tile(cell).is_empty() {
            return None;
        }
        let offset = self.offset();
        Some(Rect::new(
            cell.x as f32 + offset.x,
            cell.y as f32 + offset.y,
            1.0,
            1.0,
        ))
    }

    fn tile(&self, x: f32, y: f32) -> Tile {
        self.cell_of(x, y).map_or(AIR, |cell| self.cell_tile(cell))
    }

    fn gravity(&self) -> f32 {
        self.gravity
    }
}
