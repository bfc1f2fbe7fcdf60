use serde::{Deserialize, Serialize};

/// Default ground friction (velocity units per second of deceleration).
pub const DEFAULT_FRICTION: f32 = 12.0;

/// Tile types for the level grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    Solid,
    Danger,
    Goal,
    Checkpoint,
}

/// Restitution coefficients in `[0, 1]` per surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounce {
    pub top: f32,
    pub bottom: f32,
    pub side: f32,
}

/// One grid cell. Bounce and friction only matter for [`TileKind::Solid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub bounce: Bounce,
    pub friction: f32,
    /// Drawn over the player; no gameplay effect.
    pub in_front: bool,
}

impl Default for Tile {
    fn default() -> Self {
        AIR
    }
}

impl Tile {
    pub const fn new(kind: TileKind) -> Self {
        Self {
            kind,
            bounce: Bounce {
                top: 0.0,
                bottom: 0.0,
                side: 0.0,
            },
            friction: DEFAULT_FRICTION,
            in_front: false,
        }
    }

    pub const fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub const fn with_bounce(mut self, bounce: Bounce) -> Self {
        self.bounce = bounce;
        self
    }

    pub const fn drawn_in_front(mut self) -> Self {
        self.in_front = true;
        self
    }

    pub fn is_solid(&self) -> bool {
        self.kind == TileKind::Solid
    }

    pub fn is_empty(&self) -> bool {
        self.kind == TileKind::Empty
    }
}

pub const AIR: Tile = Tile::new(TileKind::Empty);
pub const FLOOR: Tile = Tile::new(TileKind::Solid);
pub const WALL: Tile = Tile::new(TileKind::Solid).with_friction(16.0);
pub const TRACK: Tile = Tile::new(TileKind::Solid).with_friction(32.0);
pub const SLIME: Tile = Tile::new(TileKind::Solid)
    .with_bounce(Bounce {
        top: 0.75,
        bottom: 0.9,
        side: 0.5,
    })
    .with_friction(42.0);
pub const GHOST: Tile = Tile::new(TileKind::Empty).drawn_in_front();
pub const FLAG: Tile = Tile::new(TileKind::Goal);
pub const LAVA: Tile = Tile::new(TileKind::Danger);
pub const CHECKPOINT: Tile = Tile::new(TileKind::Checkpoint);

/// Glyph used by the ASCII level format for the player spawn cell.
pub const SPAWN_GLYPH: char = 'P';

/// Map a level glyph to its tile. `None` for unknown glyphs.
pub fn tile_for_glyph(glyph: char) -> Option<Tile> {
    let tile = match glyph {
        '.' | ' ' | SPAWN_GLYPH => AIR,
        '#' => FLOOR,
        '=' => WALL,
        'T' => TRACK,
        'S' => SLIME,
        '~' => GHOST,
        'F' => FLAG,
        'L' => LAVA,
        'C' => CHECKPOINT,
        _ => return None,
    };
    Some(tile)
}
