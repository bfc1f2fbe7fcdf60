use std::path::{Path, PathBuf};

use crate::grid::{LevelParseError, TileMap};
use crate::level::{Level, LevelSettings};

const BUILTIN: [&str; 3] = [
    include_str!("../levels/level1.txt"),
    include_str!("../levels/level2.txt"),
    include_str!("../levels/level3.txt"),
];

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("no level {index} (catalog has {len})")]
    NoSuchLevel { index: usize, len: usize },
    #[error("level {name:?} is malformed: {source}")]
    Parse {
        name: String,
        #[source]
        source: LevelParseError,
    },
    #[error("failed to read level {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One level source with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelEntry {
    pub name: String,
    pub source: String,
}

impl LevelEntry {
    /// Name comes from the first comment line (text before `:`), falling
    /// back to `fallback`.
    pub fn new(source: impl Into<String>, fallback: &str) -> Self {
        let source = source.into();
        let name = source
            .lines()
            .find_map(|l| l.strip_prefix(';'))
            .map(|c| c.split(':').next().unwrap_or(c).trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Self { name, source }
    }

    pub fn parse(&self) -> Result<TileMap, CatalogError> {
        TileMap::parse(&self.source).map_err(|source| CatalogError::Parse {
            name: self.name.clone(),
            source,
        })
    }
}

/// Ordered list of playable levels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<LevelEntry>,
}

impl Catalog {
    /// Levels shipped with the game.
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN
                .iter()
                .enumerate()
                .map(|(i, src)| LevelEntry::new(*src, &format!("Level {}", i + 1)))
                .collect(),
        )
    }

    pub fn from_entries(entries: Vec<LevelEntry>) -> Self {
        Self { entries }
    }

    /// A single-level catalog read from an ASCII level file.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let source = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let entry = LevelEntry::new(source, &fallback);
        entry.parse()?;
        Ok(Self::from_entries(vec![entry]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LevelEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&LevelEntry> {
        self.entries.get(index)
    }

    /// Build level `index`. `Ok(None)` past the end of the catalog.
    pub fn make_level(
        &self,
        index: usize,
        continuous: bool,
        settings: LevelSettings,
    ) -> Result<Option<Level>, CatalogError> {
        let Some(entry) = self.entries.get(index) else {
            return Ok(None);
        };
        let map = entry.parse()?;
        tracing::debug!(index, name = %entry.name, continuous, "loading level");
        Ok(Some(Level::new(index, map, continuous, settings)))
    }

    /// Like [`Catalog::make_level`], but a missing level is an error.
    pub fn level(
        &self,
        index: usize,
        continuous: bool,
        settings: LevelSettings,
    ) -> Result<Level, CatalogError> {
        self.make_level(index, continuous, settings)?
            .ok_or(CatalogError::NoSuchLevel {
                index,
                len: self.len(),
            })
    }
}
