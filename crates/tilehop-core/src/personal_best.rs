use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::stats::Stats;

/// Store key for a complete challenge run over every level.
pub const CHALLENGE_RUN_KEY: &str = "challenge_run";

/// Store key for a single level.
pub fn level_key(index: usize) -> String {
    index.to_string()
}

/// Outcome of submitting a finished run to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbOutcome {
    /// The best run stored before this one, if any.
    pub previous: Option<Stats>,
    /// Whether the submitted run replaced `previous`.
    pub new_pb: bool,
}

/// Personal bests keyed by level index or [`CHALLENGE_RUN_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalBests {
    entries: BTreeMap<String, Stats>,
}

impl PersonalBests {
    pub fn get(&self, key: &str) -> Option<&Stats> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, stats: Stats) {
        self.entries.insert(key.into(), stats);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Stats)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Store `stats` under `key` if there is no PB yet or it is strictly better.
    pub fn record(&mut self, key: &str, stats: Stats) -> PbOutcome {
        let previous = self.entries.get(key).copied();
        let new_pb = previous.is_none_or(|pb| stats.better_than(&pb));
        if new_pb {
            tracing::debug!(key, time = stats.time, "new personal best");
            self.entries.insert(key.to_string(), stats);
        }
        PbOutcome { previous, new_pb }
    }

    /// Parse a PB file. Entries that are not valid stats are skipped with a
    /// warning; only a file that is not TOML at all is an error.
    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        let raw: BTreeMap<String, toml::Value> = toml::from_str(content)?;
        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            match Stats::deserialize(value) {
                Ok(stats) => {
                    entries.insert(key, stats);
                },
                Err(e) => tracing::warn!(%key, "skipping malformed personal best: {e}"),
            }
        }
        Ok(Self { entries })
    }

    pub fn to_toml_string(&self) -> Result<String, StoreError> {
        Ok(toml::to_string(self)?)
    }

    /// Load from `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write to `path`, creating the parent directory when needed.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let content = self.to_toml_string()?;
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(time: u32, jumps: u32) -> Stats {
        Stats {
            time,
            jumps,
            ..Default::default()
        }
    }

    #[test]
    fn first_run_is_always_a_pb() {
        let mut pbs = PersonalBests::default();
        let outcome = pbs.record(&level_key(0), run(300, 4));
        assert!(outcome.new_pb);
        assert_eq!(outcome.previous, None);
        assert_eq!(pbs.get("0"), Some(&run(300, 4)));
    }

    #[test]
    fn equal_run_does_not_overwrite() {
        let mut pbs = PersonalBests::default();
        pbs.record("0", run(300, 4));
        let outcome = pbs.record("0", run(300, 4));
        assert!(!outcome.new_pb);
        assert_eq!(outcome.previous, Some(run(300, 4)));
    }

    #[test]
    fn worse_run_keeps_old_pb() {
        let mut pbs = PersonalBests::default();
        pbs.record("1", run(300, 4));
        let outcome = pbs.record("1", run(301, 0));
        assert!(!outcome.new_pb);
        assert_eq!(pbs.get("1"), Some(&run(300, 4)));
    }

    #[test]
    fn better_run_replaces_pb() {
        let mut pbs = PersonalBests::default();
        pbs.record(CHALLENGE_RUN_KEY, run(900, 10));
        let outcome = pbs.record(CHALLENGE_RUN_KEY, run(800, 20));
        assert!(outcome.new_pb);
        assert_eq!(outcome.previous, Some(run(900, 10)));
        assert_eq!(pbs.get(CHALLENGE_RUN_KEY), Some(&run(800, 20)));
    }

    #[test]
    fn toml_roundtrip_keeps_entries() {
        let mut pbs = PersonalBests::default();
        pbs.set("0", run(120, 3));
        pbs.set(CHALLENGE_RUN_KEY, run(1000, 30));
        let text = pbs.to_toml_string().unwrap();
        let back = PersonalBests::from_toml_str(&text).unwrap();
        assert_eq!(back, pbs);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let pbs = PersonalBests::from_toml_str("[\"2\"]\ntime = 77\n").unwrap();
        assert_eq!(pbs.get("2"), Some(&run(77, 0)));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(
            PersonalBests::from_toml_str("this is not toml ["),
            Err(StoreError::Parse(_))
        ));
    }

    #[test]
    fn malformed_entry_is_skipped_others_kept() {
        let pbs = PersonalBests::from_toml_str(
            "[\"7\"]\ntime = 500\n\n[\"8\"]\ntime = \"oops\"\n\nstray = 3\n",
        )
        .unwrap();
        assert_eq!(pbs.len(), 1);
        assert_eq!(pbs.get("7"), Some(&run(500, 0)));
        assert_eq!(pbs.get("8"), None);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let pbs = PersonalBests::load(&dir.path().join("nope.toml")).unwrap();
        assert!(pbs.is_empty());
    }

    #[test]
    fn save_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("pbs.toml");
        let mut pbs = PersonalBests::default();
        pbs.set("0", run(42, 1));
        pbs.save(&path).unwrap();

        let loaded = PersonalBests::load(&path).unwrap();
        assert_eq!(loaded.get("0"), Some(&run(42, 1)));
        assert_eq!(loaded.len(), 1);
    }
}
