use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Statistics of one level attempt, or of a whole run when accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    /// Physics ticks spent in the level.
    pub time: u32,
    pub jumps: u32,
    pub double_jumps: u32,
    pub deaths: u32,
    pub restarts: u32,
}

impl Stats {
    /// Combine level-owned counters with the player's counters.
    pub fn from_parts(time: u32, restarts: u32, player: &PlayerStats) -> Self {
        Self {
            time,
            jumps: player.jumps,
            double_jumps: player.double_jumps,
            deaths: player.deaths,
            restarts,
        }
    }

    pub const fn total_jumps(&self) -> u32 {
        self.jumps + self.double_jumps
    }

    pub const fn total_respawns(&self) -> u32 {
        self.deaths + self.restarts
    }

    /// Lexicographic personal-best comparison: fewer ticks, then fewer
    /// respawns, then fewer jumps. Ties are never better, so an equal run
    /// does not replace a stored PB.
    pub fn better_than(&self, other: &Stats) -> bool {
        if self.time != other.time {
            return self.time < other.time;
        }
        if self.total_respawns() != other.total_respawns() {
            return self.total_respawns() < other.total_respawns();
        }
        self.total_jumps() < other.total_jumps()
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, rhs: Stats) -> Stats {
        self += rhs;
        self
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        self.time += rhs.time;
        self.jumps += rhs.jumps;
        self.double_jumps += rhs.double_jumps;
        self.deaths += rhs.deaths;
        self.restarts += rhs.restarts;
    }
}

/// Counters owned by the player entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub jumps: u32,
    pub double_jumps: u32,
    pub deaths: u32,
    pub times_spawned: u32,
}

impl AddAssign for PlayerStats {
    fn add_assign(&mut self, rhs: PlayerStats) {
        self.jumps += rhs.jumps;
        self.double_jumps += rhs.double_jumps;
        self.deaths += rhs.deaths;
        self.times_spawned += rhs.times_spawned;
    }
}
