//! Player progression tables and fixed planner bonuses.
//!
//! The per-level arrays come from the game-data constants table and are
//! 1-indexed by level via `level - 1`. Both arrays must cover
//! `max_level`; the planner validates that before simulating.

use serde::{Deserialize, Serialize};

/// Fixed sanity bonus amounts, in sanity units.
pub mod bonus {
    /// Daily bonus from the monthly card.
    pub const MONTHLY_CARD_DAILY: i64 = 80;
    /// Bonus from clearing the weekly missions, granted each Monday.
    pub const WEEKLY_MISSIONS: i64 = 240;
    /// Passive regeneration over a full day (1 sanity / 6 minutes).
    pub const DAILY_REGEN: i64 = 240;
}

/// Level → experience / sanity-cap lookup tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConstants {
    pub max_level: u32,
    /// Experience required to advance *from* each level.
    pub exp_per_level: Vec<i64>,
    /// Sanity cap at each level.
    pub sanity_cap_per_level: Vec<i64>,
}

impl GameConstants {
    /// Do the lookup arrays cover every level up to `max_level`?
    pub fn covers_levels(&self) -> bool {
        self.exp_per_level.len() >= self.max_level as usize
            && self.sanity_cap_per_level.len() >= self.max_level as usize
    }

    /// Experience required to advance from `level` to `level + 1`.
    pub fn exp_to_next(&self, level: u32) -> i64 {
        self.exp_per_level[level as usize - 1]
    }

    /// Sanity cap at `level`.
    pub fn sanity_cap(&self, level: u32) -> i64 {
        self.sanity_cap_per_level[level as usize - 1]
    }
}

/// Player level and experience into that level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    pub exp: i64,
}

/// Result of accumulating experience, possibly across several level-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpGain {
    pub level: u32,
    pub exp: i64,
    pub levels_gained: u32,
}

/// Accumulate `delta` experience onto `(level, exp)`.
///
/// Subtracts the next-level requirement while the running total stays
/// non-negative, so a single large delta can span multiple level-ups.
/// Accumulation stops at `max_level`; leftover experience simply sits
/// there.
pub fn add_exp(constants: &GameConstants, progression: Progression, delta: i64) -> ExpGain {
    let mut level = progression.level;
    let mut exp = progression.exp + delta;
    let mut levels_gained = 0;
    while level < constants.max_level {
        let required = constants.exp_to_next(level);
        if exp < required {
            break;
        }
        exp -= required;
        level += 1;
        levels_gained += 1;
    }
    ExpGain {
        level,
        exp,
        levels_gained,
    }
}
