//! Stage records, weekly open/closed schedules, and clear-reward
//! derivation.
//!
//! The game-data stage table stores the two-star and plain clear rewards;
//! the full (three-star) clear reward is derived as clear × 1.2. The
//! planner assumes full clears.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// A completable activity with a fixed sanity cost and weekly schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    /// Stage code, e.g. "CE-5".
    pub code: String,
    pub sanity_cost: i64,
    /// Experience reward for a plain clear.
    pub exp_reward: i64,
    /// Experience reward for a two-star clear.
    pub two_star_exp_reward: i64,
    /// LMD reward for a plain clear.
    pub lmd_reward: i64,
    /// LMD reward for a two-star clear.
    pub two_star_lmd_reward: i64,
    /// Open flags indexed Monday..Sunday.
    pub open_weekdays: [bool; 7],
}

impl Stage {
    /// Full (three-star) clear experience: clear reward × 1.2.
    pub fn full_clear_exp(&self) -> i64 {
        self.exp_reward * 12 / 10
    }

    /// Full (three-star) clear LMD: clear reward × 1.2.
    pub fn full_clear_lmd(&self) -> i64 {
        self.lmd_reward * 12 / 10
    }

    pub fn is_open(&self, weekday: Weekday) -> bool {
        self.open_weekdays[weekday.num_days_from_monday() as usize]
    }

    /// Is the stage open on every weekday from `from` through Sunday?
    pub fn open_rest_of_week(&self, from: Weekday) -> bool {
        (from.num_days_from_monday()..7).all(|i| self.open_weekdays[i as usize])
    }

    /// Experience earned by spending `sanity` here, at the full-clear
    /// rate. Multiplication before division keeps cost-multiples exact.
    pub fn exp_for_sanity(&self, sanity: i64) -> i64 {
        sanity * self.full_clear_exp() / self.sanity_cost
    }
}

/// Loaded stage table, queried by stage code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTable {
    stages: Vec<Stage>,
}

impl StageTable {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn find(&self, code: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.code == code)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}
