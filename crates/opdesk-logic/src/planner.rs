//! Day-by-day sanity simulation with level-up feedback.
//!
//! The planner forecasts how many times a target stage can be cleared
//! before a deadline. Each simulated day carries the player's progression,
//! leftover sanity, banked bonus sanity and the remaining weekly
//! annihilation quota forward from the previous day, so re-simulating from
//! any index reproduces a full simulation — the whole thing is a fold over
//! (setup, schedule, previous day).
//!
//! Level-ups feed back into the same day: each level gained restores
//! almost a full sanity bar, which can afford more clears, which can grant
//! another level. The cascade runs as an explicit bounded loop — one pass
//! per level-up batch — never recursion.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::constants::{add_exp, GameConstants, Progression};
use crate::stages::{Stage, StageTable};

/// One itemized sanity gain or loss.
///
/// A zero-delta entry is a pure annotation (a bonus banked for later) and
/// still appears in the ordered log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub delta: i64,
    pub label: String,
    pub detail: Option<String>,
}

/// Ordered, itemized log of one day's sanity movements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityLedger {
    entries: Vec<LedgerEntry>,
}

impl SanityLedger {
    pub fn log(&mut self, delta: i64, label: &str) {
        self.entries.push(LedgerEntry {
            delta,
            label: label.to_string(),
            detail: None,
        });
    }

    pub fn log_with_detail(&mut self, delta: i64, label: &str, detail: String) {
        self.entries.push(LedgerEntry {
            delta,
            label: label.to_string(),
            detail: Some(detail),
        });
    }

    /// Running sum of all deltas.
    pub fn value(&self) -> i64 {
        self.entries.iter().map(|e| e.delta).sum()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// One simulated day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerDay {
    pub date: NaiveDate,
    pub start: Progression,
    pub start_sanity: i64,
    /// Whether the target stage opens on this weekday.
    pub stage_open: bool,
    pub ledger: SanityLedger,
    pub finish: Progression,
    /// Sanity deliberately left unspent for an open tomorrow.
    pub finish_sanity: i64,
    /// Banked bonus sanity not yet flushed into an open day.
    pub finish_reserve: i64,
    /// Sanity still owed to this week's annihilation quota.
    pub finish_annihilation_left: i64,
    pub completions: u32,
}

impl PlannerDay {
    pub fn new(date: NaiveDate, stage_open: bool) -> Self {
        let zero = Progression { level: 0, exp: 0 };
        Self {
            date,
            start: zero,
            start_sanity: 0,
            stage_open,
            ledger: SanityLedger::default(),
            finish: zero,
            finish_sanity: 0,
            finish_reserve: 0,
            finish_annihilation_left: 0,
            completions: 0,
        }
    }
}

/// Weekly forced annihilation sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnihilationPlan {
    /// Sanity cost of one run (map-dependent).
    pub per_run_cost: i64,
    /// Sanity owed per week, reset every Monday.
    pub weekly_quota: i64,
}

/// Everything the simulation consumes besides the game tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSetup {
    pub start_date: NaiveDate,
    /// Simulation covers `start_date <= d < target_date`.
    pub target_date: NaiveDate,
    pub target_stage: String,
    pub initial: Progression,
    pub initial_sanity: i64,
    /// Passive regeneration per day.
    pub daily_regen: i64,
    /// Bank a monthly-card bonus every day.
    pub monthly_card: bool,
    /// Bank a weekly-mission bonus every Monday.
    pub weekly_missions: bool,
    pub annihilation: Option<AnnihilationPlan>,
}

/// Fatal setup error, raised before any day is simulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    UnknownStage(String),
    NonPositiveCost { code: String, cost: i64 },
    IncompleteConstants { max_level: u32 },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::UnknownStage(code) => {
                write!(f, "target stage {:?} is not in the stage table", code)
            }
            PlanError::NonPositiveCost { code, cost } => {
                write!(f, "stage {:?} has non-positive sanity cost {}", code, cost)
            }
            PlanError::IncompleteConstants { max_level } => {
                write!(f, "constants tables do not cover max level {}", max_level)
            }
        }
    }
}

impl std::error::Error for PlanError {}

/// Resolve and validate the target stage before simulating.
pub fn validate_plan(
    setup: &PlanSetup,
    stages: &StageTable,
    constants: &GameConstants,
) -> Result<Stage, PlanError> {
    let stage = stages
        .find(&setup.target_stage)
        .ok_or_else(|| PlanError::UnknownStage(setup.target_stage.clone()))?;
    if stage.sanity_cost <= 0 {
        return Err(PlanError::NonPositiveCost {
            code: stage.code.clone(),
            cost: stage.sanity_cost,
        });
    }
    if let Some(ann) = &setup.annihilation {
        if ann.per_run_cost <= 0 {
            return Err(PlanError::NonPositiveCost {
                code: "annihilation".to_string(),
                cost: ann.per_run_cost,
            });
        }
    }
    if !constants.covers_levels() {
        return Err(PlanError::IncompleteConstants {
            max_level: constants.max_level,
        });
    }
    Ok(stage.clone())
}

/// Build the contiguous day sequence for `start_date <= d < target_date`.
pub fn build_days(setup: &PlanSetup, stage: &Stage) -> Vec<PlannerDay> {
    let mut days = Vec::new();
    let mut date = setup.start_date;
    while date < setup.target_date {
        days.push(PlannerDay::new(date, stage.is_open(date.weekday())));
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    days
}

/// Total target-stage completions over the simulated range.
pub fn total_completions(days: &[PlannerDay]) -> u32 {
    days.iter().map(|d| d.completions).sum()
}

/// Sanity restored by leveling from `from_level` up to `to_level`.
///
/// Each level gained contributes `cap(level) − 1`: the bar refills to the
/// new cap, minus the one unit of regen lost while momentarily sitting
/// above the not-yet-applied cap.
fn level_up_restore(constants: &GameConstants, from_level: u32, to_level: u32) -> i64 {
    (from_level + 1..=to_level)
        .map(|level| constants.sanity_cap(level) - 1)
        .sum()
}

/// Simulate days `from..` in place.
///
/// Day `i` starts from day `i − 1`'s finish state (or the setup's initial
/// values for day 0), so calling this again from any index with unchanged
/// inputs reproduces the original results — the recompute is idempotent.
///
/// The caller must have run [`validate_plan`]: the stage cost is assumed
/// positive and the constants tables complete.
pub fn simulate_forward(
    days: &mut [PlannerDay],
    from: usize,
    setup: &PlanSetup,
    constants: &GameConstants,
    stage: &Stage,
) {
    for i in from..days.len() {
        let (start, start_sanity, mut reserve, mut annihilation_left) = if i == 0 {
            (setup.initial, setup.initial_sanity, 0, 0)
        } else {
            let prev = &days[i - 1];
            (
                prev.finish,
                prev.finish_sanity,
                prev.finish_reserve,
                prev.finish_annihilation_left,
            )
        };

        let day = &mut days[i];
        let weekday = day.date.weekday();

        // Idempotent recompute: wipe whatever a previous pass produced.
        day.start = start;
        day.start_sanity = start_sanity;
        day.ledger.clear();
        day.completions = 0;
        day.finish_sanity = 0;

        if start_sanity > 0 {
            day.ledger.log(start_sanity, "starting balance");
        }
        day.ledger.log(setup.daily_regen, "natural regen");

        if setup.monthly_card {
            day.ledger
                .log_with_detail(0, "monthly card", "+80 banked".to_string());
            reserve += crate::constants::bonus::MONTHLY_CARD_DAILY;
        }
        if weekday == Weekday::Mon {
            if let Some(ann) = &setup.annihilation {
                annihilation_left = ann.weekly_quota;
            }
            if setup.weekly_missions {
                day.ledger
                    .log_with_detail(0, "weekly missions", "+240 banked".to_string());
                reserve += crate::constants::bonus::WEEKLY_MISSIONS;
            }
        }

        let mut level = start.level;
        let mut exp = start.exp;
        let tomorrow_open = day
            .date
            .succ_opt()
            .map(|d| stage.is_open(d.weekday()))
            .unwrap_or(false);
        // Closed-day saving bookkeeping: what this day has set aside so
        // far, so a cap increase mid-day only logs the difference.
        let mut saved_today: i64 = 0;

        loop {
            let mut leveled_this_pass = false;

            // Weekly forced sink: pay on Sunday at the latest, or
            // immediately when the stage stays open through the week and
            // no closed day will come along to absorb it.
            if annihilation_left > 0
                && (weekday == Weekday::Sun || stage.open_rest_of_week(weekday))
            {
                day.ledger.log(-annihilation_left, "annihilation");
                annihilation_left = 0;
            }

            if day.stage_open {
                // Flush the whole bank first: spending early maximizes
                // the chance of leveling sooner.
                if reserve > 0 {
                    day.ledger.log(reserve, "reserve spent");
                    reserve = 0;
                }
                // Clear as many runs as the balance affords; a level-up
                // refills the bar, so keep going until a batch passes
                // without one.
                loop {
                    let value = day.ledger.value().max(0);
                    let runs = value / stage.sanity_cost;
                    if runs == 0 {
                        break;
                    }
                    let spent = runs * stage.sanity_cost;
                    day.ledger.log_with_detail(
                        -spent,
                        "farming",
                        format!("{} ×{}", stage.code, runs),
                    );
                    day.completions += runs as u32;
                    let gain = add_exp(
                        constants,
                        Progression { level, exp },
                        stage.exp_for_sanity(spent),
                    );
                    if gain.levels_gained > 0 {
                        let restored = level_up_restore(constants, level, gain.level);
                        day.ledger.log_with_detail(
                            restored,
                            "level up",
                            format!("Lv{} → Lv{}", level, gain.level),
                        );
                        level = gain.level;
                        exp = gain.exp;
                    } else {
                        exp = gain.exp;
                        break;
                    }
                }
                // A sub-cost remainder is worth keeping only if it can be
                // spent tomorrow.
                let value = day.ledger.value();
                if value > 0 && tomorrow_open {
                    day.ledger.log(-value, "saved for tomorrow");
                    day.finish_sanity = value;
                }
            } else {
                if tomorrow_open {
                    // Save the largest cost-multiple that fits under the
                    // cap. On a repeat pass the cap may have grown; log
                    // only the increase over what is already set aside.
                    let value = day.ledger.value().max(0);
                    let cap = constants.sanity_cap(level);
                    let target = (value + saved_today).min(cap);
                    let new_saved = target - target % stage.sanity_cost;
                    if new_saved != saved_today {
                        day.ledger.log(-(new_saved - saved_today), "saved for tomorrow");
                        saved_today = new_saved;
                        day.finish_sanity = new_saved;
                    }
                }
                // Closed days also work down the weekly sink.
                if annihilation_left > 0 {
                    if let Some(ann) = &setup.annihilation {
                        let value = day.ledger.value().max(0);
                        let spend = if annihilation_left < ann.per_run_cost
                            && value >= annihilation_left
                        {
                            // Final partial run: the leftover quota is
                            // smaller than one run and is consumed whole.
                            annihilation_left
                        } else {
                            value.min(annihilation_left) / ann.per_run_cost * ann.per_run_cost
                        };
                        if spend > 0 {
                            day.ledger.log(-spend, "annihilation");
                            annihilation_left -= spend;
                        }
                    }
                }
            }

            // Whatever is left cannot be stored past the cap: convert it
            // to experience instead of letting it evaporate.
            let value = day.ledger.value();
            if value > 0 {
                day.ledger.log(-value, "surplus to exp");
                let gain = add_exp(
                    constants,
                    Progression { level, exp },
                    stage.exp_for_sanity(value),
                );
                if gain.levels_gained > 0 {
                    let restored = level_up_restore(constants, level, gain.level);
                    day.ledger.log_with_detail(
                        restored,
                        "level up",
                        format!("Lv{} → Lv{}", level, gain.level),
                    );
                    level = gain.level;
                    exp = gain.exp;
                    leveled_this_pass = true;
                } else {
                    exp = gain.exp;
                }
            }

            if !leveled_this_pass {
                break;
            }
        }

        day.finish = Progression { level, exp };
        day.finish_reserve = reserve;
        day.finish_annihilation_left = annihilation_left;
    }
}
