//! Serde models for the external game-data JSON tables.
//!
//! The remote fetch/cache layer is an excluded collaborator; this module
//! starts from the JSON it hands over. Each loader parses the raw table
//! shape and converts it into the engine types from `opdesk-logic`,
//! performing the id fixup (operator ids are the table keys, not record
//! fields) and the validation the engines rely on.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use opdesk_logic::constants::GameConstants;
use opdesk_logic::operators::Operator;
use opdesk_logic::stages::{Stage, StageTable};
use opdesk_logic::tags::{Tag, TagCategory};

/// Fatal table-shape error: the fetched data does not describe the game
/// version this build understands.
#[derive(Debug)]
pub enum TableError {
    Json(serde_json::Error),
    IncompleteConstants { max_level: u32 },
    BadWeekday { stage: String, weekday: u8 },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Json(e) => write!(f, "table JSON error: {}", e),
            TableError::IncompleteConstants { max_level } => {
                write!(f, "constants arrays shorter than max level {}", max_level)
            }
            TableError::BadWeekday { stage, weekday } => {
                write!(f, "stage {:?} lists invalid weekday {}", stage, weekday)
            }
        }
    }
}

impl std::error::Error for TableError {}

impl From<serde_json::Error> for TableError {
    fn from(e: serde_json::Error) -> Self {
        TableError::Json(e)
    }
}

/// Raw operator record; the id lives in the table key.
#[derive(Debug, Deserialize)]
pub struct OperatorRecord {
    pub name: String,
    pub rarity: u8,
    pub position: String,
    /// Internal class code, e.g. "SNIPER".
    pub profession: String,
    #[serde(default)]
    pub tag_list: Vec<String>,
}

/// Parse the operator table, assigning each record its table key as id.
///
/// A `BTreeMap` keeps roster order deterministic across loads.
pub fn load_operator_table(json: &str) -> Result<Vec<Operator>, TableError> {
    let raw: BTreeMap<String, OperatorRecord> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|(id, record)| Operator {
            id,
            name: record.name,
            rarity: record.rarity,
            position: record.position,
            class_code: record.profession,
            tag_list: record.tag_list,
        })
        .collect())
}

/// Raw recruitment tag record.
#[derive(Debug, Deserialize)]
pub struct TagRecord {
    pub name: String,
    /// Deserialized straight into [`TagCategory`]; an unknown category
    /// string fails the whole load.
    pub category: TagCategory,
}

pub fn load_tag_table(json: &str) -> Result<Vec<Tag>, TableError> {
    let raw: Vec<TagRecord> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|r| Tag::new(r.name, r.category))
        .collect())
}

/// Raw stage record with weekday numbers (0 = Monday .. 6 = Sunday).
#[derive(Debug, Deserialize)]
pub struct StageRecord {
    pub code: String,
    pub ap_cost: i64,
    pub exp_gain: i64,
    pub two_star_exp_gain: i64,
    pub gold_gain: i64,
    pub two_star_gold_gain: i64,
    pub open_days: Vec<u8>,
}

pub fn load_stage_table(json: &str) -> Result<StageTable, TableError> {
    let raw: Vec<StageRecord> = serde_json::from_str(json)?;
    let mut stages = Vec::with_capacity(raw.len());
    for record in raw {
        let mut open_weekdays = [false; 7];
        for &day in &record.open_days {
            if day > 6 {
                return Err(TableError::BadWeekday {
                    stage: record.code,
                    weekday: day,
                });
            }
            open_weekdays[day as usize] = true;
        }
        stages.push(Stage {
            code: record.code,
            sanity_cost: record.ap_cost,
            exp_reward: record.exp_gain,
            two_star_exp_reward: record.two_star_exp_gain,
            lmd_reward: record.gold_gain,
            two_star_lmd_reward: record.two_star_gold_gain,
            open_weekdays,
        });
    }
    Ok(StageTable::new(stages))
}

/// Raw game-constants record.
#[derive(Debug, Deserialize)]
pub struct ConstantsRecord {
    pub max_player_level: u32,
    pub player_exp_map: Vec<i64>,
    pub player_ap_map: Vec<i64>,
}

pub fn load_constants_table(json: &str) -> Result<GameConstants, TableError> {
    let raw: ConstantsRecord = serde_json::from_str(json)?;
    let constants = GameConstants {
        max_level: raw.max_player_level,
        exp_per_level: raw.player_exp_map,
        sanity_cap_per_level: raw.player_ap_map,
    };
    if !constants.covers_levels() {
        return Err(TableError::IncompleteConstants {
            max_level: constants.max_level,
        });
    }
    Ok(constants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_ids_come_from_table_keys() {
        let json = r#"{
            "char_102": {
                "name": "Texas",
                "rarity": 5,
                "position": "Melee",
                "profession": "PIONEER",
                "tag_list": ["DPS", "Crowd-Control"]
            },
            "char_285": {
                "name": "Lancet-2",
                "rarity": 1,
                "position": "Melee",
                "profession": "MEDIC",
                "tag_list": ["Robot", "Healing"]
            }
        }"#;
        let ops = load_operator_table(json).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].id, "char_102");
        assert_eq!(ops[0].name, "Texas");
        assert_eq!(ops[1].id, "char_285");
    }

    #[test]
    fn unknown_tag_category_fails_the_load() {
        let json = r#"[{ "name": "DPS", "category": "Flavor" }]"#;
        assert!(load_tag_table(json).is_err());
    }

    #[test]
    fn stage_weekdays_validated() {
        let json = r#"[{
            "code": "CE-5", "ap_cost": 30,
            "exp_gain": 120, "two_star_exp_gain": 100,
            "gold_gain": 7500, "two_star_gold_gain": 6000,
            "open_days": [0, 3, 8]
        }]"#;
        match load_stage_table(json) {
            Err(TableError::BadWeekday { stage, weekday }) => {
                assert_eq!(stage, "CE-5");
                assert_eq!(weekday, 8);
            }
            other => panic!("expected BadWeekday, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn short_constants_rejected() {
        let json = r#"{
            "max_player_level": 120,
            "player_exp_map": [500, 800],
            "player_ap_map": [82, 84]
        }"#;
        assert!(matches!(
            load_constants_table(json),
            Err(TableError::IncompleteConstants { max_level: 120 })
        ));
    }
}
