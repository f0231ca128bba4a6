//! Save/load for planner snapshots and user preferences.
//!
//! Snapshots use bincode for compact binary serialization of the whole
//! simulated day list; preferences use pretty-printed JSON so players can
//! inspect and hand-edit them.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use opdesk_logic::planner::{PlanSetup, PlannerDay};
use opdesk_logic::rarity::RarityFilter;

/// Version number for the snapshot format (increment when it changes).
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of a planner session.
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub setup: PlanSetup,
    pub days: Vec<PlannerDay>,
}

/// User preferences persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub rarity_filters: Vec<RarityFilter>,
    pub plan: PlanSetup,
}

#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    Json(serde_json::Error),
    VersionMismatch { expected: u32, found: u32 },
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "io error: {}", e),
            SaveError::Bincode(e) => write!(f, "snapshot encoding error: {}", e),
            SaveError::Json(e) => write!(f, "preferences encoding error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(f, "snapshot version {} (expected {})", found, expected)
            }
        }
    }
}

impl std::error::Error for SaveError {}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Json(e)
    }
}

/// Write a planner snapshot.
pub fn save_plan<W: Write>(
    writer: W,
    setup: &PlanSetup,
    days: &[PlannerDay],
) -> Result<(), SaveError> {
    let data = SaveData {
        version: SAVE_VERSION,
        setup: setup.clone(),
        days: days.to_vec(),
    };
    bincode::serialize_into(writer, &data)?;
    Ok(())
}

/// Read a planner snapshot, rejecting unknown versions.
pub fn load_plan<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let data: SaveData = bincode::deserialize_from(reader)?;
    if data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }
    Ok(data)
}

/// Write preferences as hand-editable JSON.
pub fn save_preferences<W: Write>(mut writer: W, prefs: &Preferences) -> Result<(), SaveError> {
    let json = serde_json::to_string_pretty(prefs)?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_preferences<R: Read>(reader: R) -> Result<Preferences, SaveError> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use opdesk_logic::constants::Progression;
    use opdesk_logic::planner::PlannerDay;
    use opdesk_logic::rarity::default_filters;

    fn setup() -> PlanSetup {
        let start = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        PlanSetup {
            start_date: start,
            target_date: start + chrono::Duration::days(3),
            target_stage: "CE-5".into(),
            initial: Progression { level: 42, exp: 310 },
            initial_sanity: 17,
            daily_regen: 240,
            monthly_card: true,
            weekly_missions: false,
            annihilation: None,
        }
    }

    #[test]
    fn snapshot_round_trip() {
        let s = setup();
        let days = vec![
            PlannerDay::new(s.start_date, true),
            PlannerDay::new(s.start_date.succ_opt().unwrap(), false),
        ];
        let mut buffer = Vec::new();
        save_plan(&mut buffer, &s, &days).unwrap();
        let loaded = load_plan(buffer.as_slice()).unwrap();
        assert_eq!(loaded.setup.target_stage, "CE-5");
        assert_eq!(loaded.days, days);
    }

    #[test]
    fn snapshot_version_is_checked() {
        let s = setup();
        let data = SaveData {
            version: 99,
            setup: s,
            days: Vec::new(),
        };
        let bytes = bincode::serialize(&data).unwrap();
        match load_plan(bytes.as_slice()) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, 99);
            }
            other => panic!("expected version mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn preferences_round_trip_as_json() {
        let prefs = Preferences {
            rarity_filters: default_filters(6),
            plan: setup(),
        };
        let mut buffer = Vec::new();
        save_preferences(&mut buffer, &prefs).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("CE-5"), "preferences should be readable JSON");
        let loaded = load_preferences(buffer.as_slice()).unwrap();
        assert_eq!(loaded.rarity_filters, prefs.rarity_filters);
        assert_eq!(loaded.plan.initial_sanity, 17);
    }
}
