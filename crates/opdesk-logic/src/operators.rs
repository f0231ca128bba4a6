//! Operator records and the fixed name/code tables used when matching
//! recruitment tags against them.
//!
//! Operators are immutable after load except for the id fixup the table
//! loader performs (the id is the table key, not a field of the record).

use serde::{Deserialize, Serialize};

/// Highest rarity tier in the game.
pub const MAX_RARITY: u8 = 6;

/// Rarity-category tags matched against the raw tag list.
pub const ROBOT_TAG: &str = "Robot";
pub const STARTER_TAG: &str = "Starter";

/// Rarity-category tags matched against the rarity tier itself.
pub const SENIOR_OPERATOR_TAG: &str = "Senior Operator";
pub const TOP_OPERATOR_TAG: &str = "Top Operator";

/// A recruitable character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    /// Table key, assigned by the loader.
    pub id: String,
    pub name: String,
    /// Rarity in stars, 1..=6.
    pub rarity: u8,
    /// Deployment position ("Melee" / "Ranged").
    pub position: String,
    /// Internal class code ("SNIPER", "PIONEER", ...).
    pub class_code: String,
    /// Raw tag ids from the game data (affixes plus "Robot"/"Starter").
    pub tag_list: Vec<String>,
}

impl Operator {
    pub fn has_raw_tag(&self, tag: &str) -> bool {
        self.tag_list.iter().any(|t| t == tag)
    }
}

/// Fixed profession-display-name → internal-class-code table.
///
/// `None` for an unknown name — the caller treats that as a corrupted tag
/// dataset, not a soft miss.
pub fn class_code_for(profession: &str) -> Option<&'static str> {
    match profession {
        "Vanguard" => Some("PIONEER"),
        "Guard" => Some("WARRIOR"),
        "Defender" => Some("TANK"),
        "Sniper" => Some("SNIPER"),
        "Caster" => Some("CASTER"),
        "Medic" => Some("MEDIC"),
        "Supporter" => Some("SUPPORT"),
        "Specialist" => Some("SPECIAL"),
        _ => None,
    }
}

/// Rarity tiers that have a dedicated recruitment tag.
pub fn rarity_tag_name(rarity: u8) -> Option<&'static str> {
    match rarity {
        5 => Some(SENIOR_OPERATOR_TAG),
        6 => Some(TOP_OPERATOR_TAG),
        _ => None,
    }
}
