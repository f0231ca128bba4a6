//! Recruitment tag model.
//!
//! Tags are created once per game-data load and live as long as the data
//! source; selection and availability flip under user interaction. Identity
//! is the display name; the id form replaces spaces with hyphens and is
//! what operator raw tag lists reference for affix tags.

use serde::{Deserialize, Serialize};

/// How many tags the recruitment UI lets the player select at once.
///
/// Bounds the subset explosion at 2^5 − 1 = 31 result rows.
pub const MAX_SELECTED_TAGS: usize = 5;

/// Matching semantics of a tag (see [`crate::recruit`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagCategory {
    /// "Robot", "Starter", "Senior Operator", "Top Operator".
    Rarity,
    /// Deployment position: "Melee" / "Ranged".
    Position,
    /// Profession name, mapped to an internal class code.
    Class,
    /// Free-form affix matched against the operator's raw tag list.
    Affix,
}

/// A selectable recruitment tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub category: TagCategory,
    /// Currently part of the player's selection.
    pub is_selected: bool,
    /// Selectable right now (cleared once the selection is full).
    pub is_available: bool,
    /// Selected by OCR auto-fill rather than by hand.
    pub is_auto_selected: bool,
}

impl Tag {
    pub fn new(name: impl Into<String>, category: TagCategory) -> Self {
        Self {
            name: name.into(),
            category,
            is_selected: false,
            is_available: true,
            is_auto_selected: false,
        }
    }

    /// Normalized id form: spaces replaced by hyphens.
    pub fn id(&self) -> String {
        self.name.replace(' ', "-")
    }
}

/// Recompute availability over the whole tag list.
///
/// Unselected tags become unavailable once the selection is full; selected
/// tags always stay available so they can be deselected.
pub fn update_availability(tags: &mut [Tag]) {
    let selected = tags.iter().filter(|t| t.is_selected).count();
    let open = selected < MAX_SELECTED_TAGS;
    for tag in tags.iter_mut() {
        tag.is_available = tag.is_selected || open;
    }
}

/// Resolve recognized OCR text lines to known tags.
///
/// Lines are trimmed and matched case-sensitively against tag names;
/// unknown lines are dropped (OCR noise, not an error).
pub fn resolve_recognized<'a>(lines: &[String], tags: &'a [Tag]) -> Vec<&'a Tag> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter_map(|line| tags.iter().find(|t| t.name == line))
        .collect()
}
