//! Per-rarity-tier post-processing of recruitment result rows.
//!
//! The configured mode for each star tier decides whether operators of
//! that tier are shown, hidden, required, or ban the whole row. Two tag
//! overrides protect rows the player asked for explicitly: a hand-selected
//! "Robot" tag un-hides tier 1, "Starter" un-hides tier 2.

use serde::{Deserialize, Serialize};

use crate::operators::{ROBOT_TAG, STARTER_TAG};
use crate::recruit::ResultRow;

/// What to do with operators of one star tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    /// Keep the operators, no effect on the row.
    Show,
    /// Remove the operators from the row; the row may survive without them.
    Hide,
    /// Drop any row that has no operator of this tier.
    Require,
    /// Drop any row that has an operator of this tier.
    Exclude,
}

/// Configured mode for one star tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityFilter {
    /// Star tier, 1..=6.
    pub stars: u8,
    pub mode: FilterMode,
}

impl RarityFilter {
    pub fn new(stars: u8, mode: FilterMode) -> Self {
        Self { stars, mode }
    }
}

/// One Show filter per tier — the neutral configuration.
pub fn default_filters(tiers: u8) -> Vec<RarityFilter> {
    (1..=tiers)
        .map(|stars| RarityFilter::new(stars, FilterMode::Show))
        .collect()
}

/// Working mode array indexed by `stars - 1`, from the configured filters.
fn mode_table(filters: &[RarityFilter]) -> Vec<FilterMode> {
    let tiers = filters.iter().map(|f| f.stars).max().unwrap_or(0) as usize;
    let mut modes = vec![FilterMode::Show; tiers];
    for f in filters {
        if f.stars >= 1 {
            modes[f.stars as usize - 1] = f.mode;
        }
    }
    modes
}

/// A hand-selected tag forces its tier visible even under Hide/Exclude.
fn apply_tag_overrides(row: &ResultRow, modes: &mut [FilterMode]) {
    for (tag_name, tier) in [(ROBOT_TAG, 1usize), (STARTER_TAG, 2usize)] {
        let explicit = row
            .tags
            .iter()
            .any(|t| !t.is_auto_selected && t.name == tag_name);
        if explicit
            && tier <= modes.len()
            && matches!(modes[tier - 1], FilterMode::Hide | FilterMode::Exclude)
        {
            modes[tier - 1] = FilterMode::Show;
        }
    }
}

/// Filter one row in place. Returns false when the row must be dropped.
fn filter_row(row: &mut ResultRow, filters: &[RarityFilter]) -> bool {
    let mut modes = mode_table(filters);
    apply_tag_overrides(row, &mut modes);

    let mut hidden = Vec::new();
    for (idx, op) in row.operators.iter().enumerate() {
        let tier = op.rarity as usize;
        // Tiers beyond the configured filter list are always shown.
        let Some(mode) = modes.get(tier.wrapping_sub(1)).copied() else {
            continue;
        };
        match mode {
            FilterMode::Exclude => return false,
            FilterMode::Hide => hidden.push(idx),
            // Satisfied: downgrade so the survival check below passes.
            FilterMode::Require => modes[tier - 1] = FilterMode::Show,
            FilterMode::Show => {}
        }
    }

    for &idx in hidden.iter().rev() {
        row.operators.remove(idx);
    }
    row.shown_operators = row.operators.clone();

    !row.operators.is_empty() && !modes.contains(&FilterMode::Require)
}

/// Apply the configured per-tier filters and sort the survivors.
///
/// Sort order: minimum rarity descending, then operator count ascending —
/// rarer and more specific combinations first.
pub fn apply_rarity_filters(rows: Vec<ResultRow>, filters: &[RarityFilter]) -> Vec<ResultRow> {
    let mut kept: Vec<ResultRow> = rows
        .into_iter()
        .filter_map(|mut row| filter_row(&mut row, filters).then_some(row))
        .collect();
    kept.sort_by(|a, b| {
        b.min_rarity()
            .cmp(&a.min_rarity())
            .then(a.operators.len().cmp(&b.operators.len()))
    });
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Operator;
    use crate::tags::{Tag, TagCategory};

    fn op(id: &str, rarity: u8) -> Operator {
        Operator {
            id: id.into(),
            name: id.into(),
            rarity,
            position: "Melee".into(),
            class_code: "WARRIOR".into(),
            tag_list: Vec::new(),
        }
    }

    fn row(tag_names: &[&str], ops: Vec<Operator>) -> ResultRow {
        let tags = tag_names
            .iter()
            .map(|n| Tag::new(*n, TagCategory::Affix))
            .collect();
        ResultRow::new(tags, ops)
    }

    fn filters_with(stars: u8, mode: FilterMode) -> Vec<RarityFilter> {
        let mut filters = default_filters(6);
        filters[stars as usize - 1].mode = mode;
        filters
    }

    #[test]
    fn exclude_drops_the_whole_row() {
        let rows = vec![row(&["DPS"], vec![op("a", 3), op("b", 4)])];
        let out = apply_rarity_filters(rows, &filters_with(4, FilterMode::Exclude));
        assert!(out.is_empty());
    }

    #[test]
    fn hide_removes_operators_but_keeps_the_row() {
        let rows = vec![row(&["DPS"], vec![op("a", 3), op("b", 4)])];
        let out = apply_rarity_filters(rows, &filters_with(3, FilterMode::Hide));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].operators.len(), 1);
        assert_eq!(out[0].shown_operators.len(), 1);
        assert_eq!(out[0].operators[0].id, "b");
    }

    #[test]
    fn hide_that_empties_the_row_drops_it() {
        let rows = vec![row(&["DPS"], vec![op("a", 3)])];
        let out = apply_rarity_filters(rows, &filters_with(3, FilterMode::Hide));
        assert!(out.is_empty());
    }

    #[test]
    fn unsatisfied_require_drops_the_row() {
        let rows = vec![row(&["DPS"], vec![op("a", 3)])];
        let out = apply_rarity_filters(rows, &filters_with(5, FilterMode::Require));
        assert!(out.is_empty());
    }

    #[test]
    fn satisfied_require_keeps_the_row() {
        let rows = vec![row(&["DPS"], vec![op("a", 3), op("b", 5)])];
        let out = apply_rarity_filters(rows, &filters_with(5, FilterMode::Require));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].operators.len(), 2);
    }

    #[test]
    fn robot_tag_overrides_tier_one_exclude() {
        let mut r = row(&[], vec![op("lancet", 1)]);
        r.tags = vec![Tag::new(ROBOT_TAG, TagCategory::Rarity)];
        let out = apply_rarity_filters(vec![r], &filters_with(1, FilterMode::Exclude));
        assert_eq!(out.len(), 1, "explicit Robot tag must not be excluded");
    }

    #[test]
    fn auto_selected_robot_does_not_override() {
        let mut r = row(&[], vec![op("lancet", 1)]);
        let mut tag = Tag::new(ROBOT_TAG, TagCategory::Rarity);
        tag.is_auto_selected = true;
        r.tags = vec![tag];
        let out = apply_rarity_filters(vec![r], &filters_with(1, FilterMode::Exclude));
        assert!(out.is_empty(), "auto-selected Robot keeps the exclusion");
    }

    #[test]
    fn starter_tag_overrides_tier_two_hide() {
        let mut r = row(&[], vec![op("yato", 2)]);
        r.tags = vec![Tag::new(STARTER_TAG, TagCategory::Rarity)];
        let out = apply_rarity_filters(vec![r], &filters_with(2, FilterMode::Hide));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].operators.len(), 1);
    }

    #[test]
    fn tiers_beyond_configuration_always_show() {
        let rows = vec![row(&["DPS"], vec![op("a", 6)])];
        // Only tiers 1..=3 configured; 6★ passes untouched.
        let out = apply_rarity_filters(rows, &default_filters(3));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn sort_is_rarity_desc_then_count_asc() {
        let rows = vec![
            row(&["a"], vec![op("x", 3), op("y", 3)]),
            row(&["b"], vec![op("z", 5)]),
            row(&["c"], vec![op("w", 3)]),
        ];
        let out = apply_rarity_filters(rows, &default_filters(6));
        let min_rarities: Vec<u8> = out.iter().map(|r| r.min_rarity()).collect();
        assert_eq!(min_rarities, vec![5, 3, 3]);
        assert_eq!(out[1].operators.len(), 1);
        assert_eq!(out[2].operators.len(), 2);
    }
}
