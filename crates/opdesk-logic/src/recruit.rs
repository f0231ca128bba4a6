//! Tag-combination matching engine.
//!
//! For every non-empty subset of the selected tags, the engine computes the
//! set of operators matching *all* tags in the subset. Per-combination
//! results are memoized in a [`MatchCache`] owned by the caller; the cache
//! must be invalidated when the roster reloads, otherwise stale results
//! survive the reload.

use std::collections::HashMap;
use std::fmt;

use crate::combinatorics::non_empty_subsets;
use crate::operators::{
    class_code_for, rarity_tag_name, Operator, MAX_RARITY, ROBOT_TAG, SENIOR_OPERATOR_TAG,
    STARTER_TAG, TOP_OPERATOR_TAG,
};
use crate::tags::{Tag, TagCategory};

/// Fatal tag-dataset mismatch.
///
/// Raised immediately: an unknown mapping means the tag table and the
/// matcher disagree about the game version, and silently skipping would
/// corrupt every result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// A rarity-category tag with no known matching rule.
    UnknownRarityTag(String),
    /// A class-category tag with no profession → class-code mapping.
    UnknownClassTag(String),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::UnknownRarityTag(name) => {
                write!(f, "rarity tag {:?} has no matching rule", name)
            }
            MatchError::UnknownClassTag(name) => {
                write!(f, "class tag {:?} has no class-code mapping", name)
            }
        }
    }
}

impl std::error::Error for MatchError {}

/// One row of the recruitment result table: a tag combination and the
/// operators it guarantees.
#[derive(Debug, Clone)]
pub struct ResultRow {
    /// The tested combination, in selection order.
    pub tags: Vec<Tag>,
    /// Every operator matching all tags, before per-rarity hide/show.
    pub operators: Vec<Operator>,
    /// Operators left visible after rarity filtering; starts as a copy.
    pub shown_operators: Vec<Operator>,
}

impl ResultRow {
    pub fn new(tags: Vec<Tag>, operators: Vec<Operator>) -> Self {
        let shown_operators = operators.clone();
        Self {
            tags,
            operators,
            shown_operators,
        }
    }

    /// Lowest rarity among the row's operators, or 0 for an empty row.
    pub fn min_rarity(&self) -> u8 {
        self.operators.iter().map(|op| op.rarity).min().unwrap_or(0)
    }
}

/// Memoized per-combination match results.
///
/// Keyed structurally by the combination's tag names sorted by display
/// name (case-sensitive), so "Melee + DPS" and "DPS + Melee" share an
/// entry. Values hold the operator set *before* rarity filtering is
/// applied. Unbounded between invalidations; [`MatchCache::invalidate`]
/// must run on every roster reload. Not synchronized — the cache belongs
/// to the single thread driving the recruitment screen.
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: HashMap<Vec<String>, Vec<Operator>>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every memoized combination (call on data reload).
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(tags: &[&Tag]) -> Vec<String> {
        let mut key: Vec<String> = tags.iter().map(|t| t.name.clone()).collect();
        key.sort();
        key
    }
}

/// Does `op` satisfy a single tag?
fn tag_matches(tag: &Tag, op: &Operator) -> Result<bool, MatchError> {
    match tag.category {
        TagCategory::Rarity => {
            if tag.name == ROBOT_TAG || tag.name == STARTER_TAG {
                return Ok(op.has_raw_tag(&tag.name));
            }
            if !tag.name.eq_ignore_ascii_case(SENIOR_OPERATOR_TAG)
                && !tag.name.eq_ignore_ascii_case(TOP_OPERATOR_TAG)
            {
                return Err(MatchError::UnknownRarityTag(tag.name.clone()));
            }
            Ok(rarity_tag_name(op.rarity)
                .map(|name| name.eq_ignore_ascii_case(&tag.name))
                .unwrap_or(false))
        }
        TagCategory::Position => Ok(op.position.eq_ignore_ascii_case(&tag.name)),
        TagCategory::Class => {
            let code = class_code_for(&tag.name)
                .ok_or_else(|| MatchError::UnknownClassTag(tag.name.clone()))?;
            Ok(code.eq_ignore_ascii_case(&op.class_code))
        }
        TagCategory::Affix => Ok(op.tag_list.iter().any(|raw| *raw == tag.id())),
    }
}

/// Operators matching every tag in `combination`.
///
/// A top-rarity operator only matches when "Top Operator" is explicitly
/// part of the tested combination — top-tier operators are never in the
/// regular pool unless filtered for.
pub fn match_combination(
    combination: &[&Tag],
    roster: &[Operator],
) -> Result<Vec<Operator>, MatchError> {
    let wants_top = combination.iter().any(|t| t.name == TOP_OPERATOR_TAG);
    let mut matched = Vec::new();
    for op in roster {
        if op.rarity == MAX_RARITY && !wants_top {
            continue;
        }
        let mut all = true;
        for tag in combination {
            if !tag_matches(tag, op)? {
                all = false;
                break;
            }
        }
        if all {
            matched.push(op.clone());
        }
    }
    Ok(matched)
}

/// Compute one result row per non-empty subset of `selected` that matches
/// at least one operator.
///
/// Results are served from `cache` when the combination was seen before;
/// misses compute and populate it. Row order follows subset enumeration
/// order — the rarity filter applies the user-facing sort afterwards.
pub fn compute_result_rows(
    selected: &[Tag],
    roster: &[Operator],
    cache: &mut MatchCache,
) -> Result<Vec<ResultRow>, MatchError> {
    let mut rows = Vec::new();
    for subset in non_empty_subsets(selected) {
        let key = MatchCache::key(&subset);
        let operators = match cache.entries.get(&key) {
            Some(ops) => ops.clone(),
            None => {
                let ops = match_combination(&subset, roster)?;
                cache.entries.insert(key, ops.clone());
                ops
            }
        };
        if operators.is_empty() {
            continue;
        }
        let tags = subset.into_iter().cloned().collect();
        rows.push(ResultRow::new(tags, operators));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(id: &str, rarity: u8, position: &str, class_code: &str, raw: &[&str]) -> Operator {
        Operator {
            id: id.into(),
            name: id.into(),
            rarity,
            position: position.into(),
            class_code: class_code.into(),
            tag_list: raw.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn roster() -> Vec<Operator> {
        vec![
            op("lancet", 1, "Melee", "MEDIC", &["Robot", "Healing"]),
            op("yato", 2, "Melee", "PIONEER", &["Starter", "DPS"]),
            op("melantha", 3, "Melee", "WARRIOR", &["DPS", "Survival"]),
            op("jessica", 3, "Ranged", "SNIPER", &["DPS"]),
            op("projekt_red", 5, "Melee", "SPECIAL", &["DPS", "Fast-Redeploy"]),
            op("exusiai", 6, "Ranged", "SNIPER", &["DPS"]),
        ]
    }

    fn tag(name: &str, category: TagCategory) -> Tag {
        Tag::new(name, category)
    }

    #[test]
    fn position_matches_case_insensitively() {
        let t = tag("melee", TagCategory::Position);
        let ops = match_combination(&[&t], &roster()).unwrap();
        let ids: Vec<&str> = ops.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["lancet", "yato", "melantha", "projekt_red"]);
    }

    #[test]
    fn class_maps_through_code_table() {
        let t = tag("Sniper", TagCategory::Class);
        let ops = match_combination(&[&t], &roster()).unwrap();
        // exusiai is 6★ and gated out without the Top Operator tag.
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].id, "jessica");
    }

    #[test]
    fn affix_matches_normalized_id() {
        let t = tag("Fast Redeploy", TagCategory::Affix);
        let ops = match_combination(&[&t], &roster()).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].id, "projekt_red");
    }

    #[test]
    fn robot_and_starter_match_raw_tags() {
        let robot = tag("Robot", TagCategory::Rarity);
        let ops = match_combination(&[&robot], &roster()).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].id, "lancet");

        let starter = tag("Starter", TagCategory::Rarity);
        let ops = match_combination(&[&starter], &roster()).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].id, "yato");
    }

    #[test]
    fn senior_operator_matches_tier_five_only() {
        let t = tag("Senior Operator", TagCategory::Rarity);
        let ops = match_combination(&[&t], &roster()).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].id, "projekt_red");
    }

    #[test]
    fn top_tier_requires_explicit_top_operator_tag() {
        let dps = tag("DPS", TagCategory::Affix);
        let ops = match_combination(&[&dps], &roster()).unwrap();
        assert!(
            ops.iter().all(|o| o.rarity < MAX_RARITY),
            "6★ leaked into a row without the Top Operator tag"
        );

        let top = tag("Top Operator", TagCategory::Rarity);
        let ops = match_combination(&[&top, &dps], &roster()).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].id, "exusiai");
    }

    #[test]
    fn unknown_rarity_tag_is_fatal() {
        let t = tag("Mythic Operator", TagCategory::Rarity);
        let err = match_combination(&[&t], &roster()).unwrap_err();
        assert_eq!(err, MatchError::UnknownRarityTag("Mythic Operator".into()));
    }

    #[test]
    fn unknown_class_tag_is_fatal() {
        let t = tag("Summoner", TagCategory::Class);
        let err = match_combination(&[&t], &roster()).unwrap_err();
        assert_eq!(err, MatchError::UnknownClassTag("Summoner".into()));
    }

    #[test]
    fn rows_cover_every_matching_subset() {
        let selected = vec![
            tag("Melee", TagCategory::Position),
            tag("DPS", TagCategory::Affix),
        ];
        let mut cache = MatchCache::new();
        let rows = compute_result_rows(&selected, &roster(), &mut cache).unwrap();
        // {Melee}, {DPS}, {Melee, DPS} all match someone.
        assert_eq!(rows.len(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn empty_result_subsets_are_dropped_but_cached() {
        let selected = vec![
            tag("Robot", TagCategory::Rarity),
            tag("Senior Operator", TagCategory::Rarity),
        ];
        let mut cache = MatchCache::new();
        let rows = compute_result_rows(&selected, &roster(), &mut cache).unwrap();
        // Robot ∩ Senior Operator is empty; the two singletons survive.
        assert_eq!(rows.len(), 2);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn cache_key_ignores_selection_order() {
        let a = tag("Melee", TagCategory::Position);
        let b = tag("DPS", TagCategory::Affix);
        assert_eq!(MatchCache::key(&[&a, &b]), MatchCache::key(&[&b, &a]));
    }

    #[test]
    fn cache_serves_stale_results_until_invalidated() {
        let selected = vec![tag("DPS", TagCategory::Affix)];
        let mut cache = MatchCache::new();

        let full = roster();
        let rows = compute_result_rows(&selected, &full, &mut cache).unwrap();
        let before = rows[0].operators.len();

        // Same cache, smaller roster: the memoized row is returned as-is.
        let reduced = vec![full[2].clone()];
        let rows = compute_result_rows(&selected, &reduced, &mut cache).unwrap();
        assert_eq!(rows[0].operators.len(), before);

        cache.invalidate();
        let rows = compute_result_rows(&selected, &reduced, &mut cache).unwrap();
        assert_eq!(rows[0].operators.len(), 1);
    }
}
