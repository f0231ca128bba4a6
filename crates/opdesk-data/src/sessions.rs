//! Interactive sessions driving the two engines.
//!
//! A session owns the mutable state one screen of the app works against
//! and performs the explicit recomputes the engines expect: every
//! selection change recomputes result rows, every filter change re-sorts,
//! every roster reload invalidates the match cache first.

use opdesk_logic::constants::{GameConstants, Progression};
use opdesk_logic::operators::Operator;
use opdesk_logic::planner::{
    build_days, simulate_forward, total_completions, validate_plan, PlanError, PlanSetup,
    PlannerDay,
};
use opdesk_logic::rarity::{apply_rarity_filters, RarityFilter};
use opdesk_logic::recruit::{compute_result_rows, MatchCache, MatchError, ResultRow};
use opdesk_logic::stages::{Stage, StageTable};
use opdesk_logic::tags::{resolve_recognized, update_availability, Tag};

/// Recruitment screen state: tag selection, roster, filters, cache.
pub struct RecruitSession {
    tags: Vec<Tag>,
    roster: Vec<Operator>,
    filters: Vec<RarityFilter>,
    cache: MatchCache,
    rows: Vec<ResultRow>,
    visible: Vec<ResultRow>,
}

impl RecruitSession {
    pub fn new(
        tags: Vec<Tag>,
        roster: Vec<Operator>,
        filters: Vec<RarityFilter>,
    ) -> Result<Self, MatchError> {
        let mut session = Self {
            tags,
            roster,
            filters,
            cache: MatchCache::new(),
            rows: Vec::new(),
            visible: Vec::new(),
        };
        update_availability(&mut session.tags);
        session.recompute()?;
        Ok(session)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn selected_tags(&self) -> Vec<&Tag> {
        self.tags.iter().filter(|t| t.is_selected).collect()
    }

    /// Matching rows before rarity filtering.
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Filtered and sorted rows, as shown to the user.
    pub fn visible_rows(&self) -> &[ResultRow] {
        &self.visible
    }

    /// Select a tag by name. Returns false when the tag is unknown,
    /// unavailable, or already selected.
    pub fn select_tag(&mut self, name: &str) -> Result<bool, MatchError> {
        let Some(tag) = self.tags.iter_mut().find(|t| t.name == name) else {
            return Ok(false);
        };
        if tag.is_selected || !tag.is_available {
            return Ok(false);
        }
        tag.is_selected = true;
        update_availability(&mut self.tags);
        self.recompute()?;
        Ok(true)
    }

    /// Deselect a tag by name. Returns false when nothing changed.
    pub fn deselect_tag(&mut self, name: &str) -> Result<bool, MatchError> {
        let Some(tag) = self
            .tags
            .iter_mut()
            .find(|t| t.name == name && t.is_selected)
        else {
            return Ok(false);
        };
        tag.is_selected = false;
        tag.is_auto_selected = false;
        update_availability(&mut self.tags);
        self.recompute()?;
        Ok(true)
    }

    pub fn clear_selection(&mut self) -> Result<(), MatchError> {
        for tag in &mut self.tags {
            tag.is_selected = false;
            tag.is_auto_selected = false;
        }
        update_availability(&mut self.tags);
        self.recompute()
    }

    /// Replace the selection with tags recognized from OCR text lines.
    ///
    /// Unknown lines are dropped; resolved tags are marked auto-selected
    /// so the Robot/Starter filter overrides ignore them.
    pub fn apply_recognized(&mut self, lines: &[String]) -> Result<usize, MatchError> {
        let names: Vec<String> = resolve_recognized(lines, &self.tags)
            .into_iter()
            .map(|t| t.name.clone())
            .collect();
        for tag in &mut self.tags {
            tag.is_selected = false;
            tag.is_auto_selected = false;
        }
        let mut applied = 0;
        for name in &names {
            if applied >= opdesk_logic::tags::MAX_SELECTED_TAGS {
                break;
            }
            if let Some(tag) = self.tags.iter_mut().find(|t| &t.name == name) {
                tag.is_selected = true;
                tag.is_auto_selected = true;
                applied += 1;
            }
        }
        update_availability(&mut self.tags);
        self.recompute()?;
        log::info!("applied {} recognized tags", applied);
        Ok(applied)
    }

    /// Swap in new rarity filters; match results are reused as-is.
    pub fn set_filters(&mut self, filters: Vec<RarityFilter>) {
        self.filters = filters;
        self.visible = apply_rarity_filters(self.rows.clone(), &self.filters);
    }

    /// Replace the roster after a game-data reload.
    ///
    /// The match cache must not outlive the data it was computed from, so
    /// it is invalidated before anything recomputes.
    pub fn reload_roster(&mut self, roster: Vec<Operator>) -> Result<(), MatchError> {
        log::info!(
            "roster reload: {} -> {} operators, dropping {} cached combinations",
            self.roster.len(),
            roster.len(),
            self.cache.len()
        );
        self.roster = roster;
        self.cache.invalidate();
        self.recompute()
    }

    fn recompute(&mut self) -> Result<(), MatchError> {
        let selected: Vec<Tag> = self
            .tags
            .iter()
            .filter(|t| t.is_selected)
            .cloned()
            .collect();
        self.rows = compute_result_rows(&selected, &self.roster, &mut self.cache)?;
        self.visible = apply_rarity_filters(self.rows.clone(), &self.filters);
        log::debug!(
            "recomputed {} rows ({} visible) for {} selected tags",
            self.rows.len(),
            self.visible.len(),
            selected.len()
        );
        Ok(())
    }
}

/// Planner screen state: setup, resolved stage, and the simulated days.
pub struct PlannerSession {
    setup: PlanSetup,
    constants: GameConstants,
    stage: Stage,
    days: Vec<PlannerDay>,
}

impl PlannerSession {
    pub fn new(
        setup: PlanSetup,
        stages: &StageTable,
        constants: GameConstants,
    ) -> Result<Self, PlanError> {
        let stage = validate_plan(&setup, stages, &constants)?;
        let mut session = Self {
            setup,
            constants,
            stage,
            days: Vec::new(),
        };
        session.rebuild();
        Ok(session)
    }

    pub fn setup(&self) -> &PlanSetup {
        &self.setup
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn days(&self) -> &[PlannerDay] {
        &self.days
    }

    pub fn total_completions(&self) -> u32 {
        total_completions(&self.days)
    }

    /// Re-run the fold from `index` onward; earlier days stay untouched.
    pub fn resimulate_from(&mut self, index: usize) {
        simulate_forward(&mut self.days, index, &self.setup, &self.constants, &self.stage);
    }

    /// Correct the starting sanity (e.g. after an OCR reading of the
    /// in-game bar) and recompute the whole forecast.
    pub fn set_initial_sanity(&mut self, sanity: i64) {
        self.setup.initial_sanity = sanity;
        self.resimulate_from(0);
    }

    /// Correct the starting progression and recompute.
    pub fn set_initial_progression(&mut self, progression: Progression) {
        self.setup.initial = progression;
        self.resimulate_from(0);
    }

    /// Replace the whole setup (dates or target stage may have changed),
    /// revalidating against the current tables.
    pub fn set_setup(&mut self, setup: PlanSetup, stages: &StageTable) -> Result<(), PlanError> {
        self.stage = validate_plan(&setup, stages, &self.constants)?;
        self.setup = setup;
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.days = build_days(&self.setup, &self.stage);
        self.resimulate_from(0);
        log::info!(
            "planned {} days of {}: {} completions",
            self.days.len(),
            self.stage.code,
            self.total_completions()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use opdesk_logic::rarity::default_filters;
    use opdesk_logic::tags::TagCategory;

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
            op("melantha", 3, "Melee", "WARRIOR", &["DPS", "Survival"]),
            op("jessica", 3, "Ranged", "SNIPER", &["DPS"]),
            op("projekt_red", 5, "Melee", "SPECIAL", &["DPS", "Fast-Redeploy"]),
        ]
    }

    fn tag_list() -> Vec<Tag> {
        vec![
            Tag::new("Melee", TagCategory::Position),
            Tag::new("Ranged", TagCategory::Position),
            Tag::new("DPS", TagCategory::Affix),
            Tag::new("Survival", TagCategory::Affix),
            Tag::new("Senior Operator", TagCategory::Rarity),
            Tag::new("Fast Redeploy", TagCategory::Affix),
        ]
    }

    fn recruit_session() -> RecruitSession {
        RecruitSession::new(tag_list(), roster(), default_filters(6)).unwrap()
    }

    #[test]
    fn selection_drives_row_recompute() {
        let mut s = recruit_session();
        assert!(s.rows().is_empty());

        assert!(s.select_tag("DPS").unwrap());
        assert_eq!(s.rows().len(), 1);

        assert!(s.select_tag("Melee").unwrap());
        // {DPS}, {Melee}, {DPS, Melee}
        assert_eq!(s.rows().len(), 3);

        assert!(s.deselect_tag("Melee").unwrap());
        assert_eq!(s.rows().len(), 1);

        assert!(!s.select_tag("DPS").unwrap(), "double-select is a no-op");
        assert!(!s.select_tag("Nuker").unwrap(), "unknown tag is a no-op");
    }

    #[test]
    fn sixth_tag_is_unavailable() {
        let mut s = recruit_session();
        for name in ["Melee", "Ranged", "DPS", "Survival", "Senior Operator"] {
            assert!(s.select_tag(name).unwrap());
        }
        assert!(
            !s.select_tag("Fast Redeploy").unwrap(),
            "selection is full at five tags"
        );
        assert!(s.deselect_tag("Melee").unwrap());
        assert!(s.select_tag("Fast Redeploy").unwrap());
    }

    #[test]
    fn recognized_text_replaces_selection_as_auto() {
        let mut s = recruit_session();
        s.select_tag("Survival").unwrap();

        let lines = vec![" DPS ".into(), "Melee".into(), "Smudge".into()];
        let applied = s.apply_recognized(&lines).unwrap();
        assert_eq!(applied, 2);
        let selected = s.selected_tags();
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|t| t.is_auto_selected));
        assert!(!selected.iter().any(|t| t.name == "Survival"));
    }

    #[test]
    fn roster_reload_invalidates_stale_results() {
        let mut s = recruit_session();
        s.select_tag("DPS").unwrap();
        assert_eq!(s.rows()[0].operators.len(), 3);

        // Without invalidation the cached row would survive the reload.
        s.reload_roster(vec![op("jessica", 3, "Ranged", "SNIPER", &["DPS"])])
            .unwrap();
        assert_eq!(s.rows()[0].operators.len(), 1);
    }

    fn planner_fixture() -> (PlanSetup, StageTable, GameConstants) {
        // 2026-08-03 is a Monday.
        let start = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let setup = PlanSetup {
            start_date: start,
            target_date: start + chrono::Duration::days(7),
            target_stage: "CE-5".into(),
            initial: Progression { level: 1, exp: 0 },
            initial_sanity: 0,
            daily_regen: 240,
            monthly_card: false,
            weekly_missions: false,
            annihilation: None,
        };
        let stages = StageTable::new(vec![opdesk_logic::stages::Stage {
            code: "CE-5".into(),
            sanity_cost: 30,
            exp_reward: 120,
            two_star_exp_reward: 100,
            lmd_reward: 7500,
            two_star_lmd_reward: 6000,
            open_weekdays: [true; 7],
        }]);
        let constants = GameConstants {
            max_level: 10,
            exp_per_level: vec![100_000; 10],
            sanity_cap_per_level: vec![82, 84, 86, 88, 90, 92, 94, 96, 98, 100],
        };
        (setup, stages, constants)
    }

    #[test]
    fn planner_session_simulates_on_construction() {
        let (setup, stages, constants) = planner_fixture();
        let session = PlannerSession::new(setup, &stages, constants).unwrap();
        assert_eq!(session.days().len(), 7);
        assert_eq!(session.total_completions(), 7 * 8);
    }

    #[test]
    fn unknown_target_stage_fails_construction() {
        let (mut setup, stages, constants) = planner_fixture();
        setup.target_stage = "AP-5".into();
        assert!(matches!(
            PlannerSession::new(setup, &stages, constants),
            Err(PlanError::UnknownStage(_))
        ));
    }

    #[test]
    fn sanity_correction_reruns_the_forecast() {
        let (setup, stages, constants) = planner_fixture();
        let mut session = PlannerSession::new(setup, &stages, constants).unwrap();
        let before = session.total_completions();
        session.set_initial_sanity(90);
        assert_eq!(session.total_completions(), before + 3);
    }
}
