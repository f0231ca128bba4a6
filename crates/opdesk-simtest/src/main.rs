//! opdesk Headless Validation Harness
//!
//! Exercises the recruitment matcher and the sanity planner against the
//! bundled fixture tables — no UI, no OCR, no networking.
//!
//! Usage:
//!   cargo run -p opdesk-simtest
//!   cargo run -p opdesk-simtest -- --verbose

use chrono::NaiveDate;

use opdesk_data::persistence::{load_plan, save_plan};
use opdesk_data::tables::{
    load_constants_table, load_operator_table, load_stage_table, load_tag_table,
};
use opdesk_logic::combinatorics::power_set;
use opdesk_logic::constants::{GameConstants, Progression};
use opdesk_logic::operators::{class_code_for, Operator, MAX_RARITY};
use opdesk_logic::planner::{
    build_days, simulate_forward, total_completions, AnnihilationPlan, PlanSetup,
};
use opdesk_logic::rarity::{apply_rarity_filters, default_filters, FilterMode};
use opdesk_logic::recruit::{compute_result_rows, match_combination, MatchCache};
use opdesk_logic::stages::StageTable;
use opdesk_logic::tags::{resolve_recognized, Tag};

// ── Fixture tables (same JSON shapes the desktop shell consumes) ────────
const TAGS_JSON: &str = include_str!("../../../data/recruit_tags.json");
const OPERATORS_JSON: &str = include_str!("../../../data/operators.json");
const STAGES_JSON: &str = include_str!("../../../data/stages.json");
const CONSTANTS_JSON: &str = include_str!("../../../data/game_constants.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed,
        detail: detail.into(),
    }
}

struct Fixtures {
    tags: Vec<Tag>,
    roster: Vec<Operator>,
    stages: StageTable,
    constants: GameConstants,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== opdesk Validation Harness ===\n");

    let mut results = Vec::new();

    // 1. Fixture table validation
    let fixtures = match load_fixtures(&mut results) {
        Some(f) => f,
        None => {
            report(&results, verbose);
            std::process::exit(1);
        }
    };

    // 2. Power-set generator sweep
    results.extend(validate_power_set(verbose));

    // 3. Recruitment matching
    results.extend(validate_recruitment(&fixtures, verbose));

    // 4. Rarity filters
    results.extend(validate_rarity_filters(&fixtures, verbose));

    // 5. Reward derivations
    results.extend(validate_rewards(&fixtures));

    // 6. Planner scenarios
    results.extend(validate_planner(&fixtures, verbose));

    // 7. Snapshot persistence
    results.extend(validate_persistence(&fixtures));

    report(&results, verbose);
}

fn report(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Fixture tables ───────────────────────────────────────────────────

fn load_fixtures(results: &mut Vec<TestResult>) -> Option<Fixtures> {
    println!("--- Fixture Tables ---");

    let tags = match load_tag_table(TAGS_JSON) {
        Ok(t) => t,
        Err(e) => {
            results.push(check("tags_parse", false, format!("{}", e)));
            return None;
        }
    };
    let roster = match load_operator_table(OPERATORS_JSON) {
        Ok(r) => r,
        Err(e) => {
            results.push(check("operators_parse", false, format!("{}", e)));
            return None;
        }
    };
    let stages = match load_stage_table(STAGES_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(check("stages_parse", false, format!("{}", e)));
            return None;
        }
    };
    let constants = match load_constants_table(CONSTANTS_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(check("constants_parse", false, format!("{}", e)));
            return None;
        }
    };

    results.push(check(
        "tags_loaded",
        tags.len() >= 20,
        format!("{} recruitment tags", tags.len()),
    ));
    results.push(check(
        "roster_loaded",
        roster.len() >= 10,
        format!("{} operators", roster.len()),
    ));

    let bad_rarity: Vec<_> = roster
        .iter()
        .filter(|o| o.rarity < 1 || o.rarity > MAX_RARITY)
        .collect();
    results.push(check(
        "roster_rarity_range",
        bad_rarity.is_empty(),
        format!("{} operators outside 1..=6 stars", bad_rarity.len()),
    ));

    // Every class code in the roster must be reachable from some
    // profession name, or class tags could never match it.
    let known_codes: Vec<&str> = [
        "Vanguard",
        "Guard",
        "Defender",
        "Sniper",
        "Caster",
        "Medic",
        "Supporter",
        "Specialist",
    ]
    .iter()
    .map(|name| class_code_for(name).unwrap())
    .collect();
    let unknown: Vec<&str> = roster
        .iter()
        .filter(|o| !known_codes.contains(&o.class_code.as_str()))
        .map(|o| o.name.as_str())
        .collect();
    results.push(check(
        "roster_class_codes",
        unknown.is_empty(),
        if unknown.is_empty() {
            "all class codes mapped".to_string()
        } else {
            format!("unmapped: {}", unknown.join(", "))
        },
    ));

    let bad_cost: Vec<_> = stages.stages().iter().filter(|s| s.sanity_cost <= 0).collect();
    results.push(check(
        "stage_costs_positive",
        bad_cost.is_empty(),
        format!("{} stages with non-positive cost", bad_cost.len()),
    ));

    results.push(check(
        "constants_cover_levels",
        constants.covers_levels(),
        format!("tables cover {} levels", constants.max_level),
    ));

    Some(Fixtures {
        tags,
        roster,
        stages,
        constants,
    })
}

// ── 2. Power set ────────────────────────────────────────────────────────

fn validate_power_set(_verbose: bool) -> Vec<TestResult> {
    println!("--- Power Set ---");
    let mut results = Vec::new();

    for n in 0..=5usize {
        let items: Vec<u32> = (0..n as u32).collect();
        let count = power_set(&items).count();
        results.push(check(
            &format!("powerset_card_n{}", n),
            count == 1 << n,
            format!("{} subsets", count),
        ));
    }

    // Order inside subsets follows the input.
    let items = [10u32, 20, 30, 40];
    let ordered = power_set(&items).all(|s| s.windows(2).all(|w| w[0] < w[1]));
    results.push(check(
        "powerset_inner_order",
        ordered,
        "subsets preserve input order",
    ));

    results
}

// ── 3. Recruitment matching ─────────────────────────────────────────────

fn fixture_tag<'a>(fixtures: &'a Fixtures, name: &str) -> &'a Tag {
    fixtures
        .tags
        .iter()
        .find(|t| t.name == name)
        .unwrap_or_else(|| panic!("fixture tag {:?} missing", name))
}

fn validate_recruitment(fixtures: &Fixtures, verbose: bool) -> Vec<TestResult> {
    println!("--- Recruitment Matching ---");
    let mut results = Vec::new();

    let singles = [
        ("Robot", 2usize),
        ("Starter", 2),
        ("Senior Operator", 2),
        ("Melee", 8),
        ("Sniper", 1),
        ("DPS", 6),
        ("Fast Redeploy", 1),
    ];
    for (name, expected) in singles {
        let ops = match_combination(&[fixture_tag(fixtures, name)], &fixtures.roster).unwrap();
        results.push(check(
            &format!("match_{}", name.replace(' ', "_").to_lowercase()),
            ops.len() == expected,
            format!("{} operators (expected {})", ops.len(), expected),
        ));
        if verbose {
            let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
            println!("    {:16} → {}", name, names.join(", "));
        }
    }

    // The 6★ gate: no combination without "Top Operator" may surface one.
    let dps = match_combination(&[fixture_tag(fixtures, "DPS")], &fixtures.roster).unwrap();
    results.push(check(
        "match_top_gate",
        dps.iter().all(|o| o.rarity < MAX_RARITY),
        "no 6★ without the Top Operator tag",
    ));
    let top_sniper =
        match_combination(
        &[fixture_tag(fixtures, "Top Operator"), fixture_tag(fixtures, "Sniper")],
        &fixtures.roster,
    ).unwrap();
    results.push(check(
        "match_top_sniper",
        top_sniper.len() == 1 && top_sniper[0].name == "Exusiai",
        format!("{} operators", top_sniper.len()),
    ));

    // Full row computation with caching.
    let mut cache = MatchCache::new();
    let selected = vec![
        fixture_tag(fixtures, "Melee").clone(),
        fixture_tag(fixtures, "DPS").clone(),
    ];
    let rows = compute_result_rows(&selected, &fixtures.roster, &mut cache).unwrap();
    results.push(check(
        "rows_two_tags",
        rows.len() == 3 && cache.len() == 3,
        format!("{} rows, {} cached combinations", rows.len(), cache.len()),
    ));

    // Recompute hits the cache instead of growing it.
    let rows2 = compute_result_rows(&selected, &fixtures.roster, &mut cache).unwrap();
    results.push(check(
        "rows_cached_recompute",
        rows2.len() == 3 && cache.len() == 3,
        "cache size stable on identical selection",
    ));

    // OCR text resolution.
    let lines = vec![
        "  Melee ".to_string(),
        "DPS".to_string(),
        "Smudged#Line".to_string(),
    ];
    let resolved = resolve_recognized(&lines, &fixtures.tags);
    results.push(check(
        "ocr_resolution",
        resolved.len() == 2,
        format!("{} of 3 lines resolved", resolved.len()),
    ));

    results
}

// ── 4. Rarity filters ───────────────────────────────────────────────────

fn validate_rarity_filters(fixtures: &Fixtures, _verbose: bool) -> Vec<TestResult> {
    println!("--- Rarity Filters ---");
    let mut results = Vec::new();

    let tag = |name: &str| -> Tag {
        fixtures
            .tags
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("fixture tag {:?} missing", name))
    };

    let rows_for = |names: &[&str]| {
        let selected: Vec<Tag> = names.iter().map(|n| tag(n)).collect();
        let mut cache = MatchCache::new();
        compute_result_rows(&selected, &fixtures.roster, &mut cache).unwrap()
    };

    // Exclude tier 1: the Melee row contains robots and is dropped whole.
    let mut filters = default_filters(6);
    filters[0].mode = FilterMode::Exclude;
    let out = apply_rarity_filters(rows_for(&["Melee"]), &filters);
    results.push(check(
        "filter_exclude_drops_row",
        out.is_empty(),
        format!("{} rows survive tier-1 exclude", out.len()),
    ));

    // Hide tier 1: robots vanish, the row stays.
    let mut filters = default_filters(6);
    filters[0].mode = FilterMode::Hide;
    let out = apply_rarity_filters(rows_for(&["Melee"]), &filters);
    let shown = out.first().map(|r| r.shown_operators.len()).unwrap_or(0);
    results.push(check(
        "filter_hide_removes_ops",
        out.len() == 1 && shown == 6,
        format!("{} shown of 8 matched", shown),
    ));

    // Require tier 5, unsatisfied: Starter row has only 2★ operators.
    let mut filters = default_filters(6);
    filters[4].mode = FilterMode::Require;
    let out = apply_rarity_filters(rows_for(&["Starter"]), &filters);
    results.push(check(
        "filter_require_unsatisfied",
        out.is_empty(),
        "2★-only row dropped under tier-5 require",
    ));

    // Require tier 5, satisfied via Projekt Red.
    let out = apply_rarity_filters(rows_for(&["Fast Redeploy"]), &filters);
    results.push(check(
        "filter_require_satisfied",
        out.len() == 1,
        "5★ row survives tier-5 require",
    ));

    // Hand-selected Robot tag overrides a tier-1 exclude.
    let mut filters = default_filters(6);
    filters[0].mode = FilterMode::Exclude;
    let out = apply_rarity_filters(rows_for(&["Robot"]), &filters);
    results.push(check(
        "filter_robot_override",
        out.len() == 1,
        "explicit Robot row survives tier-1 exclude",
    ));

    // Sort: min rarity descending, then operator count ascending.
    let out = apply_rarity_filters(rows_for(&["Melee", "DPS"]), &default_filters(6));
    let keys: Vec<(u8, usize)> = out
        .iter()
        .map(|r| (r.min_rarity(), r.operators.len()))
        .collect();
    let sorted = keys.windows(2).all(|w| {
        w[0].0 > w[1].0 || (w[0].0 == w[1].0 && w[0].1 <= w[1].1)
    });
    results.push(check(
        "filter_sort_order",
        sorted,
        format!("(rarity, count) sequence {:?}", keys),
    ));

    results
}

// ── 5. Reward derivations ───────────────────────────────────────────────

fn validate_rewards(fixtures: &Fixtures) -> Vec<TestResult> {
    println!("--- Reward Derivations ---");
    let mut results = Vec::new();

    let ls5 = fixtures.stages.find("LS-5").expect("LS-5 fixture");
    results.push(check(
        "reward_full_clear_exp",
        ls5.full_clear_exp() == 144,
        format!("clear 120 → full {}", ls5.full_clear_exp()),
    ));
    results.push(check(
        "reward_two_star_exp",
        ls5.two_star_exp_reward == 100,
        format!("two-star {}", ls5.two_star_exp_reward),
    ));

    let ce5 = fixtures.stages.find("CE-5").expect("CE-5 fixture");
    results.push(check(
        "reward_full_clear_lmd",
        ce5.full_clear_lmd() == 9000,
        format!("clear 7500 → full {}", ce5.full_clear_lmd()),
    ));

    results
}

// ── 6. Planner ──────────────────────────────────────────────────────────

fn planner_setup(days: i64) -> PlanSetup {
    // 2026-08-03 is a Monday.
    let start = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    PlanSetup {
        start_date: start,
        target_date: start + chrono::Duration::days(days),
        target_stage: "LS-5".into(),
        initial: Progression { level: 25, exp: 0 },
        initial_sanity: 0,
        daily_regen: 240,
        monthly_card: false,
        weekly_missions: false,
        annihilation: None,
    }
}

fn validate_planner(fixtures: &Fixtures, verbose: bool) -> Vec<TestResult> {
    println!("--- Planner ---");
    let mut results = Vec::new();
    let stage = fixtures.stages.find("LS-5").expect("LS-5 fixture").clone();

    // Known value: 240 regen at 30 per run → exactly 8 clears, 0 left.
    let setup = planner_setup(1);
    let mut days = build_days(&setup, &stage);
    simulate_forward(&mut days, 0, &setup, &fixtures.constants, &stage);
    results.push(check(
        "planner_eight_runs",
        days[0].completions == 8 && days[0].ledger.value() == 0,
        format!(
            "{} completions, ledger value {}",
            days[0].completions,
            days[0].ledger.value()
        ),
    ));

    // Level-up feedback from level 1: the refill affords extra clears.
    let mut setup = planner_setup(1);
    setup.initial = Progression { level: 1, exp: 0 };
    let mut days = build_days(&setup, &stage);
    simulate_forward(&mut days, 0, &setup, &fixtures.constants, &stage);
    results.push(check(
        "planner_levelup_cascade",
        days[0].completions == 13 && days[0].finish.level == 3,
        format!(
            "{} completions, finish level {}",
            days[0].completions, days[0].finish.level
        ),
    ));

    // Two-week plan with every bonus source enabled: re-simulating from
    // day 3 must reproduce the full run exactly.
    let mut setup = planner_setup(14);
    setup.initial = Progression { level: 1, exp: 0 };
    setup.monthly_card = true;
    setup.weekly_missions = true;
    setup.annihilation = Some(AnnihilationPlan {
        per_run_cost: 25,
        weekly_quota: 125,
    });
    let mut full = build_days(&setup, &stage);
    simulate_forward(&mut full, 0, &setup, &fixtures.constants, &stage);
    let mut partial = full.clone();
    simulate_forward(&mut partial, 3, &setup, &fixtures.constants, &stage);
    results.push(check(
        "planner_idempotent_resim",
        partial == full,
        "re-simulation from day 3 matches full run",
    ));

    // Both Mondays reset the weekly annihilation quota.
    let sink_total: i64 = full
        .iter()
        .flat_map(|d| d.ledger.entries())
        .filter(|e| e.label == "annihilation")
        .map(|e| e.delta)
        .sum();
    results.push(check(
        "planner_weekly_quota",
        sink_total == -250,
        format!("annihilation total {} over two weeks", sink_total),
    ));

    // Day chaining: each start state equals the previous finish state.
    let chained = full.windows(2).all(|w| {
        w[1].start == w[0].finish && w[1].start_sanity == w[0].finish_sanity
    });
    results.push(check(
        "planner_day_chaining",
        chained,
        "start state equals previous finish state",
    ));

    if verbose {
        println!("  Two-week forecast ({} completions):", total_completions(&full));
        for day in &full {
            println!(
                "    {} {} Lv{:>2} {:>3} sanity → {:>2} runs",
                day.date,
                if day.stage_open { "open  " } else { "closed" },
                day.finish.level,
                day.start_sanity,
                day.completions
            );
        }
    }

    results
}

// ── 7. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(fixtures: &Fixtures) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let stage = fixtures.stages.find("LS-5").expect("LS-5 fixture").clone();
    let setup = planner_setup(7);
    let mut days = build_days(&setup, &stage);
    simulate_forward(&mut days, 0, &setup, &fixtures.constants, &stage);

    let mut buffer = Vec::new();
    let saved = save_plan(&mut buffer, &setup, &days);
    let loaded = saved.and_then(|_| load_plan(buffer.as_slice()));
    match loaded {
        Ok(snapshot) => results.push(check(
            "snapshot_round_trip",
            snapshot.days == days,
            format!("{} days round-tripped ({} bytes)", days.len(), buffer.len()),
        )),
        Err(e) => results.push(check("snapshot_round_trip", false, format!("{}", e))),
    }

    results
}
