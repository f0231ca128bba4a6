//! Pure recruitment-matching and sanity-planning logic for opdesk.
//!
//! This crate contains all companion-app logic that is independent of any
//! UI, OCR backend, or data-fetching runtime. Functions take plain data and
//! return results, making them unit-testable and portable across the
//! desktop shell, the headless simtest harness, and any future frontend.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`combinatorics`] | Bitmask power-set enumeration over ordered sequences |
//! | [`constants`] | Player progression tables (exp, sanity cap) and fixed bonuses |
//! | [`operators`] | Operator records, profession→class codes, rarity tag names |
//! | [`planner`] | Day-by-day sanity simulation with level-up feedback |
//! | [`rarity`] | Per-tier result filtering (show/hide/require/exclude) and sort |
//! | [`recruit`] | Tag-combination matching engine with an owned result cache |
//! | [`stages`] | Stage records, weekly schedules, clear-reward derivation |
//! | [`tags`] | Recruitment tag model and recognized-text resolution |

pub mod combinatorics;
pub mod constants;
pub mod operators;
pub mod planner;
pub mod rarity;
pub mod recruit;
pub mod stages;
pub mod tags;
