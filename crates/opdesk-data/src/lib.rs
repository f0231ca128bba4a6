//! Game-data tables, recompute sessions, and persistence for opdesk.
//!
//! Everything here sits between the pure engines in `opdesk-logic` and the
//! excluded collaborators (remote JSON fetching, OCR, the UI shell):
//! parsing the already-fetched tables, owning the recompute flow around
//! user interaction, and persisting preferences and planner snapshots.

pub mod persistence;
pub mod sessions;
pub mod source;
pub mod tables;
