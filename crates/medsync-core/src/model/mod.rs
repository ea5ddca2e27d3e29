// ── Domain model ──
//
// Canonical, immutable representation of the facility network. Every
// write goes through `store::transition`, which returns a new tree.

pub mod activity;
pub mod entity_id;
pub mod facility;
pub mod history;
pub mod supply;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use medsync_core::model::*` gives you everything.

pub use activity::{LogEntry, PendingMutation, Severity};
pub use entity_id::EntityId;
pub use facility::{CensusRecord, Coordinates, Department, Facility, Network, StockLocation};
pub use history::{HISTORY_CAPACITY, History, HistoryError, HistoryKind, HistoryPoint};
pub use supply::{
    Item, ItemCategory, RunwayThresholds, StockStatus, clamp_add, runway_days,
};
