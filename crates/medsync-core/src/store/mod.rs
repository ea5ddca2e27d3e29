// ── Reactive state store ──
//
// Immutable network tree with path-copying writes and push-based change
// notification.

mod data_store;
pub mod transition;

pub use data_store::DataStore;
pub use transition::{CensusChange, Transition};
