// medsync-core: Inventory state synchronization engine for medical-supply networks.

pub mod activity;
pub mod analysis;
pub mod census;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod seed;
pub mod simulator;
pub mod store;
pub mod stream;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use activity::{ActivityLog, SYSTEM_FACILITY};
pub use analysis::{ANALYSIS_FALLBACK, Analyst, NetworkBrief};
pub use census::{CensusTotal, census_on, network_category_history, network_census, network_census_series};
pub use command::{Command, CommandResult};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{AnalysisError, CoreError};
pub use seed::{NetworkSeed, network_from_json};
pub use simulator::{ConsumptionSimulator, Depletion};
pub use store::{CensusChange, DataStore};
pub use stream::{NetworkStream, StockFilter};
pub use sync::{Connectivity, OperatingContext};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Tree
    CensusRecord, Coordinates, Department, Facility, Item, Network, StockLocation,
    // Supplies
    ItemCategory, RunwayThresholds, StockStatus,
    // History
    History, HistoryKind, HistoryPoint,
    // Log / queue
    LogEntry, PendingMutation, Severity,
    // Identity
    EntityId,
};
