// ── Activity log and offline-queue records ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

/// One notable event, shown most-recent-first by consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: EntityId,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: Severity,
    pub facility_name: String,
}

/// A stock mutation captured while offline in field context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMutation {
    pub id: EntityId,
    pub facility_id: EntityId,
    pub department_id: EntityId,
    pub item_id: EntityId,
    pub delta: i64,
    pub timestamp: DateTime<Utc>,
}
