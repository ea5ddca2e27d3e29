// ── Offline queue and sync modes ──
//
// Stock mutations made while offline in field context are applied
// optimistically and mirrored here until the engine settles the batch on
// reconnect. There is no remote reconciliation: a shared backend would
// need a conflict policy (last-write-wins, per-field merge) on top.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::model::{EntityId, PendingMutation};

/// Connectivity as toggled by the operator. Not derived from real signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Connectivity {
    #[default]
    Online,
    Offline,
}

impl Connectivity {
    pub fn from_online(online: bool) -> Self {
        if online { Self::Online } else { Self::Offline }
    }

    pub fn is_online(self) -> bool {
        self == Self::Online
    }
}

/// Who is operating the engine.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OperatingContext {
    /// Frontline data entry; the consumption simulator is paused.
    Field,
    /// Aggregate monitoring; the consumption simulator runs.
    #[default]
    Oversight,
}

/// Whether a stock mutation in this mode must be mirrored into the queue.
pub fn captures_offline(connectivity: Connectivity, context: OperatingContext) -> bool {
    connectivity == Connectivity::Offline && context == OperatingContext::Field
}

/// FIFO of pending stock mutations. No reordering, dedup, or coalescing.
#[derive(Debug, Default)]
pub struct OfflineQueue {
    pending: VecDeque<PendingMutation>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation with the current capture time. Returns the new
    /// queue length.
    pub fn capture(
        &mut self,
        facility_id: &EntityId,
        department_id: &EntityId,
        item_id: &EntityId,
        delta: i64,
    ) -> usize {
        self.pending.push_back(PendingMutation {
            id: EntityId::generate(),
            facility_id: facility_id.clone(),
            department_id: department_id.clone(),
            item_id: item_id.clone(),
            delta,
            timestamp: Utc::now(),
        });
        self.pending.len()
    }

    /// Remove and return every pending mutation in arrival order.
    pub fn drain(&mut self) -> Vec<PendingMutation> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingMutation> {
        self.pending.iter()
    }
}
