// ── Command API ──
//
// Every engine write can be expressed as a `Command`, so scripted
// scenarios and front ends drive the engine through one entry point:
// `Engine::execute`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::EntityId;
use crate::store::CensusChange;
use crate::sync::OperatingContext;

/// All write operations accepted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // ── Stock ────────────────────────────────────────────────────────
    RecordStock {
        facility_id: EntityId,
        department_id: EntityId,
        item_id: EntityId,
        delta: i64,
    },

    // ── Staffing ─────────────────────────────────────────────────────
    UpdateSpecialists {
        facility_id: EntityId,
        department_id: EntityId,
        delta: i64,
    },

    // ── Census ───────────────────────────────────────────────────────
    /// Record today's count (UTC) and log it.
    RecordCensus {
        facility_id: EntityId,
        count: u32,
    },
    UpsertCensus {
        facility_id: EntityId,
        date: NaiveDate,
        count: u32,
    },

    // ── Modes ────────────────────────────────────────────────────────
    SetConnectivity {
        online: bool,
    },
    SetContext {
        context: OperatingContext,
    },
}

/// Result of a command execution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    Ok,
    Quantity { quantity: u32 },
    SpecialistCount { count: u32 },
    Census(CensusChange),
    /// An id did not resolve; nothing changed.
    Unresolved,
}

impl CommandResult {
    pub fn is_unresolved(self) -> bool {
        self == Self::Unresolved
    }
}
