// ── Filter predicates for stock listings ──
//
// Used by front ends to narrow a snapshot without walking it by hand.

use crate::model::{EntityId, ItemCategory, RunwayThresholds, StockLocation, StockStatus};

/// Filter predicate over stocked items.
pub enum StockFilter {
    ByFacility(EntityId),
    ByCategory(ItemCategory),
    ByStatus(StockStatus, RunwayThresholds),
    /// Critical or low under the given thresholds.
    NeedsAttention(RunwayThresholds),
}

impl StockFilter {
    pub fn matches(&self, location: &StockLocation<'_>) -> bool {
        match self {
            Self::ByFacility(id) => location.facility.id == *id,
            Self::ByCategory(category) => location.item.category == *category,
            Self::ByStatus(status, thresholds) => location.item.status(*thresholds) == *status,
            Self::NeedsAttention(thresholds) => {
                location.item.status(*thresholds) != StockStatus::Adequate
            }
        }
    }
}
