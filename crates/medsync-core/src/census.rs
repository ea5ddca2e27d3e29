// ── Cross-facility aggregation ──
//
// Read-only reductions over a network snapshot for reporting.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{HistoryPoint, ItemCategory, Network};

/// Network-wide patient total for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusTotal {
    pub date: NaiveDate,
    pub total: u64,
}

/// Sum every facility's census count per date.
///
/// Dates appear in first-seen order (facility order, then record order).
/// The result is not sorted; use [`network_census_series`] for a
/// chronological series.
pub fn network_census(network: &Network) -> IndexMap<NaiveDate, u64> {
    let mut totals: IndexMap<NaiveDate, u64> = IndexMap::new();
    for record in network.facilities.iter().flat_map(|f| f.census.iter()) {
        *totals.entry(record.date).or_default() += u64::from(record.count);
    }
    totals
}

/// Network-wide census sorted by date, oldest first.
pub fn network_census_series(network: &Network) -> Vec<CensusTotal> {
    let mut series: Vec<CensusTotal> = network_census(network)
        .into_iter()
        .map(|(date, total)| CensusTotal { date, total })
        .collect();
    series.sort_by_key(|t| t.date);
    series
}

/// Network-wide census for a single date. Facilities without a record for
/// that date contribute zero.
pub fn census_on(network: &Network, date: NaiveDate) -> u64 {
    network
        .facilities
        .iter()
        .filter_map(|f| f.census_on(date))
        .map(u64::from)
        .sum()
}

/// Sum the history of one supply category across the network, index by
/// index.
///
/// The first item of `category` in network order supplies the timestamps
/// and kinds. For each of its history positions, the value is the sum of
/// that position across the first item of `category` in every department
/// of every facility; shorter histories contribute nothing past their end.
/// Returns an empty series when no department stocks the category.
pub fn network_category_history(network: &Network, category: ItemCategory) -> Vec<HistoryPoint> {
    let stocked: Vec<_> = network
        .facilities
        .iter()
        .flat_map(|f| f.departments.iter())
        .filter_map(|d| d.inventory.iter().find(|i| i.category == category))
        .collect();

    let Some(template) = stocked.first() else {
        return Vec::new();
    };

    template
        .history
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let value = stocked
                .iter()
                .filter_map(|item| item.history.get(index))
                .fold(0_u32, |acc, p| acc.saturating_add(p.value));
            HistoryPoint { value, ..*point }
        })
        .collect()
}
