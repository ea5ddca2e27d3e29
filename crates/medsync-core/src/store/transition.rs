// ── Pure tree transitions ──
//
// Each operation takes the current root and returns the next one. Only
// the root-to-leaf path of the touched entity is rebuilt; every other
// subtree is shared with the input. When an id does not resolve, the
// input root is returned as-is and the outcome is `None`.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    CensusRecord, Department, EntityId, Facility, HistoryKind, HistoryPoint, Item, Network,
    clamp_add,
};

/// Result of applying one operation to a tree.
#[derive(Debug, Clone)]
pub struct Transition<T> {
    pub network: Arc<Network>,
    pub outcome: Option<T>,
}

impl<T> Transition<T> {
    fn unchanged(network: &Arc<Network>) -> Self {
        Self {
            network: Arc::clone(network),
            outcome: None,
        }
    }

    /// Whether the transition produced a new root.
    pub fn changed_from(&self, previous: &Arc<Network>) -> bool {
        !Arc::ptr_eq(&self.network, previous)
    }
}

/// What a census upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum CensusChange {
    Inserted,
    Replaced { previous: u32 },
    /// The same count was already recorded; the tree was not rebuilt.
    Unchanged,
}

/// `quantity = max(0, quantity + delta)` plus one history point.
pub fn apply_delta(
    network: &Arc<Network>,
    facility_id: &EntityId,
    department_id: &EntityId,
    item_id: &EntityId,
    delta: i64,
    now: DateTime<Utc>,
) -> Transition<u32> {
    edit_facility(network, facility_id, |facility| {
        edit_department(facility, department_id, |department| {
            edit_item(department, item_id, |item| {
                let quantity = clamp_add(item.quantity, delta);
                let mut next = item.clone();
                next.quantity = quantity;
                next.history.push(HistoryPoint {
                    timestamp: now,
                    value: quantity,
                    kind: HistoryKind::from_delta(delta),
                });
                Some((next, quantity))
            })
        })
    })
}

/// `specialist_count = max(0, specialist_count + delta)`. No history.
pub fn update_specialist_count(
    network: &Arc<Network>,
    facility_id: &EntityId,
    department_id: &EntityId,
    delta: i64,
) -> Transition<u32> {
    edit_facility(network, facility_id, |facility| {
        edit_department(facility, department_id, |department| {
            let count = clamp_add(department.specialist_count, delta);
            let mut next = department.clone();
            next.specialist_count = count;
            Some((next, count))
        })
    })
}

/// Replace the count for `date` if present, append a record otherwise.
///
/// Re-applying the same `(date, count)` returns the input root untouched
/// with [`CensusChange::Unchanged`].
pub fn upsert_census(
    network: &Arc<Network>,
    facility_id: &EntityId,
    date: NaiveDate,
    count: u32,
) -> Transition<CensusChange> {
    let Some(facility) = network.facility(facility_id) else {
        return Transition::unchanged(network);
    };

    match facility.census_on(date) {
        Some(existing) if existing == count => Transition {
            network: Arc::clone(network),
            outcome: Some(CensusChange::Unchanged),
        },
        existing => edit_facility(network, facility_id, |facility| {
            let mut next = facility.clone();
            match next.census.iter_mut().find(|r| r.date == date) {
                Some(record) => record.count = count,
                None => next.census.push(CensusRecord { date, count }),
            }
            let change = existing.map_or(CensusChange::Inserted, |previous| {
                CensusChange::Replaced { previous }
            });
            Some((next, change))
        }),
    }
}

// ── Path-copy helpers ───────────────────────────────────────────────

fn edit_facility<T>(
    network: &Arc<Network>,
    id: &EntityId,
    edit: impl FnOnce(&Facility) -> Option<(Facility, T)>,
) -> Transition<T> {
    let Some(pos) = network.facilities.iter().position(|f| f.id == *id) else {
        return Transition::unchanged(network);
    };
    let Some((facility, outcome)) = edit(&network.facilities[pos]) else {
        return Transition::unchanged(network);
    };

    let mut next = Network::clone(network);
    next.facilities[pos] = Arc::new(facility);
    Transition {
        network: Arc::new(next),
        outcome: Some(outcome),
    }
}

fn edit_department<T>(
    facility: &Facility,
    id: &EntityId,
    edit: impl FnOnce(&Department) -> Option<(Department, T)>,
) -> Option<(Facility, T)> {
    let pos = facility.departments.iter().position(|d| d.id == *id)?;
    let (department, outcome) = edit(&facility.departments[pos])?;

    let mut next = facility.clone();
    next.departments[pos] = Arc::new(department);
    Some((next, outcome))
}

fn edit_item<T>(
    department: &Department,
    id: &EntityId,
    edit: impl FnOnce(&Item) -> Option<(Item, T)>,
) -> Option<(Department, T)> {
    let pos = department.inventory.iter().position(|i| i.id == *id)?;
    let (item, outcome) = edit(&department.inventory[pos])?;

    let mut next = department.clone();
    next.inventory[pos] = Arc::new(item);
    Some((next, outcome))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, HISTORY_CAPACITY, History, ItemCategory};
    use pretty_assertions::assert_eq;

    fn item(id: &str, quantity: u32, rate: f64) -> Item {
        Item {
            id: EntityId::from(id),
            category: ItemCategory::Oxygen,
            quantity,
            daily_usage_rate: rate,
            history: History::new(),
        }
    }

    fn network() -> Arc<Network> {
        let department = |id: &str| Department {
            id: EntityId::from(id),
            name: format!("Dept {id}"),
            specialist_title: "Surgeons".into(),
            specialist_count: 3,
            inventory: vec![Arc::new(item("i1", 60, 8.0)), Arc::new(item("i2", 10, 1.0))],
        };
        let facility = |id: &str| Facility {
            id: EntityId::from(id),
            name: format!("Facility {id}"),
            max_capacity: 300,
            coordinates: Coordinates::default(),
            census: Vec::new(),
            departments: vec![Arc::new(department("d1")), Arc::new(department("d2"))],
        };
        Arc::new(Network::new(vec![facility("h1"), facility("h2")]))
    }

    fn ids(f: &str, d: &str, i: &str) -> (EntityId, EntityId, EntityId) {
        (EntityId::from(f), EntityId::from(d), EntityId::from(i))
    }

    fn quantity(network: &Network, f: &str, d: &str, i: &str) -> u32 {
        let (f, d, i) = ids(f, d, i);
        network.item(&f, &d, &i).unwrap().item.quantity
    }

    #[test]
    fn delta_clamps_at_zero_and_records_history() {
        let root = network();
        let (f, d, i) = ids("h1", "d1", "i2");

        let t = apply_delta(&root, &f, &d, &i, -25, Utc::now());
        assert_eq!(t.outcome, Some(0));

        let loc = t.network.item(&f, &d, &i).unwrap();
        assert_eq!(loc.item.quantity, 0);
        assert_eq!(loc.item.history.len(), 1);
        assert_eq!(loc.item.history.last().unwrap().kind, HistoryKind::Usage);
        assert_eq!(loc.item.history.last().unwrap().value, 0);
    }

    #[test]
    fn restock_is_recorded_as_restock() {
        let root = network();
        let (f, d, i) = ids("h1", "d1", "i1");
        let t = apply_delta(&root, &f, &d, &i, 5, Utc::now());
        let loc = t.network.item(&f, &d, &i).unwrap();
        assert_eq!(loc.item.quantity, 65);
        assert_eq!(loc.item.history.last().unwrap().kind, HistoryKind::Restock);
    }

    #[test]
    fn final_quantity_matches_clamped_sum_for_any_order() {
        let deltas = [-30_i64, 12, -5, 40, -100, 7];
        let mut root = network();
        let (f, d, i) = ids("h2", "d2", "i1");
        let mut expected = 60_i64;
        for delta in deltas {
            root = apply_delta(&root, &f, &d, &i, delta, Utc::now()).network;
            expected = (expected + delta).max(0);
        }
        assert_eq!(i64::from(quantity(&root, "h2", "d2", "i1")), expected);
    }

    #[test]
    fn history_caps_at_twenty_most_recent() {
        let mut root = network();
        let (f, d, i) = ids("h1", "d1", "i1");
        for _ in 0..25 {
            root = apply_delta(&root, &f, &d, &i, -1, Utc::now()).network;
        }
        let loc = root.item(&f, &d, &i).unwrap();
        assert_eq!(loc.item.history.len(), HISTORY_CAPACITY);
        let values: Vec<u32> = loc.item.history.iter().map(|p| p.value).collect();
        assert_eq!(values, (35..=54).rev().collect::<Vec<u32>>());
    }

    #[test]
    fn unresolved_ids_leave_tree_untouched() {
        let root = network();
        for (f, d, i) in [
            ids("h9", "d1", "i1"),
            ids("h1", "d9", "i1"),
            ids("h1", "d1", "i9"),
        ] {
            let t = apply_delta(&root, &f, &d, &i, -1, Utc::now());
            assert_eq!(t.outcome, None);
            assert!(!t.changed_from(&root));
        }

        let t = update_specialist_count(&root, &EntityId::from("h1"), &EntityId::from("d9"), 1);
        assert_eq!(t.outcome, None);
        assert!(Arc::ptr_eq(&t.network, &root));
    }

    #[test]
    fn untouched_subtrees_are_shared() {
        let root = network();
        let (f, d, i) = ids("h1", "d1", "i1");
        let next = apply_delta(&root, &f, &d, &i, -1, Utc::now()).network;

        assert!(Arc::ptr_eq(&root.facilities[1], &next.facilities[1]));
        assert!(Arc::ptr_eq(
            &root.facilities[0].departments[1],
            &next.facilities[0].departments[1]
        ));
        assert!(Arc::ptr_eq(
            &root.facilities[0].departments[0].inventory[1],
            &next.facilities[0].departments[0].inventory[1]
        ));
        // The previous snapshot still reads the old value.
        assert_eq!(quantity(&root, "h1", "d1", "i1"), 60);
        assert_eq!(quantity(&next, "h1", "d1", "i1"), 59);
    }

    #[test]
    fn specialist_count_clamps() {
        let root = network();
        let f = EntityId::from("h2");
        let d = EntityId::from("d1");
        let t = update_specialist_count(&root, &f, &d, -7);
        assert_eq!(t.outcome, Some(0));
        let t = update_specialist_count(&t.network, &f, &d, 2);
        assert_eq!(t.outcome, Some(2));
    }

    #[test]
    fn census_upsert_replaces_existing_date() {
        let root = network();
        let f = EntityId::from("h1");
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let first = upsert_census(&root, &f, date, 150);
        assert_eq!(first.outcome, Some(CensusChange::Inserted));
        let second = upsert_census(&first.network, &f, date, 200);
        assert_eq!(second.outcome, Some(CensusChange::Replaced { previous: 150 }));

        let facility = second.network.facility(&f).unwrap();
        assert_eq!(facility.census, vec![CensusRecord { date, count: 200 }]);
    }

    #[test]
    fn census_upsert_is_idempotent() {
        let root = network();
        let f = EntityId::from("h2");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        let once = upsert_census(&root, &f, date, 180).network;
        let twice = upsert_census(&once, &f, date, 180);
        assert_eq!(twice.outcome, Some(CensusChange::Unchanged));
        assert!(Arc::ptr_eq(&once, &twice.network));
        assert_eq!(twice.network.facility(&f).unwrap().census.len(), 1);
    }

    #[test]
    fn census_upsert_unknown_facility_is_noop() {
        let root = network();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let t = upsert_census(&root, &EntityId::from("nope"), date, 1);
        assert_eq!(t.outcome, None);
        assert!(!t.changed_from(&root));
    }
}
