// ── Network tree: facilities and departments ──
//
// Children are held behind `Arc` so a write can rebuild the root-to-leaf
// path and share every untouched subtree with the previous snapshot.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::supply::Item;
use crate::error::CoreError;

/// Root of the tree. Facility order is presentation order only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub facilities: Vec<Arc<Facility>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

/// Patient count for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusRecord {
    pub date: NaiveDate,
    pub count: u32,
}

/// One network node (a hospital).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: EntityId,
    pub name: String,
    pub max_capacity: u32,
    #[serde(default)]
    pub coordinates: Coordinates,
    /// At most one record per date.
    #[serde(default)]
    pub census: Vec<CensusRecord>,
    #[serde(default)]
    pub departments: Vec<Arc<Department>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: EntityId,
    pub name: String,
    pub specialist_title: String,
    pub specialist_count: u32,
    #[serde(default)]
    pub inventory: Vec<Arc<Item>>,
}

/// An item together with the department and facility that stock it.
#[derive(Debug, Clone, Copy)]
pub struct StockLocation<'a> {
    pub facility: &'a Facility,
    pub department: &'a Department,
    pub item: &'a Item,
}

impl Network {
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self {
            facilities: facilities.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn facility(&self, id: &EntityId) -> Option<&Arc<Facility>> {
        self.facilities.iter().find(|f| f.id == *id)
    }

    /// Like [`facility`](Self::facility), but a missing id is an error.
    pub fn require_facility(&self, id: &EntityId) -> Result<&Arc<Facility>, CoreError> {
        self.facility(id)
            .ok_or_else(|| CoreError::not_found("facility", id))
    }

    pub fn item(
        &self,
        facility_id: &EntityId,
        department_id: &EntityId,
        item_id: &EntityId,
    ) -> Option<StockLocation<'_>> {
        let facility = self.facility(facility_id)?;
        let department = facility.department(department_id)?;
        let item = department.item(item_id)?;
        Some(StockLocation {
            facility,
            department,
            item,
        })
    }

    /// Every stocked item in presentation order.
    pub fn stock(&self) -> impl Iterator<Item = StockLocation<'_>> {
        self.facilities.iter().flat_map(|facility| {
            facility.departments.iter().flat_map(move |department| {
                department.inventory.iter().map(move |item| StockLocation {
                    facility,
                    department,
                    item,
                })
            })
        })
    }

    pub fn item_count(&self) -> usize {
        self.stock().count()
    }
}

impl Facility {
    pub fn department(&self, id: &EntityId) -> Option<&Arc<Department>> {
        self.departments.iter().find(|d| d.id == *id)
    }

    pub fn census_on(&self, date: NaiveDate) -> Option<u32> {
        self.census.iter().find(|r| r.date == date).map(|r| r.count)
    }

    pub fn total_specialists(&self) -> u32 {
        self.departments
            .iter()
            .map(|d| d.specialist_count)
            .fold(0, u32::saturating_add)
    }
}

impl Department {
    pub fn item(&self, id: &EntityId) -> Option<&Arc<Item>> {
        self.inventory.iter().find(|i| i.id == *id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn network() -> Network {
        Network::new(vec![Facility {
            id: EntityId::from("h2"),
            name: "Al-Shifa Hospital".into(),
            max_capacity: 700,
            coordinates: Coordinates::default(),
            census: Vec::new(),
            departments: Vec::new(),
        }])
    }

    #[test]
    fn require_facility_names_missing_id() {
        let network = network();
        assert_eq!(
            network.require_facility(&EntityId::from("h2")).unwrap().name,
            "Al-Shifa Hospital"
        );

        let err = network.require_facility(&EntityId::from("h7")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(err.to_string().contains("h7"));
    }
}
