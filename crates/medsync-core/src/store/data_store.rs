// ── Central reactive state store ──
//
// Holds the current network root and publishes every new root to
// subscribers via a `watch` channel. Readers get an `Arc<Network>` that
// stays valid after later writes.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::watch;

use super::transition::{self, CensusChange, Transition};
use crate::model::{Department, EntityId, Facility, Item, Network};
use crate::stream::NetworkStream;

/// Canonical store for the facility network.
///
/// Every write runs a pure [`transition`] against the current root and
/// swaps the result in atomically. Writes that resolve nothing leave the
/// root (and subscribers) untouched.
pub struct DataStore {
    network: watch::Sender<Arc<Network>>,
}

impl DataStore {
    pub fn new(network: Network) -> Self {
        let (network, _) = watch::channel(Arc::new(network));
        Self { network }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Apply a stock delta. Returns the new quantity, or `None` when any id
    /// does not resolve.
    pub fn apply_delta(
        &self,
        facility_id: &EntityId,
        department_id: &EntityId,
        item_id: &EntityId,
        delta: i64,
    ) -> Option<u32> {
        let now = Utc::now();
        self.commit(|root| {
            transition::apply_delta(root, facility_id, department_id, item_id, delta, now)
        })
    }

    pub fn update_specialist_count(
        &self,
        facility_id: &EntityId,
        department_id: &EntityId,
        delta: i64,
    ) -> Option<u32> {
        self.commit(|root| {
            transition::update_specialist_count(root, facility_id, department_id, delta)
        })
    }

    pub fn upsert_census(
        &self,
        facility_id: &EntityId,
        date: NaiveDate,
        count: u32,
    ) -> Option<CensusChange> {
        self.commit(|root| transition::upsert_census(root, facility_id, date, count))
    }

    /// Run a transition against the current root and publish the result if
    /// it produced a new one.
    fn commit<T>(&self, step: impl FnOnce(&Arc<Network>) -> Transition<T>) -> Option<T> {
        let mut outcome = None;
        self.network.send_if_modified(|root| {
            let next = step(root);
            outcome = next.outcome;
            if Arc::ptr_eq(&next.network, root) {
                false
            } else {
                *root = next.network;
                true
            }
        });
        outcome
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<Network> {
        self.network.borrow().clone()
    }

    pub fn subscribe(&self) -> NetworkStream {
        NetworkStream::new(self.network.subscribe())
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn facility(&self, id: &EntityId) -> Option<Arc<Facility>> {
        self.network.borrow().facility(id).cloned()
    }

    pub fn department(
        &self,
        facility_id: &EntityId,
        department_id: &EntityId,
    ) -> Option<Arc<Department>> {
        self.network
            .borrow()
            .facility(facility_id)?
            .department(department_id)
            .cloned()
    }

    pub fn item(
        &self,
        facility_id: &EntityId,
        department_id: &EntityId,
        item_id: &EntityId,
    ) -> Option<Arc<Item>> {
        self.department(facility_id, department_id)?
            .item(item_id)
            .cloned()
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(Network::default())
    }
}
