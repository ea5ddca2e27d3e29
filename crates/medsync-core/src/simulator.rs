// ── Consumption simulator ──
//
// Generates synthetic depletion to exercise alerting. Each tick picks one
// facility, department, and item uniformly at random and, with a fixed
// probability, consumes one unit through the store.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::debug;

use crate::activity::ActivityLog;
use crate::model::{EntityId, Severity, runway_days};
use crate::store::DataStore;

/// What a tick that consumed stock did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Depletion {
    pub facility_id: EntityId,
    pub department_id: EntityId,
    pub item_id: EntityId,
    pub new_quantity: u32,
    pub runway_days: f64,
    /// Whether a critical alert was logged.
    pub critical: bool,
}

/// Seedable depletion generator.
pub struct ConsumptionSimulator<R = StdRng> {
    rng: R,
    depletion_probability: f64,
    critical_runway_days: f64,
}

impl ConsumptionSimulator<StdRng> {
    /// Build with a seeded RNG, or an entropy-seeded one when `seed` is
    /// `None`.
    pub fn from_seed(seed: Option<u64>, depletion_probability: f64, critical_runway_days: f64) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self::new(rng, depletion_probability, critical_runway_days)
    }
}

impl<R: Rng> ConsumptionSimulator<R> {
    /// `depletion_probability` is clamped into `[0, 1]`; NaN counts as 0.
    pub fn new(rng: R, depletion_probability: f64, critical_runway_days: f64) -> Self {
        let depletion_probability = if depletion_probability.is_nan() {
            0.0
        } else {
            depletion_probability.clamp(0.0, 1.0)
        };
        Self {
            rng,
            depletion_probability,
            critical_runway_days,
        }
    }

    pub fn depletion_probability(&self) -> f64 {
        self.depletion_probability
    }

    /// Run one tick against the store. Returns `None` when nothing was
    /// consumed (empty level, out of stock, or the draw said no).
    pub fn tick(&mut self, store: &DataStore, log: &ActivityLog) -> Option<Depletion> {
        let network = store.snapshot();

        let facility = pick(&mut self.rng, &network.facilities)?;
        let department = pick(&mut self.rng, &facility.departments)?;
        let item = pick(&mut self.rng, &department.inventory)?;
        let draw = self.rng.gen_bool(self.depletion_probability);

        if item.quantity == 0 || !draw {
            return None;
        }

        let new_quantity = store.apply_delta(&facility.id, &department.id, &item.id, -1)?;
        let runway = runway_days(new_quantity, item.daily_usage_rate);
        let critical = runway < self.critical_runway_days;

        debug!(
            facility = %facility.id,
            department = %department.id,
            item = %item.id,
            new_quantity,
            runway,
            "simulated consumption"
        );

        if critical {
            log.add(
                format!("CRITICAL LOW: {} in {}", item.category, department.name),
                Severity::Critical,
                facility.name.clone(),
            );
        }

        Some(Depletion {
            facility_id: facility.id.clone(),
            department_id: department.id.clone(),
            item_id: item.id.clone(),
            new_quantity,
            runway_days: runway,
            critical,
        })
    }
}

fn pick<'a, R: Rng, T>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.gen_range(0..items.len()))
}
