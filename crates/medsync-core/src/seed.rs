// ── Bootstrap data ──
//
// Seeds are static network descriptions (JSON here; TOML via any serde
// front end). They are checked once on the way in so every later write can
// assume unique ids and usable usage rates.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{Facility, Network};

/// Serialized form of a network: `{ "facilities": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSeed {
    #[serde(default)]
    pub facilities: Vec<Facility>,
}

impl NetworkSeed {
    /// Parse JSON. Accepts the wrapped form or a bare facility array.
    pub fn from_json(input: &str) -> Result<Self, CoreError> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        if value.is_array() {
            Ok(Self {
                facilities: serde_json::from_value(value)?,
            })
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    /// Validate and build the network.
    pub fn into_network(self) -> Result<Network, CoreError> {
        let network = Network::new(self.facilities);
        validate(&network)?;
        Ok(network)
    }
}

impl TryFrom<NetworkSeed> for Network {
    type Error = CoreError;

    fn try_from(seed: NetworkSeed) -> Result<Self, Self::Error> {
        seed.into_network()
    }
}

impl From<&Network> for NetworkSeed {
    fn from(network: &Network) -> Self {
        Self {
            facilities: network.facilities.iter().map(|f| (**f).clone()).collect(),
        }
    }
}

/// Parse and validate a JSON seed in one step.
pub fn network_from_json(input: &str) -> Result<Network, CoreError> {
    NetworkSeed::from_json(input)?.into_network()
}

/// Check the structural invariants the engine relies on.
///
/// History ordering and length are enforced while deserializing, so only
/// identity, census, and rate rules are checked here.
pub fn validate(network: &Network) -> Result<(), CoreError> {
    let mut facility_ids = HashSet::new();
    for facility in &network.facilities {
        if !facility_ids.insert(&facility.id) {
            return Err(CoreError::invalid_seed(format!(
                "duplicate facility id {}",
                facility.id
            )));
        }

        let mut dates = HashSet::new();
        for record in &facility.census {
            if !dates.insert(record.date) {
                return Err(CoreError::invalid_seed(format!(
                    "facility {} has two census records for {}",
                    facility.id, record.date
                )));
            }
        }

        let mut department_ids = HashSet::new();
        for department in &facility.departments {
            if !department_ids.insert(&department.id) {
                return Err(CoreError::invalid_seed(format!(
                    "duplicate department id {} in facility {}",
                    department.id, facility.id
                )));
            }

            let mut item_ids = HashSet::new();
            for item in &department.inventory {
                if !item_ids.insert(&item.id) {
                    return Err(CoreError::invalid_seed(format!(
                        "duplicate item id {} in {}/{}",
                        item.id, facility.id, department.id
                    )));
                }
                if !(item.daily_usage_rate.is_finite() && item.daily_usage_rate > 0.0) {
                    return Err(CoreError::invalid_seed(format!(
                        "item {}/{}/{} has usage rate {}, expected a positive number",
                        facility.id, department.id, item.id, item.daily_usage_rate
                    )));
                }
            }
        }
    }
    Ok(())
}
