// ── Supply items and stock status ──

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

use super::entity_id::EntityId;
use super::history::History;

/// Tracked supply categories.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ItemCategory {
    #[strum(serialize = "fluids", to_string = "IV Fluids")]
    Fluids,
    #[strum(serialize = "oxygen", serialize = "o2", to_string = "Oxygen (O2)")]
    Oxygen,
    #[strum(serialize = "analgesics", to_string = "Analgesics")]
    Analgesics,
    #[strum(serialize = "anesthesia", to_string = "Anesthesia")]
    Anesthesia,
    #[strum(serialize = "antibiotics", to_string = "Antibiotics")]
    Antibiotics,
    #[strum(serialize = "insulin", to_string = "Insulin")]
    Insulin,
}

impl ItemCategory {
    /// Every category in declaration order.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    /// Short machine name, as used in seeds and on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Fluids => "fluids",
            Self::Oxygen => "oxygen",
            Self::Analgesics => "analgesics",
            Self::Anesthesia => "anesthesia",
            Self::Antibiotics => "antibiotics",
            Self::Insulin => "insulin",
        }
    }
}

/// Runway thresholds, in days of supply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunwayThresholds {
    /// Below this runway an item is critical.
    pub critical_days: f64,
    /// Below this runway (and not critical) an item is low.
    pub low_days: f64,
}

impl Default for RunwayThresholds {
    fn default() -> Self {
        Self {
            critical_days: 2.0,
            low_days: 5.0,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StockStatus {
    Critical,
    Low,
    Adequate,
}

impl StockStatus {
    pub fn from_runway(runway_days: f64, thresholds: RunwayThresholds) -> Self {
        if runway_days < thresholds.critical_days {
            Self::Critical
        } else if runway_days < thresholds.low_days {
            Self::Low
        } else {
            Self::Adequate
        }
    }
}

/// One stocked supply line inside a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,
    pub category: ItemCategory,
    pub quantity: u32,
    /// Units consumed per day. Always positive for validated networks.
    pub daily_usage_rate: f64,
    #[serde(default)]
    pub history: History,
}

impl Item {
    /// Days of supply left at the current usage rate.
    pub fn runway_days(&self) -> f64 {
        runway_days(self.quantity, self.daily_usage_rate)
    }

    pub fn status(&self, thresholds: RunwayThresholds) -> StockStatus {
        StockStatus::from_runway(self.runway_days(), thresholds)
    }
}

/// `quantity / daily_usage_rate`.
pub fn runway_days(quantity: u32, daily_usage_rate: f64) -> f64 {
    f64::from(quantity) / daily_usage_rate
}

/// Add a signed delta to a count, flooring at zero.
pub fn clamp_add(current: u32, delta: i64) -> u32 {
    let next = i64::from(current).saturating_add(delta).max(0);
    u32::try_from(next).unwrap_or(u32::MAX)
}
