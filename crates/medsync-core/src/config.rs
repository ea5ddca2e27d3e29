// ── Runtime engine configuration ──
//
// These types describe *how* the engine behaves: timings, simulator
// tuning, and alert thresholds. They never touch disk; the CLI (or any
// other front end) builds an `EngineConfig` and hands it in.

use std::time::Duration;

use crate::error::CoreError;
use crate::model::RunwayThresholds;
use crate::sync::{Connectivity, OperatingContext};

/// Tuning for a single [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Delay between reconnecting and settling the offline queue.
    pub settle_delay: Duration,
    /// Period of the consumption simulator.
    pub simulator_period: Duration,
    /// Chance that a simulator tick consumes one unit.
    pub depletion_probability: f64,
    /// Runway cut-offs for critical alerts and stock status.
    pub thresholds: RunwayThresholds,
    /// Upper bound on one call to the analysis collaborator.
    pub analysis_timeout: Duration,
    /// Fixed seed for the simulator. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
    pub initial_connectivity: Connectivity,
    pub initial_context: OperatingContext,
}

impl EngineConfig {
    /// Shortest simulator period the engine will arm.
    pub const MIN_SIMULATOR_PERIOD: Duration = Duration::from_millis(1);

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.depletion_probability) {
            return Err(CoreError::Config {
                message: format!(
                    "depletion probability must be within 0..=1, got {}",
                    self.depletion_probability
                ),
            });
        }
        let RunwayThresholds {
            critical_days,
            low_days,
        } = self.thresholds;
        if !critical_days.is_finite() || !low_days.is_finite() || critical_days < 0.0 {
            return Err(CoreError::Config {
                message: "runway thresholds must be finite and non-negative".into(),
            });
        }
        if low_days < critical_days {
            return Err(CoreError::Config {
                message: format!(
                    "low runway threshold ({low_days}) is below the critical one ({critical_days})"
                ),
            });
        }
        if self.simulator_period.is_zero() {
            return Err(CoreError::Config {
                message: "simulator period must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1500),
            simulator_period: Duration::from_secs(3),
            depletion_probability: 0.3,
            thresholds: RunwayThresholds::default(),
            analysis_timeout: Duration::from_secs(30),
            rng_seed: None,
            initial_connectivity: Connectivity::Online,
            initial_context: OperatingContext::Oversight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settle_delay, Duration::from_millis(1500));
        assert_eq!(config.simulator_period, Duration::from_secs(3));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad_probability = EngineConfig {
            depletion_probability: 1.5,
            ..EngineConfig::default()
        };
        assert!(bad_probability.validate().is_err());

        let inverted = EngineConfig {
            thresholds: RunwayThresholds {
                critical_days: 5.0,
                low_days: 2.0,
            },
            ..EngineConfig::default()
        };
        assert!(inverted.validate().is_err());

        let stalled = EngineConfig {
            simulator_period: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert!(stalled.validate().is_err());
    }
}
