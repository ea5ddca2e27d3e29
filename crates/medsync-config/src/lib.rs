//! Shared configuration for medsync front ends.
//!
//! TOML config file, `MEDSYNC_` environment overrides, and translation to
//! `medsync_core::EngineConfig`. The core never reads files; this crate is
//! where disk and environment meet the engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use medsync_core::{Connectivity, CoreError, EngineConfig, OperatingContext, RunwayThresholds};

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `MEDSYNC_ENGINE__SETTLE_DELAY_MS=500`.
pub const ENV_PREFIX: &str = "MEDSYNC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Network seed file (JSON or TOML). The CLI falls back to its
    /// built-in demo network when unset.
    pub seed_path: Option<PathBuf>,

    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,

    /// Engine tuning.
    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// On-disk form of [`EngineConfig`]. Durations are whole milliseconds or
/// seconds so the file stays hand-editable.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    pub settle_delay_ms: u64,
    pub simulator_period_ms: u64,
    pub depletion_probability: f64,
    pub critical_runway_days: f64,
    pub low_runway_days: f64,
    pub analysis_timeout_secs: u64,
    /// Fixed simulator seed for reproducible runs.
    pub rng_seed: Option<u64>,
    pub connectivity: Connectivity,
    pub context: OperatingContext,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            settle_delay_ms: duration_millis(config.settle_delay),
            simulator_period_ms: duration_millis(config.simulator_period),
            depletion_probability: config.depletion_probability,
            critical_runway_days: config.thresholds.critical_days,
            low_runway_days: config.thresholds.low_days,
            analysis_timeout_secs: config.analysis_timeout.as_secs(),
            rng_seed: config.rng_seed,
            connectivity: config.initial_connectivity,
            context: config.initial_context,
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl EngineSettings {
    /// Validate and convert into the core's runtime config.
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        if self.simulator_period_ms == 0 {
            return Err(ConfigError::validation(
                "engine.simulator_period_ms",
                "must be at least 1",
            ));
        }
        if self.analysis_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "engine.analysis_timeout_secs",
                "must be at least 1",
            ));
        }

        let config = EngineConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            simulator_period: Duration::from_millis(self.simulator_period_ms),
            depletion_probability: self.depletion_probability,
            thresholds: RunwayThresholds {
                critical_days: self.critical_runway_days,
                low_days: self.low_runway_days,
            },
            analysis_timeout: Duration::from_secs(self.analysis_timeout_secs),
            rng_seed: self.rng_seed,
            initial_connectivity: self.connectivity,
            initial_context: self.context,
        };

        config.validate().map_err(|e| match e {
            CoreError::Config { message } => ConfigError::validation("engine", message),
            other => ConfigError::validation("engine", other.to_string()),
        })?;
        Ok(config)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "medsync", "medsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("medsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is not an
/// error; defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path)
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Load from an explicit file only, ignoring the environment.
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment_for(path).extract()?)
}

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
