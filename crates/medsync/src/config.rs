//! CLI-side configuration: `GlobalOpts` overrides on top of
//! `medsync_config`, and network seed loading.
//!
//! Core never sees these types -- it receives a pre-built `EngineConfig`
//! and `Network`.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::debug;

use medsync_config::Config;
use medsync_core::{Network, NetworkSeed};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Demo network used when neither `--seed` nor `seed_path` is set.
const DEMO_NETWORK: &str = include_str!("../assets/demo-network.json");

// ── Config file ──────────────────────────────────────────────────────

/// `--config` if given, otherwise the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(medsync_config::config_path)
}

pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_path(global);
    debug!(path = %path.display(), "loading config");
    Ok(medsync_config::load_config_from(&path)?)
}

// ── Output preferences ───────────────────────────────────────────────

/// Flag, then config default, then table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&cfg.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

pub fn color_mode(global: &GlobalOpts, cfg: &Config) -> ColorMode {
    global
        .color
        .or_else(|| ColorMode::from_str(&cfg.defaults.color, true).ok())
        .unwrap_or(ColorMode::Auto)
}

// ── Seed loading ─────────────────────────────────────────────────────

/// Load the network from `--seed`, the config's `seed_path`, or the
/// built-in demo network, in that order.
pub fn load_network(global: &GlobalOpts, cfg: &Config) -> Result<Network, CliError> {
    match global.seed.as_ref().or(cfg.seed_path.as_ref()) {
        Some(path) => load_seed_file(path),
        None => {
            debug!("using built-in demo network");
            Ok(medsync_core::network_from_json(DEMO_NETWORK)?)
        }
    }
}

fn load_seed_file(path: &Path) -> Result<Network, CliError> {
    let text = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let seed = if is_toml {
        toml::from_str::<NetworkSeed>(&text).map_err(|source| CliError::Toml {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        NetworkSeed::from_json(&text).map_err(|source| CliError::Seed {
            path: path.to_path_buf(),
            source,
        })?
    };

    let network = seed.into_network().map_err(|source| CliError::Seed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        facilities = network.facilities.len(),
        items = network.item_count(),
        "seed loaded"
    );
    Ok(network)
}
