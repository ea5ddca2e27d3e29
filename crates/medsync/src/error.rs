//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use medsync_config::ConfigError;
use medsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    #[allow(dead_code)]
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(medsync::not_found),
        help("Run: medsync status to see facilities and items")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("Unknown supply category '{given}'")]
    #[diagnostic(code(medsync::category), help("Expected one of: {expected}"))]
    UnknownCategory { given: String, expected: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(medsync::validation))]
    Validation { field: String, reason: String },

    // ── Seed data ────────────────────────────────────────────────────
    #[error("Could not load network seed from {}", path.display())]
    #[diagnostic(
        code(medsync::seed),
        help("Seeds are JSON (`{{\"facilities\": [...]}}` or a bare array) or TOML with [[facilities]] tables.")
    )]
    Seed {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    #[error("Invalid TOML in {}", path.display())]
    #[diagnostic(code(medsync::toml))]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid replay script: {0}")]
    #[diagnostic(
        code(medsync::script),
        help("A script is a JSON array of {{\"command\": {{\"type\": ...}}}} or {{\"wait_ms\": N}} steps.")
    )]
    Script(#[source] serde_json::Error),

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(medsync::config),
        help("Check the config file (medsync config path) and MEDSYNC_* environment variables.")
    )]
    Config(#[from] ConfigError),

    #[error("Config file already exists at {}", path.display())]
    #[diagnostic(
        code(medsync::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: PathBuf },

    // ── Engine ───────────────────────────────────────────────────────
    #[error("Engine error: {0}")]
    #[diagnostic(code(medsync::engine))]
    Engine(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(medsync::json))]
    Json(#[from] serde_json::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(medsync::toml_ser))]
    TomlSer(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::UnknownCategory { .. } | Self::Validation { .. } | Self::Script(_) => {
                exit_code::USAGE
            }
            Self::Config(_) | Self::Seed { .. } | Self::Toml { .. } => exit_code::CONFIG,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                resource_type: entity_type,
                identifier,
            },
            CoreError::Config { message } => Self::Validation {
                field: "engine".into(),
                reason: message,
            },
            other => Self::Engine(other.to_string()),
        }
    }
}
