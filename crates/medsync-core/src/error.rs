// ── Core error types ──
//
// Mutations never fail: clamped input and unresolved ids are absorbed by
// the store. Errors here cover bootstrap data, strict lookups requested by
// front ends, and the analysis collaborator boundary.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Invalid seed data: {message}")]
    InvalidSeed { message: String },

    #[error("Failed to parse seed data: {0}")]
    SeedFormat(#[from] serde_json::Error),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn not_found(entity_type: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.to_string(),
        }
    }

    pub(crate) fn invalid_seed(message: impl Into<String>) -> Self {
        Self::InvalidSeed {
            message: message.into(),
        }
    }
}

/// Failure reported by (or while calling) the analysis collaborator.
///
/// Never surfaces past [`Engine::analyze`](crate::Engine::analyze), which
/// substitutes a fixed fallback message.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis service unavailable: {message}")]
    Unavailable { message: String },

    #[error("analysis timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u128 },

    #[error("analysis returned an empty assessment")]
    EmptyResponse,

    #[error("failed to serialize network brief: {0}")]
    Serialization(#[from] serde_json::Error),
}
