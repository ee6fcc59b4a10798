// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Wahook ingestion engine.

use thiserror::Error;

/// The primary error type used across all Wahook crates.
///
/// Variants map onto the failure classes the recovery path distinguishes:
/// recoverable failures (normalization, dependency resolution, persistence,
/// malformed payloads, storage outages) are captured to the failure journal
/// and retried; action failures are contained per rule and never retried.
#[derive(Debug, Error)]
pub enum WahookError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A raw payload could not be mapped into a canonical record.
    #[error("normalization failed for `{event}`: {message}")]
    Normalization { event: String, message: String },

    /// The store was unavailable while resolving a contact/chat/group chain.
    #[error("dependency resolution failed for {entity}: {source}")]
    DependencyResolution {
        entity: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A canonical record could not be persisted.
    #[error("persistence failed for {entity}: {source}")]
    Persistence {
        entity: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No recognizable identity field in any payload shape.
    #[error("malformed payload for `{event}`: {message}")]
    MalformedPayload { event: String, message: String },

    /// A rule action failed; recorded in the execution audit, never retried.
    #[error("action `{action}` failed: {message}")]
    ActionExecution { action: String, message: String },

    /// Outbound HTTP errors (webhook_call actions, notification pushes).
    #[error("http error: {message}")]
    Http {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WahookError {
    /// Whether this failure class should be captured to the recovery
    /// journal and replayed later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WahookError::Storage { .. }
                | WahookError::Normalization { .. }
                | WahookError::DependencyResolution { .. }
                | WahookError::Persistence { .. }
                | WahookError::MalformedPayload { .. }
        )
    }
}
