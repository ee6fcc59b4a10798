// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Wahook ingestion engine.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides via the `WAHOOK_` prefix.

pub mod loader;
pub mod model;
pub mod validation;

use thiserror::Error;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::WahookConfig;

/// A configuration problem surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML/env extraction failed.
    #[error("{0}")]
    Parse(String),

    /// A semantic constraint failed after deserialization.
    #[error("{message}")]
    Validation { message: String },
}

/// Load configuration from the XDG hierarchy and validate it.
///
/// On success runs post-deserialization validation; on failure returns all
/// collected errors so the operator sees every problem at once.
pub fn load_and_validate() -> Result<WahookConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse(err.to_string())]),
    }
}

/// Load configuration from a TOML string and validate it. Used by tests
/// and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<WahookConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse(err.to_string())]),
    }
}

/// Print collected config errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for err in errors {
        eprintln!("wahook: config error: {err}");
    }
}
