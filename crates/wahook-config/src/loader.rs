// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wahook.toml` > `~/.config/wahook/wahook.toml`
//! > `/etc/wahook/wahook.toml`, with environment variable overrides via
//! the `WAHOOK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WahookConfig;

/// Load configuration from the standard XDG hierarchy with env overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wahook/wahook.toml` (system-wide)
/// 3. `~/.config/wahook/wahook.toml` (user XDG config)
/// 4. `./wahook.toml` (local directory)
/// 5. `WAHOOK_*` environment variables
pub fn load_config() -> Result<WahookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WahookConfig::default()))
        .merge(Toml::file("/etc/wahook/wahook.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("wahook/wahook.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("wahook.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WahookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WahookConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<WahookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WahookConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-bearing
/// key names stay intact: `WAHOOK_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("WAHOOK_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("engine_", "engine.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("recovery_", "recovery.", 1)
            .replacen("rules_", "rules.", 1);
        mapped.into()
    })
}
