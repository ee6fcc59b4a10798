// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. All sections are optional and default to
//! sensible values.

use serde::{Deserialize, Serialize};

/// Top-level Wahook configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WahookConfig {
    /// Engine identity and logging.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Webhook ingress HTTP server.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Failure journal and retry sweeper settings.
    #[serde(default)]
    pub recovery: RecoveryConfig,

    /// Rule engine settings.
    #[serde(default)]
    pub rules: RulesConfig,
}

/// Engine identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Display name used in logs.
    #[serde(default = "default_engine_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_engine_name(),
            log_level: default_log_level(),
        }
    }
}

/// Webhook ingress server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Instance id assumed when a delivery does not name one.
    #[serde(default = "default_instance")]
    pub default_instance: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_instance: default_instance(),
        }
    }
}

/// SQLite store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Failure journal and sweeper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecoveryConfig {
    /// Directory holding one JSON file per failed event. Dead-lettered
    /// records move to a `dead_letter/` subdirectory.
    #[serde(default = "default_journal_dir")]
    pub journal_dir: String,

    /// Seconds between sweep cycles.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Replay attempts before a record is dead-lettered.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff schedule in seconds, indexed by retry count. The last
    /// element is reused once the count exceeds the schedule length.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: Vec<u64>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            journal_dir: default_journal_dir(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_retries: default_max_retries(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

/// Rule engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Daily execution cap applied when a rule does not set its own.
    /// 0 disables the default cap.
    #[serde(default = "default_max_executions_per_day")]
    pub default_max_executions_per_day: i64,

    /// Timeout for outbound webhook_call actions, in seconds.
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            default_max_executions_per_day: default_max_executions_per_day(),
            webhook_timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

fn default_engine_name() -> String {
    "wahook".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8085
}

fn default_instance() -> String {
    "default".to_string()
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("wahook/wahook.db").display().to_string())
        .unwrap_or_else(|| "wahook.db".to_string())
}

fn default_journal_dir() -> String {
    dirs::data_dir()
        .map(|d| d.join("wahook/failed-events").display().to_string())
        .unwrap_or_else(|| "failed-events".to_string())
}

fn default_sweep_interval_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_secs() -> Vec<u64> {
    vec![1, 5, 15, 30, 60]
}

fn default_max_executions_per_day() -> i64 {
    100
}

fn default_webhook_timeout_secs() -> u64 {
    10
}
