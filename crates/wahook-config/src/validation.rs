// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects all errors instead of failing fast.

use crate::ConfigError;
use crate::model::WahookConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &WahookConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.recovery.journal_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "recovery.journal_dir must not be empty".to_string(),
        });
    }

    if config.recovery.sweep_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "recovery.sweep_interval_secs must be at least 1".to_string(),
        });
    }

    if config.recovery.max_retries == 0 {
        errors.push(ConfigError::Validation {
            message: "recovery.max_retries must be at least 1".to_string(),
        });
    }

    if config.recovery.backoff_secs.is_empty() {
        errors.push(ConfigError::Validation {
            message: "recovery.backoff_secs must not be empty".to_string(),
        });
    } else if config.recovery.backoff_secs.windows(2).any(|w| w[0] > w[1]) {
        errors.push(ConfigError::Validation {
            message: "recovery.backoff_secs must be monotonically non-decreasing".to_string(),
        });
    }

    if config.rules.default_max_executions_per_day < 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "rules.default_max_executions_per_day must be non-negative, got {}",
                config.rules.default_max_executions_per_day
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&WahookConfig::default()).is_ok());
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = WahookConfig::default();
        config.server.host = "".into();
        config.recovery.max_retries = 0;
        config.recovery.backoff_secs = vec![10, 5, 1];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_decreasing_backoff() {
        let mut config = WahookConfig::default();
        config.recovery.backoff_secs = vec![1, 5, 2];
        assert!(validate_config(&config).is_err());
    }
}
