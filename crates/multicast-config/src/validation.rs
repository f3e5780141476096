// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::MulticastConfig;

/// Levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `dispatch.slow_delegate_warn_ms` (one minute).
pub const MAX_SLOW_DELEGATE_WARN_MS: u64 = 60_000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of failing fast.
pub fn validate_config(config: &MulticastConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.dispatch.slow_delegate_warn_ms > MAX_SLOW_DELEGATE_WARN_MS {
        errors.push(ConfigError::Validation {
            message: format!(
                "dispatch.slow_delegate_warn_ms must be at most {MAX_SLOW_DELEGATE_WARN_MS}, got {}",
                config.dispatch.slow_delegate_warn_ms
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
