// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the multicast app delegate.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MulticastConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Dispatch behavior of the proxy.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// How the proxy answers the host's "do you implement this callback?" query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityMode {
    /// Claim a callback only while at least one registered delegate
    /// implements it.
    #[default]
    Live,
    /// Claim every callback of the table regardless of registrations.
    Always,
}

impl std::fmt::Display for CapabilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityMode::Live => write!(f, "live"),
            CapabilityMode::Always => write!(f, "always"),
        }
    }
}

/// Dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Catch panics raised inside delegates and treat them as isolated faults.
    #[serde(default = "default_true")]
    pub isolate_panics: bool,

    /// Warn when a single delegate call takes longer than this many
    /// milliseconds. `0` disables the warning.
    #[serde(default = "default_slow_delegate_warn_ms")]
    pub slow_delegate_warn_ms: u64,

    /// Capability answer strategy.
    #[serde(default)]
    pub capability_mode: CapabilityMode,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            isolate_panics: true,
            slow_delegate_warn_ms: default_slow_delegate_warn_ms(),
            capability_mode: CapabilityMode::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_slow_delegate_warn_ms() -> u64 {
    250
}
