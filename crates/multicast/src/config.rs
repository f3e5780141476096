// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `multicast config` command implementation.
//!
//! The configuration has already been loaded and validated by the time this
//! runs; it prints the effective values after file and environment layering.

use multicast_config::MulticastConfig;
use multicast_core::MulticastError;

/// Run the `multicast config` command.
pub fn run_config(config: &MulticastConfig, json: bool) -> Result<(), MulticastError> {
    println!("{}", render_config(config, json)?);
    Ok(())
}

fn render_config(config: &MulticastConfig, json: bool) -> Result<String, MulticastError> {
    if json {
        serde_json::to_string_pretty(config)
            .map_err(|e| MulticastError::Internal(format!("failed to serialize config: {e}")))
    } else {
        toml::to_string_pretty(config)
            .map_err(|e| MulticastError::Internal(format!("failed to serialize config: {e}")))
    }
}
