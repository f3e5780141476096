// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy (`./multicast.toml`, then
//! `~/.config/multicast/multicast.toml`, then `/etc/multicast/multicast.toml`)
//! with environment variable overrides via the `MULTICAST_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing::debug;

use crate::model::MulticastConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/multicast/multicast.toml";

/// Local config file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "multicast.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/multicast/multicast.toml`
/// 3. `~/.config/multicast/multicast.toml`
/// 4. `./multicast.toml`
/// 5. `MULTICAST_*` environment variables
pub fn load_config() -> Result<MulticastConfig, figment::Error> {
    debug!(
        system = SYSTEM_CONFIG_PATH,
        local = LOCAL_CONFIG_FILE,
        "loading layered configuration"
    );
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MulticastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MulticastConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MulticastConfig, figment::Error> {
    debug!(path = %path.display(), "loading configuration file");
    Figment::new()
        .merge(Serialized::defaults(MulticastConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MulticastConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/multicast/multicast.toml`, if a config dir is known.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("multicast").join(LOCAL_CONFIG_FILE))
}

/// Environment variable provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `MULTICAST_DISPATCH_SLOW_DELEGATE_WARN_MS` must map to
/// `dispatch.slow_delegate_warn_ms`. The key reaches the closure in its
/// original case, so it is lowercased before the section prefix is matched.
fn env_provider() -> Env {
    Env::prefixed("MULTICAST_").map(|key| {
        key.as_str()
            .to_ascii_lowercase()
            .replacen("logging_", "logging.", 1)
            .replacen("dispatch_", "dispatch.", 1)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::model::CapabilityMode;

    #[test]
    fn env_overrides_underscored_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("MULTICAST_DISPATCH_SLOW_DELEGATE_WARN_MS", "900");
            jail.set_env("MULTICAST_DISPATCH_CAPABILITY_MODE", "always");
            jail.set_env("MULTICAST_LOGGING_LEVEL", "debug");

            let config = load_config()?;
            assert_eq!(config.dispatch.slow_delegate_warn_ms, 900);
            assert_eq!(config.dispatch.capability_mode, CapabilityMode::Always);
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn local_file_is_picked_up() {
        Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_FILE,
                r#"
[dispatch]
isolate_panics = false
"#,
            )?;

            let config = load_config()?;
            assert!(!config.dispatch.isolate_panics);
            Ok(())
        });
    }

    #[test]
    fn env_beats_local_file() {
        Jail::expect_with(|jail| {
            jail.create_file(LOCAL_CONFIG_FILE, "[logging]\nlevel = \"warn\"\n")?;
            jail.set_env("MULTICAST_LOGGING_LEVEL", "trace");

            let config = load_config()?;
            assert_eq!(config.logging.level, "trace");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_explicit_path() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[dispatch]\nslow_delegate_warn_ms = 10\n")?;
            jail.set_env("MULTICAST_DISPATCH_SLOW_DELEGATE_WARN_MS", "40");
            jail.set_env("MULTICAST_DISPATCH_ISOLATE_PANICS", "false");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.dispatch.slow_delegate_warn_ms, 40);
            assert!(!config.dispatch.isolate_panics);
            Ok(())
        });
    }
}
