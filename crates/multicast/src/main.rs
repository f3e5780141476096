// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multicast - inspect the delegate policy table and replay scenarios.
//!
//! This is the binary entry point for the multicast tooling.

mod config;
mod policies;
mod simulate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Multicast - fan one delegate slot out to many delegates.
#[derive(Parser, Debug)]
#[command(name = "multicast", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the per-callback combination policy table.
    Policies {
        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Validate and print the effective configuration.
    Config {
        /// Output JSON instead of TOML.
        #[arg(long)]
        json: bool,
    },
    /// Replay a TOML scenario of scripted delegates through the proxy.
    Simulate {
        /// Path to the scenario file.
        scenario: PathBuf,
        /// Output JSON reports instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => multicast_config::load_and_validate_path(path),
        None => multicast_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            multicast_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match cli.command {
        Some(Commands::Policies { json }) => policies::run_policies(json),
        Some(Commands::Config { json }) => config::run_config(&config, json),
        Some(Commands::Simulate { scenario, json }) => {
            simulate::run_simulate(&config, &scenario, json)
        }
        None => {
            println!("multicast: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("multicast: {e}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over `logging.level`.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("multicast={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
