//! pagetype CLI Binary
//!
//! Command-line interface for inspecting and driving a site's page types.

use anyhow::Context;
use clap::Parser;
use pagetype::cli::{Cli, RunContext};
use pagetype::config::ConfigLoader;
use pagetype::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    if let Err(e) = run() {
        eprintln!("{:#}", e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);
    init_logging(Some(&logging_config), Some(&cli.root)).context("Failed to initialize logging")?;

    info!("pagetype CLI starting");

    let context = RunContext::new(cli.root.clone(), cli.config.clone()).map_err(|e| {
        error!("Error opening site: {}", e);
        anyhow::anyhow!(pagetype::cli::map_error(&e))
    })?;

    let output = context.execute(&cli.command).map_err(|e| {
        error!("Command failed: {}", e);
        anyhow::anyhow!(pagetype::cli::map_error(&e))
    })?;
    println!("{}", output);
    Ok(())
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.root)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }

    config
}
