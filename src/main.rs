// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the JWKS test server
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use jwks_server::config::{self, Config};
use jwks_server::jwt::KeyStore;
use jwks_server::server::{build_rocket, rocket_figment};
use log::info;
use rocket::config::LogLevel;

/// JWKS server issuing RS256 test tokens
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Web server port (overrides the configuration file)
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Web server address (overrides the configuration file)
    #[arg(short = 'a', long = "address")]
    address: Option<String>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[rocket::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (log_level, rocket_log_level) = if args.quiet {
        (log::LevelFilter::Off, LogLevel::Off)
    } else if args.verbose {
        (log::LevelFilter::Debug, LogLevel::Debug)
    } else {
        (log::LevelFilter::Info, LogLevel::Normal)
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {:#}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;
    config.apply_args(args.port, args.address.clone());

    // RSA generation is CPU bound, keep it off the async workers
    let store_config = config.keys.store_config(Utc::now())?;
    let issuer = config.token.issuer()?;
    let store = tokio::task::spawn_blocking(move || KeyStore::new(store_config))
        .await
        .context("Key generation task panicked")?
        .context("Failed to generate signing keys")?;

    for record in store.read().records() {
        info!(
            "Generated key {} expiring at {}",
            record.kid(),
            record.expires_at()
        );
    }

    let figment = rocket_figment(&config, rocket_log_level)?;
    info!(
        "Starting JWKS server on {}:{}",
        config.server.address, config.server.port
    );

    build_rocket(figment, Arc::new(store), issuer)
        .launch()
        .await?;

    Ok(())
}
