// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the JWKS server
//!
//! The configuration is backed by a YAML file and validated against an
//! embedded JSON schema before being deserialized.
//!
//! ## Configuration Structure
//!
//! - `server`: network binding, server name and optional TLS material
//! - `keys`: expiry of the expired and valid signing keys, relative to startup
//! - `token`: claims and lifetime of issued tokens
//!
//! ## Usage
//!
//! ```no_run
//! use jwks_server::config::Config;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file("config.yaml").unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(Some(8081), Some("0.0.0.0".to_string()));
//!
//! println!("Server port: {}", config.server.port);
//! ```

pub mod keys;
pub mod server;
pub mod token;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use keys::KeysConfig;
pub use server::ServerConfig;
pub use token::TokenConfig;
pub use utils::{is_valid_ip_address, output_config_schema, CONFIG_SCHEMA, MAX_DURATION_SECS};

/// Root configuration structure.
///
/// Every section falls back to its defaults when missing from the file, so an
/// empty document is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Signing key expiry settings
    #[serde(default)]
    pub keys: KeysConfig,

    /// Issued token settings
    #[serde(default)]
    pub token: TokenConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with default values. A file failing schema
    /// validation, deserialization or the additional rules is rejected, and a
    /// `*.sample.yaml` file with defaults is written next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Configuration file not found at {:?}, creating default", path);
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        match Self::from_yaml_str(&contents) {
            Ok(config) => Ok(config),
            Err(err) => {
                error!("Configuration error in {}: {:#}", path.display(), err);
                Self::create_sample_config(path)?;
                Err(err.context(format!(
                    "Failed to load configuration from {}",
                    path.display()
                )))
            }
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // An empty document means "all defaults"
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let yaml_value: serde_yml::Value =
            serde_yml::from_str(contents).context("Failed to parse YAML configuration")?;

        let json_value = serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?;

        utils::validate_against_schema(&json_value)?;

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = serde_json::from_value(json_value)
            .context("Failed to deserialize configuration")?;

        utils::validate_specific_rules(&config)?;

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only values explicitly provided override the loaded configuration.
    pub fn apply_args(&mut self, port: Option<u16>, address: Option<String>) {
        if let Some(port) = port {
            debug!("Overriding port from command line: {}", port);
            self.server.port = port;
        }

        if let Some(address) = address {
            debug!("Overriding address from command line: {}", address);
            self.server.address = address;
        }
    }
}
