// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! Schema handling and the validation rules the JSON schema cannot express.

use anyhow::{Context, Result};
use base64::Engine;
use log::debug;

use super::Config;

/// Upper bound of every duration setting, in seconds (ten years)
pub const MAX_DURATION_SECS: i64 = 315_360_000;

/// JSON schema of the configuration file
pub const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Output the embedded JSON schema to the console.
///
/// Called when the `--show-config-schema` flag is provided.
///
/// # Example
///
/// ```bash
/// ./jwks_server --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validate a configuration document against the embedded schema
pub fn validate_against_schema(instance: &serde_json::Value) -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let validator = jsonschema::draft202012::options()
        .should_validate_formats(true)
        .build(&schema)
        .map_err(|err| anyhow::anyhow!("Invalid configuration schema: {}", err))?;

    debug!("Validating configuration against schema");
    if let Err(error) = validator.validate(instance) {
        anyhow::bail!("Configuration validation failed: {}", error);
    }

    Ok(())
}

/// Check if a string is a valid IP address
///
/// Accepts any IPv4 or IPv6 address as well as "localhost".
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    matches!(addr, "localhost")
}

/// Validates the configuration against rules not covered by the JSON schema.
///
/// # Validation Rules
///
/// - **TLS material**: certificate and key must be provided together, as base64
/// - **Port range**: 1-65534
/// - **Address**: a valid IP address or `localhost`
/// - **Durations**: key lifetimes and token lifetime must be positive and at
///   most [`MAX_DURATION_SECS`]
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    match (&config.server.cert, &config.server.key) {
        (Some(cert), Some(key)) => {
            base64::engine::general_purpose::STANDARD
                .decode(cert)
                .context("SSL certificate is not valid base64")?;
            base64::engine::general_purpose::STANDARD
                .decode(key)
                .context("SSL key is not valid base64")?;
        }
        (Some(_), None) => anyhow::bail!("SSL certificate provided without a key"),
        (None, Some(_)) => anyhow::bail!("SSL key provided without a certificate"),
        (None, None) => {}
    }

    if config.server.port < 1 || config.server.port > 65534 {
        anyhow::bail!("Invalid port number: {}", config.server.port);
    }

    if !is_valid_ip_address(&config.server.address) {
        anyhow::bail!("Invalid address: {}", config.server.address);
    }

    let durations = [
        ("keys.expired_key_age", config.keys.expired_key_age),
        ("keys.valid_key_lifetime", config.keys.valid_key_lifetime),
        ("token.lifetime", config.token.lifetime),
    ];
    for (name, seconds) in durations {
        if seconds <= 0 {
            anyhow::bail!("{} must be positive, got {}", name, seconds);
        }
        if seconds > MAX_DURATION_SECS {
            anyhow::bail!(
                "{} must be at most {} seconds, got {}",
                name,
                MAX_DURATION_SECS,
                seconds
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_specific_rules(&config).is_ok());
        let value = serde_json::to_value(&config).unwrap();
        assert!(validate_against_schema(&value).is_ok());
    }

    #[test]
    fn test_cert_without_key_is_rejected() {
        let mut config = Config::default();
        config.server.cert = Some("SGVsbG8gV29ybGQ=".to_string());
        assert!(validate_specific_rules(&config).is_err());

        config.server.key = Some("SGVsbG8gV29ybGQ=".to_string());
        assert!(validate_specific_rules(&config).is_ok());

        config.server.key = Some("not base64!".to_string());
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_port_and_address_rules() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.server.address = "not an address".to_string();
        assert!(validate_specific_rules(&config).is_err());

        assert!(is_valid_ip_address("::1"));
        assert!(is_valid_ip_address("0.0.0.0"));
        assert!(is_valid_ip_address("localhost"));
        assert!(!is_valid_ip_address("example.com"));
    }

    #[test]
    fn test_durations_must_be_positive() {
        let mut config = Config::default();
        config.keys.expired_key_age = 0;
        assert!(validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.token.lifetime = -5;
        assert!(validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.keys.valid_key_lifetime = MAX_DURATION_SECS;
        assert!(validate_specific_rules(&config).is_ok());
        config.keys.valid_key_lifetime = MAX_DURATION_SECS + 1;
        assert!(validate_specific_rules(&config).is_err());
    }
}
