// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rocket server builder and configuration
//!
//! This module provides functions to build and configure the Rocket server
//! instance with all necessary routes, fairings, and state management.

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use log::{debug, info};
use rocket::config::LogLevel;
use rocket::figment::Figment;
use rocket::http::Method;
use rocket::{routes, Build, Rocket};

use super::cors::CORS;
use super::handlers::*;
use super::method_guard::method_not_allowed_routes;
use crate::config::Config;
use crate::jwt::{KeyStore, TokenIssuer};

/// Build a configured Rocket server instance
///
/// The key store and the issuer are injected as managed state; the server
/// never creates keys itself.
///
/// ### Parameters
///
/// * `figment` - The Rocket configuration figment containing server settings
/// * `store` - The key store shared by every request
/// * `issuer` - The token issuer used by `POST /auth`
///
/// ### Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chrono::{Duration, Utc};
/// use jwks_server::jwt::{KeyStore, StoreConfig, TokenIssuer};
/// use jwks_server::server;
///
/// # async fn example() {
/// let now = Utc::now();
/// let store = KeyStore::new(
///     StoreConfig::new()
///         .expired_key_expiry(now - Duration::hours(1))
///         .valid_key_expiry(now + Duration::hours(24)),
/// )
/// .unwrap();
/// let rocket = server::build_rocket(
///     rocket::Config::figment(),
///     Arc::new(store),
///     TokenIssuer::new(),
/// );
/// rocket.launch().await.expect("Failed to launch");
/// # }
/// ```
pub fn build_rocket(figment: Figment, store: Arc<KeyStore>, issuer: TokenIssuer) -> Rocket<Build> {
    debug!("Building server with {} key(s)", store.len());

    let mut rocket_builder = rocket::custom(figment).attach(CORS).mount(
        "/",
        routes![
            jwks,
            jwks_json,
            well_known_jwks,
            auth,
            openid_configuration,
        ],
    );

    for path in JWKS_PATHS {
        rocket_builder = rocket_builder.mount("/", method_not_allowed_routes(path, Method::Get));
    }

    rocket_builder
        .mount("/", method_not_allowed_routes(AUTH_PATH, Method::Post))
        .manage(store)
        .manage(issuer)
}

/// Rocket configuration built from the application configuration
///
/// TLS is enabled when both a certificate and a key are configured; they are
/// decoded and written to the temporary directory for Rocket to load.
pub fn rocket_figment(config: &Config, log_level: LogLevel) -> Result<Figment> {
    let mut figment = rocket::Config::figment()
        .merge(("ident", config.server.name.clone()))
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port))
        .merge(("log_level", log_level));

    if let (Some(cert), Some(key)) = (&config.server.cert, &config.server.key) {
        debug!("SSL certificates found in configuration, enabling TLS");

        let cert_data = base64::engine::general_purpose::STANDARD
            .decode(cert)
            .context("SSL certificate is not valid base64")?;
        let key_data = base64::engine::general_purpose::STANDARD
            .decode(key)
            .context("SSL key is not valid base64")?;

        let temp_dir = std::env::temp_dir();
        let cert_path = temp_dir.join("jwks-server.crt");
        let key_path = temp_dir.join("jwks-server.key");

        std::fs::write(&cert_path, cert_data)
            .with_context(|| format!("Failed to write certificate to {:?}", cert_path))?;
        std::fs::write(&key_path, key_data)
            .with_context(|| format!("Failed to write key to {:?}", key_path))?;

        figment = figment
            .merge(("tls.certs", cert_path))
            .merge(("tls.key", key_path));

        info!("TLS enabled for web server");
    }

    Ok(figment)
}
