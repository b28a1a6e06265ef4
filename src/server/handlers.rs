// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Route handlers
//!
//! - `GET /jwks`, `GET /jwks.json`, `GET /.well-known/jwks.json`: active public keys
//! - `POST /auth[?expired]`: a signed token, as plain text
//! - `GET /.well-known/openid-configuration`: discovery document

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use rocket::http::{ContentType, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde::{Deserialize, Serialize};

use super::request_guard::ConnectionInfo;
use crate::jwt::{IssueError, JwkKeySet, KeyStore, TokenIssuer, TokenMode};

/// Paths serving the key set
pub const JWKS_PATHS: [&str; 3] = ["/jwks", "/jwks.json", "/.well-known/jwks.json"];

/// Path issuing tokens
pub const AUTH_PATH: &str = "/auth";

/// Key set of the keys active right now
fn active_key_set(store: &KeyStore) -> JwkKeySet {
    let now = Utc::now();
    let ring = store.read();
    let key_set = JwkKeySet::from_records(ring.active_keys(now));
    debug!(
        "Publishing {} active key(s) out of {}",
        key_set.keys.len(),
        ring.records().len()
    );
    key_set
}

/// JSON Web Key Set (JWKS) endpoint
///
/// Exposes the public half of every non-expired key so clients can verify
/// tokens issued by [`auth`]. The expired key is never published.
///
/// # URL
///
/// `GET /jwks`
#[get("/jwks")]
pub async fn jwks(store: &State<Arc<KeyStore>>) -> Json<JwkKeySet> {
    Json(active_key_set(store))
}

/// Same as [`jwks`], under `/jwks.json`
#[get("/jwks.json")]
pub async fn jwks_json(store: &State<Arc<KeyStore>>) -> Json<JwkKeySet> {
    Json(active_key_set(store))
}

/// Same as [`jwks`], under the well-known location
#[get("/.well-known/jwks.json")]
pub async fn well_known_jwks(store: &State<Arc<KeyStore>>) -> Json<JwkKeySet> {
    Json(active_key_set(store))
}

/// Token endpoint
///
/// Returns an RS256 token signed with the current key, or, when the `expired`
/// query parameter is present, a token signed with the expired key whose `exp`
/// is that key's expiry.
///
/// # URL
///
/// `POST /auth` or `POST /auth?expired`
///
/// # Returns
///
/// * `200` with the compact token as `text/plain`
/// * `500` when no key matches the requested mode or signing fails
#[post("/auth")]
pub async fn auth(
    mode: TokenMode,
    store: &State<Arc<KeyStore>>,
    issuer: &State<TokenIssuer>,
) -> Result<(ContentType, String), Custom<String>> {
    let store: &KeyStore = store.inner();

    match issuer.issue(store, Utc::now(), mode) {
        Ok(issued) => {
            info!(
                "Issued {} token signed by key {} (exp {})",
                mode, issued.kid, issued.claims.exp
            );
            Ok((ContentType::Plain, issued.token))
        }
        Err(err @ IssueError::NoMatchingKey { .. }) => {
            warn!("Cannot issue token: {}", err);
            Err(Custom(Status::InternalServerError, err.to_string()))
        }
        Err(err) => {
            error!("Token signing failed: {}", err);
            Err(Custom(
                Status::InternalServerError,
                "failed to sign token".to_string(),
            ))
        }
    }
}

/// OpenID Connect Discovery document
///
/// Only the fields meaningful for this server are included.
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenIdConfiguration {
    /// Issuer identifier, equal to the `iss` claim of issued tokens
    pub issuer: String,

    /// URL of the key set
    pub jwks_uri: String,

    /// URL of the token endpoint
    pub token_endpoint: String,

    pub response_types_supported: Vec<String>,

    pub subject_types_supported: Vec<String>,

    /// Always `["RS256"]`
    pub id_token_signing_alg_values_supported: Vec<String>,

    pub claims_supported: Vec<String>,
}

impl OpenIdConfiguration {
    pub fn new(base_url: &str, issuer: &str) -> Self {
        Self {
            issuer: issuer.to_string(),
            jwks_uri: format!("{}/.well-known/jwks.json", base_url),
            token_endpoint: format!("{}{}", base_url, AUTH_PATH),
            response_types_supported: vec!["token".to_string()],
            subject_types_supported: vec!["public".to_string()],
            id_token_signing_alg_values_supported: vec!["RS256".to_string()],
            claims_supported: ["sub", "iss", "iat", "exp"]
                .iter()
                .map(|claim| claim.to_string())
                .collect(),
        }
    }
}

/// OpenID Connect discovery endpoint
///
/// # URL
///
/// `GET /.well-known/openid-configuration`
#[get("/.well-known/openid-configuration")]
pub async fn openid_configuration(
    issuer: &State<TokenIssuer>,
    connection: ConnectionInfo,
) -> Json<OpenIdConfiguration> {
    debug!("Base URL for OpenID configuration: {}", connection.base_url);
    Json(OpenIdConfiguration::new(&connection.base_url, issuer.issuer()))
}
