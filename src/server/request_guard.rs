// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Request guards

use std::convert::Infallible;

use rocket::request::{FromRequest, Outcome};
use rocket::Request;

use crate::jwt::TokenMode;

/// Name of the query parameter selecting expired tokens
pub const EXPIRED_QUERY_PARAM: &str = "expired";

/// Token mode requested by the client
///
/// The mere presence of `?expired` selects [`TokenMode::Expired`], whatever its
/// value (`?expired`, `?expired=true` and `?expired=false` all count).
#[rocket::async_trait]
impl<'r> FromRequest<'r> for TokenMode {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Any value, even one failing to parse, still means the parameter is present
        let expired = req.query_value::<&str>(EXPIRED_QUERY_PARAM).is_some();
        Outcome::Success(TokenMode::from_expired_flag(expired))
    }
}

/// Scheme and authority the client used to reach the server
///
/// Used to build absolute URLs in the discovery document.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub scheme: &'static str,
    pub host: String,
    pub base_url: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ConnectionInfo {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = req.rocket().config();
        let scheme = if config.tls_enabled() { "https" } else { "http" };
        let host = match req.host() {
            Some(host) => host.to_string(),
            None => format!("{}:{}", config.address, config.port),
        };
        let base_url = format!("{}://{}", scheme, host);

        Outcome::Success(ConnectionInfo {
            scheme,
            host,
            base_url,
        })
    }
}
