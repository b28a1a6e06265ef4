// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Web server exposing the key set and the token endpoint
//!
//! ## Architecture
//!
//! - **Key set endpoints**: `GET /jwks`, `/jwks.json`, `/.well-known/jwks.json`
//! - **Token endpoint**: `POST /auth`, `POST /auth?expired`
//! - **Discovery**: `GET /.well-known/openid-configuration`
//! - **Method guards**: 405 for any other method on the key set and token paths
//! - **CORS Support**: permissive headers on every response
//!
//! The key store is built before the server and handed to [`build_rocket`];
//! handlers only read from it.

pub mod builder;
pub mod cors;
pub mod handlers;
pub mod method_guard;
pub mod request_guard;

pub use self::builder::{build_rocket, rocket_figment};
pub use self::handlers::{OpenIdConfiguration, AUTH_PATH, JWKS_PATHS};
