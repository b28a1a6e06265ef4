// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JWKS test server library
//!
//! Generates RSA signing keys at startup, publishes the public half of the
//! active ones as a JSON Web Key Set and issues RS256 tokens on demand,
//! including deliberately expired ones, for exercising JWT verifiers.
//!
//! - [`jwt`]: key store, key set encoding and token issuing
//! - [`server`]: Rocket routes exposing them over HTTP
//! - [`config`]: YAML configuration with schema validation

pub mod config;
pub mod jwt;
pub mod server;
