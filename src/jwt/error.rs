// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error types for key management and token issuance

use thiserror::Error;

use super::issuer::TokenMode;

/// Errors raised while building the key store
///
/// All of them are fatal at startup: the server refuses to run without
/// both of its keys.
#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("Expiry timestamp for the {which} key must be set")]
    MissingExpiry { which: &'static str },

    #[error("Failed to read from the OS randomness source: {0}")]
    Randomness(#[from] rsa::rand_core::Error),

    #[error("Failed to generate RSA key pair: {0}")]
    KeyGeneration(#[from] rsa::Error),
}

/// Errors raised while issuing a token for a single request
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("No {mode} key available")]
    NoMatchingKey { mode: TokenMode },

    #[error("Token expiry is out of the representable range")]
    ExpiryOutOfRange,

    #[error("Failed to encode RSA private key: {0}")]
    KeyEncoding(#[from] rsa::pkcs1::Error),

    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}
