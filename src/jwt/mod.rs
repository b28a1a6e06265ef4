// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JWT key management and token issuance
//!
//! This module holds the key store, the JWKS projection of its public keys and
//! the issuer signing RS256 tokens against it.

mod claims;
mod error;
mod issuer;
mod keys;
mod store;

// Re-export public API
pub use claims::{JwtClaims, DEFAULT_ISSUER, DEFAULT_SUBJECT};
pub use error::{IssueError, KeyStoreError};
pub use issuer::{IssuedToken, TokenIssuer, TokenMode, DEFAULT_TOKEN_LIFETIME_SECS};
pub use keys::{Jwk, JwkKeySet};
pub use store::{
    KeyRecord, KeyRing, KeyRingGuard, KeyStore, StoreConfig, KEY_ID_BYTES, RSA_KEY_BITS,
};
