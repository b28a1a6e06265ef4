// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JWT issuer
//!
//! Selects a key from the [`KeyStore`] and signs a token with fixed claims.
//! Two modes exist: normal tokens are signed with the current signing key and
//! expire a few minutes after issuance, expired tokens are signed with the
//! expired key and carry that key's own expiry.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;

use super::claims::{JwtClaims, DEFAULT_ISSUER, DEFAULT_SUBJECT};
use super::error::IssueError;
use super::store::KeyStore;

/// Lifetime of a normal token
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 300;

/// Which key a token is signed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenMode {
    /// Newest active key, token valid for the issuer lifetime
    #[default]
    Current,
    /// Expired key, token already expired
    Expired,
}

impl TokenMode {
    pub fn from_expired_flag(expired: bool) -> Self {
        if expired {
            TokenMode::Expired
        } else {
            TokenMode::Current
        }
    }
}

impl fmt::Display for TokenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenMode::Current => write!(f, "active"),
            TokenMode::Expired => write!(f, "expired"),
        }
    }
}

/// A signed token with the key identifier and claims it was built from
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWS serialization
    pub token: String,
    /// Identifier of the signing key, also present in the token header
    pub kid: String,
    pub claims: JwtClaims,
}

/// Issues RS256 tokens against a key store
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    subject: String,
    issuer: String,
    token_duration: Duration,
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            issuer: DEFAULT_ISSUER.to_string(),
            token_duration: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }
}

impl TokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the subject claim of every token
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the issuer claim of every token
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set the validity duration of normal tokens
    pub fn valid_for(mut self, duration: Duration) -> Self {
        self.token_duration = duration;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign a token for `mode` at instant `now`
    ///
    /// The store's read guard is held only for the duration of the signature.
    ///
    /// # Errors
    ///
    /// * [`IssueError::NoMatchingKey`] if the store has no key for `mode`
    /// * [`IssueError::ExpiryOutOfRange`] if `now` plus the token lifetime overflows
    /// * [`IssueError::KeyEncoding`] / [`IssueError::Signing`] if signing fails
    pub fn issue(
        &self,
        store: &KeyStore,
        now: DateTime<Utc>,
        mode: TokenMode,
    ) -> Result<IssuedToken, IssueError> {
        let ring = store.read();
        let key = match mode {
            TokenMode::Current => ring.current_signing_key(now),
            TokenMode::Expired => ring.expired_key(now),
        }
        .ok_or(IssueError::NoMatchingKey { mode })?;

        let expires_at = match mode {
            TokenMode::Current => now
                .checked_add_signed(self.token_duration)
                .ok_or(IssueError::ExpiryOutOfRange)?,
            TokenMode::Expired => key.expires_at(),
        };
        let claims = JwtClaims::new(&self.subject, &self.issuer, now, expires_at);

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(key.kid().to_string());

        let der = key.private_key().to_pkcs1_der()?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());
        let token = jsonwebtoken::encode(&header, &claims, &encoding_key)?;

        Ok(IssuedToken {
            token,
            kid: key.kid().to_string(),
            claims,
        })
    }
}
