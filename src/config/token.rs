// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Issued token configuration

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::jwt::{TokenIssuer, DEFAULT_ISSUER, DEFAULT_SUBJECT, DEFAULT_TOKEN_LIFETIME_SECS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// `sub` claim of every token. Default is "fake-user".
    #[serde(default = "default_subject")]
    pub subject: String,

    /// `iss` claim of every token. Default is "jwks-server".
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Lifetime of normal tokens, in seconds. Default is 300.
    #[serde(default = "default_lifetime")]
    pub lifetime: i64,
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_lifetime() -> i64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            issuer: default_issuer(),
            lifetime: default_lifetime(),
        }
    }
}

impl TokenConfig {
    /// Token issuer carrying these claims and lifetime
    pub fn issuer(&self) -> Result<TokenIssuer> {
        let lifetime = Duration::try_seconds(self.lifetime)
            .with_context(|| format!("token.lifetime is out of range: {}", self.lifetime))?;

        Ok(TokenIssuer::new()
            .with_subject(&self.subject)
            .with_issuer(&self.issuer)
            .valid_for(lifetime))
    }
}
