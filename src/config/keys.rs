// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Signing key configuration
//!
//! Both keys are generated at startup; these settings only place their
//! expiry relative to the startup instant.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::jwt::StoreConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// How long ago the expired key expired, in seconds. Default is one hour.
    #[serde(default = "default_expired_key_age")]
    pub expired_key_age: i64,

    /// How long the valid key stays active after startup, in seconds.
    /// Default is 24 hours.
    #[serde(default = "default_valid_key_lifetime")]
    pub valid_key_lifetime: i64,
}

fn default_expired_key_age() -> i64 {
    3600
}

fn default_valid_key_lifetime() -> i64 {
    86400
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            expired_key_age: default_expired_key_age(),
            valid_key_lifetime: default_valid_key_lifetime(),
        }
    }
}

impl KeysConfig {
    /// Key store settings for a server started at `now`
    ///
    /// Fails if either expiry falls outside the representable date range.
    pub fn store_config(&self, now: DateTime<Utc>) -> Result<StoreConfig> {
        let expired_at = Duration::try_seconds(self.expired_key_age)
            .and_then(|age| now.checked_sub_signed(age))
            .with_context(|| {
                format!("keys.expired_key_age is out of range: {}", self.expired_key_age)
            })?;
        let valid_at = Duration::try_seconds(self.valid_key_lifetime)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .with_context(|| {
                format!(
                    "keys.valid_key_lifetime is out of range: {}",
                    self.valid_key_lifetime
                )
            })?;

        Ok(StoreConfig::new()
            .expired_key_expiry(expired_at)
            .valid_key_expiry(valid_at))
    }
}
