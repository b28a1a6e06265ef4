// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JWT claims carried by issued tokens

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Default subject of every issued token
pub const DEFAULT_SUBJECT: &str = "fake-user";

/// Default issuer of every issued token
pub const DEFAULT_ISSUER: &str = "jwks-server";

/// Claims of an issued token
///
/// The set of fields is fixed; no caller-supplied payload is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user identifier)
    pub sub: String,
    /// Issuer (service name)
    pub iss: String,
    /// Issued at (seconds since the Unix epoch)
    pub iat: i64,
    /// Expiration time (seconds since the Unix epoch)
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject.into(),
            iss: issuer.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Expiry as a UTC timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Whether the token is past its expiry at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_serialize_as_seconds() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = JwtClaims::new(
            DEFAULT_SUBJECT,
            DEFAULT_ISSUER,
            now,
            now + Duration::minutes(5),
        );

        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "sub": "fake-user",
                "iss": "jwks-server",
                "iat": 1_700_000_000,
                "exp": 1_700_000_300,
            })
        );
        assert_eq!(claims.expires_at(), Some(now + Duration::minutes(5)));
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let past = JwtClaims::new("s", "i", now, now - Duration::hours(1));
        let future = JwtClaims::new("s", "i", now, now + Duration::hours(1));
        assert!(past.is_expired(now));
        assert!(!future.is_expired(now));
    }
}
