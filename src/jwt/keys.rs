// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # JSON Web Key Set
//!
//! Projection of key records into the public JWKS document (RFC 7517) served
//! to token verifiers. Only the public half of each key is exposed: the RSA
//! modulus `n` and exponent `e`, as unsigned big-endian integers encoded with
//! the URL-safe base64 alphabet and no padding (RFC 7518 §6.3.1).
//!
//! The key set is rebuilt on every request; nothing here is cached.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};

use super::store::KeyRecord;

/// A single RSA public key entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, always `RSA`
    pub kty: String,
    /// Public key use, always `sig`
    #[serde(rename = "use")]
    pub key_use: String,
    /// Signing algorithm, always `RS256`
    pub alg: String,
    /// Key identifier matched against the token header
    pub kid: String,
    /// Base64url modulus
    pub n: String,
    /// Base64url public exponent
    pub e: String,
}

impl Jwk {
    /// Build the entry for `public_key` published under `kid`
    pub fn from_public_key(kid: &str, public_key: &RsaPublicKey) -> Self {
        Self {
            kty: "RSA".to_string(),
            key_use: "sig".to_string(),
            alg: "RS256".to_string(),
            kid: kid.to_string(),
            n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }
    }

    /// Entry for the public half of a key record
    pub fn from_record(record: &KeyRecord) -> Self {
        Self::from_public_key(record.kid(), &record.public_key())
    }

    /// Rebuild the RSA public key from `n` and `e`
    pub fn to_public_key(&self) -> Result<RsaPublicKey> {
        let n = URL_SAFE_NO_PAD
            .decode(&self.n)
            .context("JWK modulus is not valid base64url")?;
        let e = URL_SAFE_NO_PAD
            .decode(&self.e)
            .context("JWK exponent is not valid base64url")?;

        RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
            .context("JWK does not describe a valid RSA public key")
    }

    /// Verification key for `jsonwebtoken`
    pub fn decoding_key(&self) -> Result<DecodingKey> {
        DecodingKey::from_rsa_components(&self.n, &self.e)
            .context("Failed to build decoding key from JWK")
    }
}

/// The published key set envelope, `{"keys": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkKeySet {
    pub keys: Vec<Jwk>,
}

impl JwkKeySet {
    /// Project records into a key set, keeping their order
    ///
    /// No filtering happens here: pass only the records that should be published.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a KeyRecord>,
    {
        Self {
            keys: records.into_iter().map(Jwk::from_record).collect(),
        }
    }

    /// Find the entry published under `kid`
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::store::tests::{record, TEST_KEY};
    use chrono::{Duration, Utc};
    use rsa::RsaPrivateKey;

    fn is_base64url(value: &str) -> bool {
        !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn test_jwk_fixed_fields() {
        let key = record("kid-1", Utc::now());
        let jwk = Jwk::from_record(&key);

        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.key_use, "sig");
        assert_eq!(jwk.alg, "RS256");
        assert_eq!(jwk.kid, "kid-1");
        assert!(is_base64url(&jwk.n));
        // 65537 = 0x01 0x00 0x01
        assert_eq!(jwk.e, "AQAB");
    }

    #[test]
    fn test_modulus_is_unsigned_big_endian() {
        let public_key = TEST_KEY.to_public_key();
        let jwk = Jwk::from_public_key("k", &public_key);

        let bytes = URL_SAFE_NO_PAD.decode(&jwk.n).unwrap();
        assert_eq!(bytes.len(), 256);
        assert_ne!(bytes[0], 0);
        assert_eq!(bytes, public_key.n().to_bytes_be());
    }

    #[test]
    fn test_encoding_is_reproducible() {
        let public_key = TEST_KEY.to_public_key();
        assert_eq!(
            Jwk::from_public_key("k", &public_key),
            Jwk::from_public_key("k", &public_key)
        );
    }

    #[test]
    fn test_public_key_round_trip() {
        let public_key = TEST_KEY.to_public_key();
        let jwk = Jwk::from_public_key("k", &public_key);
        assert_eq!(jwk.to_public_key().unwrap(), public_key);
    }

    #[test]
    fn test_key_set_preserves_order_without_filtering() {
        let now = Utc::now();
        let records = vec![
            record("b", now - Duration::hours(1)),
            record("a", now + Duration::hours(1)),
        ];

        let set = JwkKeySet::from_records(&records);
        let kids: Vec<&str> = set.keys.iter().map(|k| k.kid.as_str()).collect();
        assert_eq!(kids, vec!["b", "a"]);
        assert!(set.find("a").is_some());
        assert!(set.find("missing").is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let set = JwkKeySet::from_records([&record("kid-json", Utc::now())]);
        let value = serde_json::to_value(&set).unwrap();

        let entry = &value["keys"][0];
        assert_eq!(entry["kty"], "RSA");
        assert_eq!(entry["use"], "sig");
        assert_eq!(entry["alg"], "RS256");
        assert_eq!(entry["kid"], "kid-json");
        assert_eq!(entry.as_object().unwrap().len(), 6);

        let text = serde_json::to_string(&set).unwrap();
        assert!(!text.contains('+'));
        assert!(!text.contains('='));
    }

    #[test]
    fn test_different_keys_give_different_entries() {
        let other = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, 2048).unwrap();
        let a = Jwk::from_public_key("k", &TEST_KEY.to_public_key());
        let b = Jwk::from_public_key("k", &other.to_public_key());
        assert_ne!(a.n, b.n);
    }
}
