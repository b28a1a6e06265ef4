// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Key Store
//!
//! This module owns the RSA key pairs used to sign tokens and decides which of
//! them are published and which one signs a given token.
//!
//! The store is built once at startup with exactly two records:
//!
//! * one key whose expiry is already in the past (used to issue expired tokens)
//! * one key whose expiry is in the future (used for normal tokens)
//!
//! Records are never added, removed or renewed afterwards. Every query is a pure
//! function of the store contents and the instant passed in, and runs under the
//! read side of a [`RwLock`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::{Duration, Utc};
//! use jwks_server::jwt::{KeyStore, StoreConfig};
//!
//! let now = Utc::now();
//! let store = KeyStore::new(
//!     StoreConfig::new()
//!         .expired_key_expiry(now - Duration::hours(1))
//!         .valid_key_expiry(now + Duration::hours(24)),
//! )
//! .unwrap();
//!
//! let keys = store.read();
//! assert_eq!(keys.active_keys(now).len(), 1);
//! ```

use std::ops::Deref;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use chrono::{DateTime, TimeZone, Utc};
use rsa::rand_core::{OsRng, RngCore};
use rsa::{RsaPrivateKey, RsaPublicKey};

use super::error::KeyStoreError;

/// RSA modulus size for generated keys
pub const RSA_KEY_BITS: usize = 2048;

/// Number of random bytes behind each key identifier
pub const KEY_ID_BYTES: usize = 16;

/// A single signing key with its identifier and fixed expiry
///
/// Records are owned by the [`KeyStore`] and only lent out; they cannot be
/// copied out of it.
///
/// ```compile_fail
/// use jwks_server::jwt::KeyRecord;
///
/// fn copy(record: &KeyRecord) -> KeyRecord {
///     record.clone()
/// }
/// ```
pub struct KeyRecord {
    kid: String,
    expires_at: DateTime<Utc>,
    private_key: RsaPrivateKey,
}

/// Hides the private key material from logs
impl std::fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRecord")
            .field("kid", &self.kid)
            .field("expires_at", &self.expires_at)
            .field("private_key", &"<RsaPrivateKey>")
            .finish()
    }
}

impl KeyRecord {
    /// Build a record from existing key material
    pub fn new<Tz: TimeZone>(
        kid: impl Into<String>,
        expires_at: DateTime<Tz>,
        private_key: RsaPrivateKey,
    ) -> Self {
        Self {
            kid: kid.into(),
            expires_at: expires_at.with_timezone(&Utc),
            private_key,
        }
    }

    /// Generate a fresh 2048-bit key pair with a random identifier
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Randomness`] if the OS randomness source fails
    /// and [`KeyStoreError::KeyGeneration`] if the RSA key cannot be built.
    pub fn generate<Tz: TimeZone>(expires_at: DateTime<Tz>) -> Result<Self, KeyStoreError> {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)?;
        let kid = random_kid(&mut rng)?;
        Ok(Self::new(kid, expires_at, private_key))
    }

    /// Key identifier published as `kid`
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Instant after which the key is no longer active
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Private half, borrowed for signing
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Public half derived from the private key
    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }

    /// A key is expired once `at` reaches its expiry
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at <= at
    }
}

fn random_kid(rng: &mut impl RngCore) -> Result<String, KeyStoreError> {
    let mut bytes = [0u8; KEY_ID_BYTES];
    rng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Expiry settings for the two keys created at startup
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Expiry of the deliberately expired key
    pub expired_key_expiry: Option<DateTime<Utc>>,
    /// Expiry of the valid signing key
    pub valid_key_expiry: Option<DateTime<Utc>>,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expiry of the expired key, normalized to UTC
    pub fn expired_key_expiry<Tz: TimeZone>(mut self, at: DateTime<Tz>) -> Self {
        self.expired_key_expiry = Some(at.with_timezone(&Utc));
        self
    }

    /// Sets the expiry of the valid key, normalized to UTC
    pub fn valid_key_expiry<Tz: TimeZone>(mut self, at: DateTime<Tz>) -> Self {
        self.valid_key_expiry = Some(at.with_timezone(&Utc));
        self
    }
}

/// The ordered set of key records and the selection queries over it
#[derive(Debug)]
pub struct KeyRing {
    records: Vec<KeyRecord>,
}

impl KeyRing {
    /// All records in insertion order
    pub fn records(&self) -> &[KeyRecord] {
        &self.records
    }

    /// Records still active at `now`, in insertion order
    pub fn active_keys(&self, now: DateTime<Utc>) -> Vec<&KeyRecord> {
        self.records.iter().filter(|k| !k.is_expired(now)).collect()
    }

    /// First record, in insertion order, already expired at `now`
    pub fn expired_key(&self, now: DateTime<Utc>) -> Option<&KeyRecord> {
        self.records.iter().find(|k| k.is_expired(now))
    }

    /// Active record with the latest expiry
    ///
    /// A later record only replaces the current best when its expiry is
    /// strictly later, so the first of several equal expiries wins.
    pub fn current_signing_key(&self, now: DateTime<Utc>) -> Option<&KeyRecord> {
        let mut best: Option<&KeyRecord> = None;
        for key in self.records.iter().filter(|k| !k.is_expired(now)) {
            match best {
                Some(current) if key.expires_at <= current.expires_at => {}
                _ => best = Some(key),
            }
        }
        best
    }

    /// Look up a record by identifier
    pub fn get(&self, kid: &str) -> Option<&KeyRecord> {
        self.records.iter().find(|k| k.kid == kid)
    }
}

/// Shared, read-mostly key store
///
/// Wraps the [`KeyRing`] in a reader/writer lock. Nothing writes to it after
/// construction, so readers never wait on each other.
#[derive(Debug)]
pub struct KeyStore {
    ring: RwLock<KeyRing>,
}

impl KeyStore {
    /// Generate the expired and the valid key, in that order
    ///
    /// # Errors
    ///
    /// * [`KeyStoreError::MissingExpiry`] if either expiry is unset or at the Unix epoch
    /// * [`KeyStoreError::Randomness`] / [`KeyStoreError::KeyGeneration`] if key
    ///   material cannot be produced
    pub fn new(config: StoreConfig) -> Result<Self, KeyStoreError> {
        let expired_at = require_expiry(config.expired_key_expiry, "expired")?;
        let valid_at = require_expiry(config.valid_key_expiry, "valid")?;

        let expired_key = KeyRecord::generate(expired_at)?;
        let valid_key = KeyRecord::generate(valid_at)?;

        Ok(Self::from_records(vec![expired_key, valid_key]))
    }

    /// Build a store around already generated records
    pub fn from_records(records: Vec<KeyRecord>) -> Self {
        Self {
            ring: RwLock::new(KeyRing { records }),
        }
    }

    /// Acquire a read guard over the key ring
    ///
    /// The ring is never mutated, so a poisoned lock still holds valid data.
    pub fn read(&self) -> KeyRingGuard<'_> {
        KeyRingGuard(self.ring.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn require_expiry(
    at: Option<DateTime<Utc>>,
    which: &'static str,
) -> Result<DateTime<Utc>, KeyStoreError> {
    match at {
        Some(at) if at != DateTime::UNIX_EPOCH => Ok(at),
        _ => Err(KeyStoreError::MissingExpiry { which }),
    }
}

/// Read access to the key ring; records borrowed from it live as long as the guard
pub struct KeyRingGuard<'a>(RwLockReadGuard<'a, KeyRing>);

impl Deref for KeyRingGuard<'_> {
    type Target = KeyRing;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};
    use std::sync::LazyLock;

    /// One key pair shared by every record built in these tests
    pub(crate) static TEST_KEY: LazyLock<RsaPrivateKey> = LazyLock::new(|| {
        RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS).expect("Failed to generate RSA key")
    });

    pub(crate) fn record(kid: &str, expires_at: DateTime<Utc>) -> KeyRecord {
        KeyRecord::new(kid, expires_at, TEST_KEY.clone())
    }

    fn kids(keys: &[&KeyRecord]) -> Vec<String> {
        keys.iter().map(|k| k.kid().to_string()).collect()
    }

    #[test]
    fn test_store_with_expired_and_valid_key() {
        let now = Utc::now();
        let store = KeyStore::new(
            StoreConfig::new()
                .expired_key_expiry(now - Duration::hours(1))
                .valid_key_expiry(now + Duration::hours(24)),
        )
        .expect("Failed to create key store");

        let ring = store.read();
        assert_eq!(ring.records().len(), 2);
        let expired = &ring.records()[0];
        let valid = &ring.records()[1];

        let active = ring.active_keys(now);
        assert_eq!(kids(&active), vec![valid.kid().to_string()]);
        assert_eq!(ring.expired_key(now).map(KeyRecord::kid), Some(expired.kid()));
        assert_eq!(
            ring.current_signing_key(now).map(KeyRecord::kid),
            Some(valid.kid())
        );
    }

    #[test]
    fn test_generated_kids_are_distinct_hex() {
        let now = Utc::now();
        let store = KeyStore::new(
            StoreConfig::new()
                .expired_key_expiry(now - Duration::minutes(1))
                .valid_key_expiry(now + Duration::minutes(1)),
        )
        .unwrap();

        let ring = store.read();
        for key in ring.records() {
            assert_eq!(key.kid().len(), KEY_ID_BYTES * 2);
            assert!(key.kid().chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_ne!(ring.records()[0].kid(), ring.records()[1].kid());
    }

    #[test]
    fn test_missing_expiry_is_rejected() {
        let now = Utc::now();

        let err = KeyStore::new(StoreConfig::new().valid_key_expiry(now)).unwrap_err();
        assert!(matches!(err, KeyStoreError::MissingExpiry { which: "expired" }));

        let err = KeyStore::new(StoreConfig::new().expired_key_expiry(now)).unwrap_err();
        assert!(matches!(err, KeyStoreError::MissingExpiry { which: "valid" }));

        let err = KeyStore::new(
            StoreConfig::new()
                .expired_key_expiry(now)
                .valid_key_expiry(DateTime::<Utc>::UNIX_EPOCH),
        )
        .unwrap_err();
        assert!(matches!(err, KeyStoreError::MissingExpiry { .. }));
    }

    #[test]
    fn test_expiry_is_normalized_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = Utc::now().with_timezone(&offset);
        let config = StoreConfig::new().valid_key_expiry(local);
        assert_eq!(config.valid_key_expiry, Some(local.with_timezone(&Utc)));

        let key = KeyRecord::new("k", local, TEST_KEY.clone());
        assert_eq!(key.expires_at(), local.with_timezone(&Utc));
        assert_eq!(key.expires_at().timestamp(), local.timestamp());
    }

    #[test]
    fn test_expiry_boundary_counts_as_expired() {
        let now = Utc::now();
        let store = KeyStore::from_records(vec![record("edge", now)]);
        let ring = store.read();

        assert!(ring.active_keys(now).is_empty());
        assert_eq!(ring.expired_key(now).map(KeyRecord::kid), Some("edge"));
        assert!(ring.current_signing_key(now).is_none());

        let just_before = now - Duration::milliseconds(1);
        assert_eq!(ring.active_keys(just_before).len(), 1);
        assert!(ring.expired_key(just_before).is_none());
    }

    #[test]
    fn test_current_signing_key_prefers_latest_expiry() {
        let now = Utc::now();
        let store = KeyStore::from_records(vec![
            record("soon", now + Duration::minutes(5)),
            record("old", now - Duration::hours(2)),
            record("late", now + Duration::hours(48)),
            record("mid", now + Duration::hours(1)),
        ]);
        let ring = store.read();

        assert_eq!(ring.current_signing_key(now).map(KeyRecord::kid), Some("late"));
        assert_eq!(kids(&ring.active_keys(now)), vec!["soon", "late", "mid"]);
    }

    #[test]
    fn test_current_signing_key_tie_keeps_first() {
        let now = Utc::now();
        let expiry = now + Duration::hours(3);
        let store = KeyStore::from_records(vec![
            record("first", expiry),
            record("second", expiry),
        ]);

        assert_eq!(
            store.read().current_signing_key(now).map(KeyRecord::kid),
            Some("first")
        );
    }

    #[test]
    fn test_expired_key_returns_first_expired() {
        let now = Utc::now();
        let store = KeyStore::from_records(vec![
            record("valid", now + Duration::hours(1)),
            record("older", now - Duration::hours(5)),
            record("newer", now - Duration::hours(1)),
        ]);

        assert_eq!(store.read().expired_key(now).map(KeyRecord::kid), Some("older"));
    }

    #[test]
    fn test_queries_without_matching_keys() {
        let now = Utc::now();
        let only_valid = KeyStore::from_records(vec![record("v", now + Duration::hours(1))]);
        assert!(only_valid.read().expired_key(now).is_none());

        let only_expired = KeyStore::from_records(vec![record("e", now - Duration::hours(1))]);
        assert!(only_expired.read().current_signing_key(now).is_none());
        assert!(only_expired.read().active_keys(now).is_empty());

        let empty = KeyStore::from_records(Vec::new());
        assert!(empty.is_empty());
        assert!(empty.read().expired_key(now).is_none());
        assert!(empty.read().current_signing_key(now).is_none());
    }

    #[test]
    fn test_debug_hides_private_key() {
        let key = record("debug-me", Utc::now());
        let printed = format!("{:?}", key);
        assert!(printed.contains("debug-me"));
        assert!(printed.contains("<RsaPrivateKey>"));
    }
}
