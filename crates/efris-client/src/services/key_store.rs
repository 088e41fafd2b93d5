// ============================================
// File: crates/efris-client/src/services/key_store.rs
// ============================================
//! # Session Key Store
//!
//! ## Creation Reason
//! Keeps the current session key per tenant and regenerates it through the
//! key exchange when it is missing or expired.
//!
//! ## Main Functionality
//! - `get()`: current key, regenerated on demand
//! - `set()` / `set_hex()`: overwrite a slot with a new expiry
//! - `invalidate()`, `is_present()`
//! - `refresh()`: unconditional handshake (daily trigger)
//!
//! ## Slot Lifecycle
//! ```text
//!   (empty) ──get()──► handshake ──► Cached{hex, expires_at}
//!      ▲                                   │
//!      │                    ┌──────────────┼──────────────┐
//!      │                    ▼              ▼              ▼
//!      └──── invalidate()  expiry     set()/refresh() (replaced)
//! ```
//!
//! ## Single Flight
//! Regeneration holds a per-tenant `tokio::sync::Mutex` across the
//! handshake. Waiters re-check the slot once they get the lock, so N
//! concurrent `get()` calls on an empty slot cause exactly one handshake.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Slots hold lowercase hex and are validated on every read; a bad
//!   value is an error, never handed to the codec
//! - Never hold a DashMap guard across an `.await`
//! - Entries are replaced wholesale, never mutated
//!
//! ## Last Modified
//! v0.1.0 - Initial session key store
//! v0.1.1 - `is_present` validates the stored hex like `get`

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use zeroize::Zeroizing;

use efris_common::{Deadline, TenantId};
use efris_core::SessionKey;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::services::key_exchange::SessionKeySource;

/// Default cache key prefix.
pub const DEFAULT_CACHE_KEY_PREFIX: &str = "efris_cached_aes_key";

/// Default session key lifetime (24 h).
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(86_400);

// ============================================
// CachedKey
// ============================================

/// One cache slot.
struct CachedKey {
    key_hex: Zeroizing<String>,
    expires_at: Deadline,
}

// ============================================
// SessionKeyStore
// ============================================

/// Per-tenant session key cache with single-flight regeneration.
pub struct SessionKeyStore {
    slots: DashMap<String, CachedKey>,
    flights: DashMap<String, Arc<Mutex<()>>>,
    source: Arc<dyn SessionKeySource>,
    ttl: Duration,
    prefix: String,
}

impl SessionKeyStore {
    /// Creates an empty store that refreshes keys through `source`.
    pub fn new(source: Arc<dyn SessionKeySource>) -> Self {
        Self {
            slots: DashMap::new(),
            flights: DashMap::new(),
            source,
            ttl: DEFAULT_KEY_TTL,
            prefix: DEFAULT_CACHE_KEY_PREFIX.to_string(),
        }
    }

    /// Creates a store with the configured TTL and prefix.
    pub fn from_config(config: &ClientConfig, source: Arc<dyn SessionKeySource>) -> Self {
        Self::new(source)
            .with_ttl(config.key_ttl())
            .with_prefix(&config.key_cache.cache_key_prefix)
    }

    /// Lifetime given to keys fetched by `get()` and `refresh()`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Cache key of `tenant`'s slot.
    #[must_use]
    pub fn cache_key(&self, tenant: &TenantId) -> String {
        tenant.cache_key(&self.prefix)
    }

    /// Returns the current key, running one handshake if the slot is empty
    /// or expired.
    ///
    /// # Errors
    /// - `Core(InvalidSessionKey)` if the slot holds a malformed key
    /// - any error of the key source
    pub async fn get(&self, tenant: &TenantId) -> Result<SessionKey> {
        let slot = self.cache_key(tenant);
        if let Some(key) = self.read(&slot)? {
            return Ok(key);
        }

        let flight = self.flight(&slot);
        let _guard = flight.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(key) = self.read(&slot)? {
            debug!(tenant = %tenant, "Session key refreshed by concurrent caller");
            return Ok(key);
        }

        debug!(tenant = %tenant, "Session key absent or expired, refreshing");
        self.fetch_and_store(tenant, &slot).await
    }

    /// Forces a handshake and replaces the slot.
    ///
    /// # Errors
    /// Any error of the key source; the previous slot is left untouched.
    pub async fn refresh(&self, tenant: &TenantId) -> Result<SessionKey> {
        let slot = self.cache_key(tenant);
        let flight = self.flight(&slot);
        let _guard = flight.lock().await;
        self.fetch_and_store(tenant, &slot).await
    }

    /// Stores `key` for `tenant`, expiring after `ttl`. `ttl = 0` stores an
    /// already expired key.
    pub fn set(&self, tenant: &TenantId, key: &SessionKey, ttl: Duration) {
        self.put(self.cache_key(tenant), Zeroizing::new(key.to_hex()), ttl);
    }

    /// Stores hex as given (e.g. imported from an external cache). The
    /// value is validated when read.
    pub fn set_hex(&self, tenant: &TenantId, key_hex: impl Into<String>, ttl: Duration) {
        self.put(self.cache_key(tenant), Zeroizing::new(key_hex.into()), ttl);
    }

    /// Drops `tenant`'s slot. Returns `true` if there was one.
    pub fn invalidate(&self, tenant: &TenantId) -> bool {
        let removed = self.slots.remove(&self.cache_key(tenant)).is_some();
        if removed {
            info!(tenant = %tenant, "Session key invalidated");
        }
        removed
    }

    /// Returns `true` if `tenant` has an unexpired, well-formed key, i.e.
    /// exactly when `get` would answer from the cache.
    #[must_use]
    pub fn is_present(&self, tenant: &TenantId) -> bool {
        matches!(self.read(&self.cache_key(tenant)), Ok(Some(_)))
    }

    /// Time until `tenant`'s key expires, if it has a present one.
    #[must_use]
    pub fn expires_in(&self, tenant: &TenantId) -> Option<Duration> {
        if !self.is_present(tenant) {
            return None;
        }
        self.slots
            .get(&self.cache_key(tenant))
            .map(|entry| entry.expires_at.remaining())
    }

    // ========================================
    // Internals
    // ========================================

    fn flight(&self, slot: &str) -> Arc<Mutex<()>> {
        self.flights.entry(slot.to_string()).or_default().clone()
    }

    fn read(&self, slot: &str) -> Result<Option<SessionKey>> {
        let Some(entry) = self.slots.get(slot) else {
            return Ok(None);
        };
        if entry.expires_at.is_expired() {
            return Ok(None);
        }
        Ok(Some(SessionKey::from_hex(&entry.key_hex)?))
    }

    fn put(&self, slot: String, key_hex: Zeroizing<String>, ttl: Duration) {
        self.slots.insert(
            slot,
            CachedKey {
                key_hex,
                expires_at: Deadline::after(ttl),
            },
        );
    }

    async fn fetch_and_store(&self, tenant: &TenantId, slot: &str) -> Result<SessionKey> {
        let key = self.source.fetch_session_key(tenant).await?;
        self.put(slot.to_string(), Zeroizing::new(key.to_hex()), self.ttl);
        info!(
            tenant = %tenant,
            ttl_secs = self.ttl.as_secs(),
            "Session key cached"
        );
        Ok(key)
    }
}

// ============================================
// Tests
// ============================================
