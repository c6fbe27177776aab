//! # Session Cache
//!
//! A bounded, expire-after-write cache shared by every request. It holds the
//! latest [`FlowStatus`] for each correlation id and, under a single fixed
//! key, the bearer token used for the VC Request API.
//!
//! Entries expire a fixed time after they were last written. Reads do not
//! extend an entry's life, but do count as use for LRU eviction once the
//! cache is at capacity.

use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use lru::LruCache;
use parking_lot::Mutex;

use crate::types::FlowStatus;

/// Maximum number of live entries.
pub const DEFAULT_CAPACITY: usize = 100;

/// Cache key for the VC Request API access token.
const TOKEN_KEY: &str = "access_token";

/// Time-to-live for cache entries, measured from the last write.
#[must_use]
pub fn default_ttl() -> TimeDelta {
    TimeDelta::try_minutes(15).unwrap_or_default()
}

/// A cached value.
#[derive(Clone, Debug, PartialEq)]
enum Cached {
    AccessToken(String),
    Flow(FlowStatus),
}

#[derive(Debug)]
struct Entry {
    expires_at: DateTime<Utc>,
    value: Cached,
}

/// Shared, thread-safe session cache. Cloning is cheap and clones share
/// entries.
#[derive(Clone, Debug)]
pub struct Cache {
    inner: Arc<Mutex<LruCache<String, Entry>>>,
    ttl: TimeDelta,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    /// Create a cache holding at most 100 entries for 15 minutes each.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_CAPACITY, default_ttl())
    }

    /// Create a cache with the given capacity and time-to-live.
    #[must_use]
    pub fn with_policy(capacity: usize, ttl: TimeDelta) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(cap))),
            ttl,
        }
    }

    /// Save the status of a flow, replacing whatever was held for `id`.
    pub fn put_flow(&self, id: &str, status: FlowStatus) {
        self.put(id, Cached::Flow(status));
    }

    /// The latest status of a flow, if any has been written and not expired.
    #[must_use]
    pub fn flow(&self, id: &str) -> Option<FlowStatus> {
        match self.get(id)? {
            Cached::Flow(status) => Some(status),
            Cached::AccessToken(_) => None,
        }
    }

    /// Save the VC Request API access token.
    pub fn put_token(&self, token: impl Into<String>) {
        self.put(TOKEN_KEY, Cached::AccessToken(token.into()));
    }

    /// The cached access token, if present and not expired.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        match self.get(TOKEN_KEY)? {
            Cached::AccessToken(token) if !token.is_empty() => Some(token),
            _ => None,
        }
    }

    /// Number of entries held, including any not yet purged after expiry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    fn put(&self, key: &str, value: Cached) {
        let entry = Entry {
            expires_at: Utc::now() + self.ttl,
            value,
        };
        self.inner.lock().put(key.to_string(), entry);
    }

    fn get(&self, key: &str) -> Option<Cached> {
        let mut cache = self.inner.lock();
        let expired = Utc::now() >= cache.get(key)?.expires_at;
        if expired {
            cache.pop(key);
            return None;
        }
        cache.peek(key).map(|entry| entry.value.clone())
    }
}
