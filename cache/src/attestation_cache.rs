//! Bounded attestation cache with time-based expiry.

use tally_types::{Attestation, Timestamp};

use crate::bounded_map::BoundedStateMap;

/// Default attestation time-to-live: one hour.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// A [`BoundedStateMap`] of attestations where every entry expires after a
/// fixed TTL. Expired entries are treated as absent and evicted lazily on
/// access.
///
/// The cache never initiates network calls; on a miss the caller fetches
/// from the attestation service and repopulates it. Callers supply `now`
/// explicitly so expiry is deterministic under test.
pub struct AttestationCache {
    inner: BoundedStateMap<Expiring>,
    ttl_secs: u64,
}

struct Expiring {
    value: Attestation,
    cached_at: Timestamp,
}

impl AttestationCache {
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        Self {
            inner: BoundedStateMap::new(capacity),
            ttl_secs,
        }
    }

    pub fn with_default_ttl(capacity: usize) -> Self {
        Self::new(capacity, DEFAULT_TTL_SECS)
    }

    /// Cache an attestation for `address` as of `now`.
    pub fn insert(&mut self, address: impl Into<String>, value: Attestation, now: Timestamp) {
        self.inner.set(
            address,
            Expiring {
                value,
                cached_at: now,
            },
        );
    }

    /// Look up an unexpired attestation. An expired entry is removed and
    /// reported as absent, prompting the caller to re-fetch.
    pub fn get(&mut self, address: &str, now: Timestamp) -> Option<Attestation> {
        let expired = self
            .inner
            .peek(address)
            .map(|entry| entry.cached_at.has_expired(self.ttl_secs, now))?;
        if expired {
            self.inner.remove(address);
            return None;
        }
        self.inner.get(address).map(|entry| entry.value.clone())
    }

    /// Live entry count, including not-yet-collected expired entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}
