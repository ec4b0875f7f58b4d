//! Change-aware response cache.
//!
//! Describe calls that ask for a whole collection tend to return the same
//! body over and over. The cache keeps, per operation key, the last raw body
//! and the value decoded from it; a byte-identical body is answered with the
//! stored value and the decoder never runs.
//!
//! Entries are owned by the client handle. Each key has its own lock, held
//! across compare → decode → store, so a stored value always belongs to the
//! stored body.

use bytes::Bytes;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Ec2Result;
use crate::xml::{self, Decoder};

type Slot = Arc<Mutex<Option<CacheEntry>>>;

struct CacheEntry {
    raw: Bytes,
    value: Arc<dyn Any + Send + Sync>,
}

/// Point-in-time counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Cacheable calls answered from a stored value.
    pub hits: u64,
    /// Cacheable calls that had to decode.
    pub misses: u64,
    /// Non-cacheable calls (always decoded, never stored).
    pub bypassed: u64,
}

#[derive(Default)]
pub struct ResponseCache {
    slots: Mutex<HashMap<String, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("keys", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `raw` with the decoder built by `make_decoder`, or return the
    /// value stored for `key` if `raw` is byte-identical to its body.
    ///
    /// With `cacheable == false` the entry for `key` is neither read nor
    /// written. A failed decode leaves the entry as it was.
    pub fn fetch<D, F>(
        &self,
        key: &str,
        cacheable: bool,
        raw: &Bytes,
        make_decoder: F,
    ) -> Ec2Result<Arc<D::Output>>
    where
        D: Decoder,
        D::Output: Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        if !cacheable {
            self.bypassed.fetch_add(1, Ordering::Relaxed);
            log::debug!("{}: filtered call, decoding without cache", key);
            return xml::decode(raw, make_decoder()).map(Arc::new);
        }

        let slot = self.slot(key);
        let mut entry = lock(&slot);

        if let Some(stored) = entry.as_ref() {
            if stored.raw == *raw {
                if let Ok(value) = Arc::clone(&stored.value).downcast::<D::Output>() {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    log::debug!("{}: response unchanged ({} bytes), reusing decoded value", key, raw.len());
                    return Ok(value);
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(xml::decode(raw, make_decoder())?);
        *entry = Some(CacheEntry {
            raw: raw.clone(),
            value: Arc::clone(&value) as Arc<dyn Any + Send + Sync>,
        });
        log::debug!("{}: decoded and cached {} bytes", key, raw.len());
        Ok(value)
    }

    /// Number of operation keys that have an entry.
    pub fn len(&self) -> usize {
        let slots = lock(&self.slots);
        slots.values().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` currently has a stored body.
    pub fn contains(&self, key: &str) -> bool {
        let slot = lock(&self.slots).get(key).cloned();
        slot.map(|slot| lock(&slot).is_some()).unwrap_or(false)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
        }
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(key.to_string()).or_default())
    }
}

/// Entries are replaced in a single assignment, so a poisoned lock still
/// guards a consistent (raw, value) pair.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
