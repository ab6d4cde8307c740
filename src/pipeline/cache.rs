//! In-memory, TTL-bounded cache for pipeline results.
//!
//! Keys are [`PipelineKey`]s: a hash over the owning pipeline's scope, the
//! snapshot fingerprint and the full search request, so a changed feed,
//! changed criteria or a different category table never hits a stale entry.
//! The cache is owned by whoever builds the pipeline and passed in
//! explicitly; several pipelines may share one.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config;
use crate::pipeline::SearchRequest;

/// Identity of one pipeline invocation's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey(pub u64);

impl PipelineKey {
    pub fn new(fingerprint: u64, request: &SearchRequest) -> Self {
        Self::scoped(0, fingerprint, request)
    }

    /// Key for a run of the pipeline identified by `scope`.
    pub fn scoped(scope: u64, fingerprint: u64, request: &SearchRequest) -> Self {
        let mut hasher = DefaultHasher::new();
        scope.hash(&mut hasher);
        fingerprint.hash(&mut hasher);
        request.hash_into(&mut hasher);
        PipelineKey(hasher.finish())
    }
}

struct Entry<V> {
    value: Arc<V>,
    inserted: Instant,
    /// Insertion order; breaks ties between equal `Instant`s.
    seq: u64,
}

/// Thread-safe result cache with a fixed time-to-live and capacity.
///
/// Entries older than the TTL are never returned. When full, expired entries
/// are evicted first, then the oldest entry.
pub struct ResultCache<V> {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<PipelineKey, Entry<V>>>,
    next_seq: AtomicU64,
}

impl<V> ResultCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &PipelineKey) -> Option<Arc<V>> {
        let mut entries = self.entries.lock().ok()?;
        let found = entries
            .get(key)
            .map(|e| (e.inserted.elapsed() < self.ttl, Arc::clone(&e.value)));
        match found {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: PipelineKey, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= self.capacity && !entries.contains_key(&key) {
                let ttl = self.ttl;
                entries.retain(|_, e| e.inserted.elapsed() < ttl);
                if entries.len() >= self.capacity {
                    let oldest = entries
                        .iter()
                        .min_by_key(|(_, e)| e.seq)
                        .map(|(k, _)| *k);
                    if let Some(k) = oldest {
                        entries.remove(&k);
                    }
                }
            }
            entries.insert(
                key,
                Entry {
                    value: Arc::clone(&value),
                    inserted: Instant::now(),
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                },
            );
        }
        value
    }

    /// Number of stored entries, including ones that have expired but not
    /// yet been evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl<V> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(config::RESULT_TTL, config::RESULT_CACHE_CAPACITY)
    }
}
