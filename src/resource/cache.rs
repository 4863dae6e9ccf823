//! Tag-indexed, TTL-aware cache with priority eviction.
//!
//! # Responsibilities
//! - Store values by string key with TTL, priority tier and tags
//! - Lazily drop expired entries on `get`/`has`
//! - Evict exactly one entry when full (lowest tier, then least recently used)
//! - Invalidate groups of entries through a reverse tag index
//!
//! # Design Decisions
//! - One `Mutex` around entries and the tag index so both stay consistent
//! - Recency is a logical access sequence, not wall-clock time, so ties
//!   between entries touched in the same instant still break deterministically
//! - Hit/miss counters are atomics outside the lock

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::schema::CacheConfig;
use crate::observability::metrics;

/// Eviction tier. Lower tiers are evicted first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Per-entry options for [`Cache::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Time to live. Falls back to the cache default when unset.
    pub ttl: Option<Duration>,
    pub priority: Priority,
    pub tags: Vec<String>,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// A stored value plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub created_at: Instant,
    pub last_access: Instant,
    pub access_seq: u64,
    pub expires_at: Option<Instant>,
    pub priority: Priority,
    pub tags: HashSet<String>,
    pub access_count: u64,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    fn score(&self) -> (Priority, u64) {
        (self.priority, self.access_seq)
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    tags: HashMap<String, HashSet<String>>,
    seq: u64,
}

impl<V> CacheState<V> {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn unlink(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        for tag in &entry.tags {
            if let Some(keys) = self.tags.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }
        Some(entry)
    }

    fn expired_keys(&self, now: Instant) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn victim(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, entry)| entry.score())
            .map(|(key, _)| key.clone())
    }
}

/// Thread-safe cache. Share it as `Arc<Cache<V>>`.
pub struct Cache<V> {
    state: Mutex<CacheState<V>>,
    capacity: usize,
    default_ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl<V: Clone> Cache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                tags: HashMap::new(),
                seq: 0,
            }),
            capacity: capacity.max(1),
            default_ttl: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// TTL applied to entries stored without one.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let cache = Self::new(config.capacity);
        match config.default_ttl_ms {
            Some(ms) => cache.with_default_ttl(Duration::from_millis(ms)),
            None => cache,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert or replace `key`. Evicts one entry if the cache is full.
    pub fn set(&self, key: impl Into<String>, data: V, options: EntryOptions) {
        let key = key.into();
        let now = Instant::now();
        let mut state = self.state.lock().expect("cache mutex poisoned");

        state.unlink(&key);
        if state.entries.len() >= self.capacity {
            self.drop_expired(&mut state, now);
        }
        if state.entries.len() >= self.capacity {
            if let Some(victim) = state.victim() {
                state.unlink(&victim);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_eviction();
                tracing::debug!(key = %victim, "Cache entry evicted");
            }
        }

        let tags: HashSet<String> = options.tags.into_iter().collect();
        for tag in &tags {
            state.tags.entry(tag.clone()).or_default().insert(key.clone());
        }
        let access_seq = state.next_seq();
        let ttl = options.ttl.or(self.default_ttl);
        state.entries.insert(
            key,
            CacheEntry {
                data,
                created_at: now,
                last_access: now,
                access_seq,
                expires_at: ttl.map(|ttl| now + ttl),
                priority: options.priority,
                tags,
                access_count: 0,
            },
        );
        metrics::record_cache_size(state.entries.len());
    }

    /// Fetch a live value, refreshing its recency.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut state = self.state.lock().expect("cache mutex poisoned");

        if state.entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            state.unlink(key);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_expiration();
        }

        let seq = state.next_seq();
        match state.entries.get_mut(key) {
            Some(entry) => {
                entry.last_access = now;
                entry.access_seq = seq;
                entry.access_count += 1;
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup(true);
                Some(entry.data.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup(false);
                None
            }
        }
    }

    /// Whether a live entry exists. Does not count as an access.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().expect("cache mutex poisoned");
        match state.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                state.unlink(key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_expiration();
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Clone of the entry including bookkeeping, expired or not.
    pub fn peek_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        let state = self.state.lock().expect("cache mutex poisoned");
        state.entries.get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let removed = state.unlink(key).map(|entry| entry.data);
        metrics::record_cache_size(state.entries.len());
        removed
    }

    /// Remove every entry carrying any of `tags`. Returns the number removed.
    pub fn invalidate_by_tags<I, S>(&self, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let keys: HashSet<String> = tags
            .into_iter()
            .filter_map(|tag| state.tags.get(tag.as_ref()).cloned())
            .flatten()
            .collect();

        let removed = keys.iter().filter(|key| state.unlink(key).is_some()).count();
        metrics::record_cache_size(state.entries.len());
        tracing::debug!(removed, "Cache entries invalidated by tag");
        removed
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let removed = self.drop_expired(&mut state, Instant::now());
        metrics::record_cache_size(state.entries.len());
        removed
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        state.entries.clear();
        state.tags.clear();
        metrics::record_cache_size(0);
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently indexed under `tag`.
    pub fn keys_for_tag(&self, tag: &str) -> Vec<String> {
        let state = self.state.lock().expect("cache mutex poisoned");
        let mut keys: Vec<String> = state
            .tags
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Whether the reverse index has any entry for `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.state
            .lock()
            .expect("cache mutex poisoned")
            .tags
            .contains_key(tag)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

    fn drop_expired(&self, state: &mut CacheState<V>, now: Instant) -> usize {
        let expired = state.expired_keys(now);
        for key in &expired {
            state.unlink(key);
        }
        if !expired.is_empty() {
            self.expirations
                .fetch_add(expired.len() as u64, Ordering::Relaxed);
            for _ in &expired {
                metrics::record_cache_expiration();
            }
        }
        expired.len()
    }
}

impl<V: Clone + Send + 'static> Cache<V> {
    /// Periodically purge expired entries until shutdown.
    pub async fn run_janitor(self: Arc<Self>, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = interval.as_secs(), "Cache janitor starting");

        let mut ticker = time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "Cache janitor purged expired entries");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cache janitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
