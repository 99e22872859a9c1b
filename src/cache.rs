//! In-memory template cache with TTL-based staleness.
//!
//! The remote template source consults this cache before every download.
//! An entry is usable while `now - fetched_at < ttl`; stale entries stay in
//! the map until the next `put` for the same key overwrites them. There is
//! no size cap and no background eviction.
//!
//! Concurrent requests may miss on the same key at the same time and both
//! download and `put`; the last writer wins. Both writers store content
//! fetched from the same object, so the race is benign.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default lifetime of a cache entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// One cached template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub content: String,
    pub fetched_at: Instant,
    /// SHA-256 of `content`, lowercase hex. Informational only.
    pub content_hash: String,
}

impl CacheEntry {
    fn new(content: String) -> Self {
        let content_hash = format!("{:x}", Sha256::digest(content.as_bytes()));
        Self {
            content,
            fetched_at: Instant::now(),
            content_hash,
        }
    }

    /// Whether this entry can be served without a refetch at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Thread-safe `template_id → CacheEntry` map.
#[derive(Debug)]
pub struct TemplateCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl TemplateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return cached content if an entry exists and is still fresh.
    pub fn get(&self, template_id: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(template_id)?;
        if entry.is_fresh(self.ttl, Instant::now()) {
            Some(entry.content.clone())
        } else {
            debug!("Cache entry for '{}' is stale", template_id);
            None
        }
    }

    /// Store `content` for `template_id`, replacing any previous entry.
    pub fn put(&self, template_id: &str, content: impl Into<String>) {
        let entry = CacheEntry::new(content.into());
        debug!(
            "Caching '{}' ({} bytes, sha256 {})",
            template_id,
            entry.content.len(),
            entry.content_hash
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(template_id.to_string(), entry);
    }

    /// Snapshot of the stored entry regardless of freshness.
    pub fn entry(&self, template_id: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(template_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
