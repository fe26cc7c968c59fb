//! Short-lived response cache.
//!
//! Keys combine agent identity, normalized message content, and a coarse
//! length bucket, so trivial rephrasings ("Hello!" vs "hello") share an
//! entry while genuinely different utterances do not. Eviction is lazy on
//! read, with a hard entry cap that triggers a sweep on insert.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use hamlet_types::agent::AgentId;

/// Width of the coarse message-length bucket, in characters.
const LENGTH_BUCKET_WIDTH: usize = 10;

/// Cache key: agent identity + normalized content + length bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    agent_id: AgentId,
    normalized: String,
    length_bucket: usize,
}

impl CacheKey {
    /// Build the key for a message aimed at an agent. Normalization
    /// lowercases and collapses interior whitespace.
    pub fn for_message(agent_id: AgentId, text: &str) -> Self {
        let normalized = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let length_bucket = normalized.chars().count() / LENGTH_BUCKET_WIDTH;
        Self {
            agent_id,
            normalized,
            length_bucket,
        }
    }
}

struct CacheEntry {
    text: String,
    created: Instant,
}

/// TTL-bounded response cache with a hard entry cap.
pub struct ResponseCache {
    ttl: Duration,
    max_entries: usize,
    entries: DashMap<CacheKey, CacheEntry>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: DashMap::new(),
        }
    }

    /// Fresh cached text for the key, if any. Expired entries are removed
    /// on the way out.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            if entry.created.elapsed() < self.ttl {
                return Some(entry.text.clone());
            }
        }
        // Lazy eviction for the expired entry we just looked at.
        self.entries
            .remove_if(key, |_, entry| entry.created.elapsed() >= self.ttl);
        None
    }

    /// Cache a response. At the entry cap, expired entries are swept
    /// before inserting.
    pub fn insert(&self, key: CacheKey, text: String) {
        if self.entries.len() >= self.max_entries {
            self.sweep();
        }
        self.entries.insert(
            key,
            CacheEntry {
                text,
                created: Instant::now(),
            },
        );
    }

    /// Drop every expired entry.
    pub fn sweep(&self) {
        self.entries
            .retain(|_, entry| entry.created.elapsed() < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_normalizes_case_and_whitespace() {
        let id = AgentId::new();
        let a = CacheKey::for_message(id, "Hello   There");
        let b = CacheKey::for_message(id, "hello there");
        assert_eq!(a, b);
    }

    #[test]
    fn key_differs_per_agent() {
        let a = CacheKey::for_message(AgentId::new(), "hello");
        let b = CacheKey::for_message(AgentId::new(), "hello");
        assert_ne!(a, b);
    }

    #[test]
    fn hit_within_ttl_miss_after() {
        let cache = ResponseCache::new(Duration::from_millis(50), 16);
        let key = CacheKey::for_message(AgentId::new(), "hello");
        cache.insert(key.clone(), "well met".to_string());

        assert_eq!(cache.get(&key).as_deref(), Some("well met"));

        std::thread::sleep(Duration::from_millis(60));
        assert!(cache.get(&key).is_none());
        // The expired entry was lazily removed.
        assert!(cache.is_empty());
    }

    #[test]
    fn cap_triggers_sweep_of_expired_entries() {
        let cache = ResponseCache::new(Duration::from_millis(20), 4);
        let id = AgentId::new();
        for i in 0..4 {
            cache.insert(
                CacheKey::for_message(id, &format!("message number {i}")),
                "reply".to_string(),
            );
        }
        assert_eq!(cache.len(), 4);

        std::thread::sleep(Duration::from_millis(30));
        cache.insert(
            CacheKey::for_message(id, "a fresh message"),
            "reply".to_string(),
        );
        // The four expired entries were swept at the cap.
        assert_eq!(cache.len(), 1);
    }
}
