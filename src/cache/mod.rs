//! Validator- and TTL-aware response cache.
//!
//! Reads are non-exclusive and may observe a slightly stale map; an old entry
//! is either still correct or treated as a miss. Writes lock one shard.
//! Nothing expires entries in the background: they are replaced in place by
//! key, and dropped only to make room when the cache is full.

mod freshness;
mod key;

pub use freshness::{Freshness, format_http_date, parse_http_date};
pub use key::{cache_key, request_key};

use crate::core::Response;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use reqwest::Method;
use std::time::Instant;

/// Methods whose responses may be stored.
#[must_use]
pub fn is_read_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

#[derive(Debug)]
struct Slot {
    response: Response,
    stored_at: Instant,
}

/// In-memory store of prior responses keyed by normalized URL.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<String, Slot>,
    max_entries: usize,
}

impl ResponseCache {
    /// Creates a cache holding at most `max_entries` responses.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
        }
    }

    /// Looks up `key` and returns a copy flagged as a cache hit.
    ///
    /// Only entries that are still fresh or that carry validators are returned;
    /// an expired entry without validators is a miss.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Response> {
        let now = Utc::now();
        let slot = self.entries.get(key)?;
        if !slot.response.freshness.is_usable_at(now) {
            return None;
        }
        let mut response = slot.response.clone();
        drop(slot);
        response.cache_hit = true;

        #[cfg(feature = "tracing")]
        tracing::trace!(key, fresh = response.freshness.is_fresh_at(now), "cache hit");

        Some(response)
    }

    /// Stores `response` under `key` unless a fresh entry is already there.
    ///
    /// Responses without any freshness signal are never stored. A new key
    /// arriving at a full cache evicts entries first: unusable ones, then
    /// stale ones, then the oldest. Returns whether the response was stored.
    pub fn insert_if_absent(&self, key: impl Into<String>, response: &Response) -> bool {
        if self.max_entries == 0 || !response.freshness.is_cacheable() {
            return false;
        }
        let key = key.into();
        let now = Utc::now();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }

        let mut stored = response.clone();
        stored.cache_hit = false;
        let slot = Slot {
            response: stored,
            stored_at: Instant::now(),
        };

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().response.freshness.is_fresh_at(now) {
                    return false;
                }
                occupied.insert(slot);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(url = %response.url, "cache insert");

        true
    }

    /// Drops unusable entries, then stale and then the oldest ones until a
    /// tenth of the capacity (at least one slot) is free again.
    fn make_room(&self, now: DateTime<Utc>) {
        self.entries
            .retain(|_, slot| slot.response.freshness.is_usable_at(now));

        let target = self.max_entries - (self.max_entries / 10).max(1);
        let excess = self.entries.len().saturating_sub(target);
        if excess == 0 {
            return;
        }

        let mut victims: Vec<(bool, Instant, String)> = self
            .entries
            .iter()
            .map(|slot| {
                (
                    slot.response.freshness.is_fresh_at(now),
                    slot.stored_at,
                    slot.key().clone(),
                )
            })
            .collect();
        victims.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        for (_, _, key) in victims.into_iter().take(excess) {
            self.entries.remove(&key);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(evicted = excess, "cache full, evicted entries");
    }

    /// Drops the entry for `key`, returning it.
    pub fn remove(&self, key: &str) -> Option<Response> {
        self.entries.remove(key).map(|(_, slot)| slot.response)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries. May lag concurrent writers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry bound given at construction.
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }
}
