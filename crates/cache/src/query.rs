//! Per-domain store of query results.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::patch::{self, CachePatch};
use crate::{CacheDomain, CacheDomainId};

/// Cache key: endpoint name plus its canonicalised arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Build a key from an endpoint and its arguments.
    ///
    /// Arguments are rendered through `serde_json`, whose maps are sorted, so
    /// equal argument objects always produce equal keys.
    pub fn new<A: Serialize>(endpoint: &str, args: &A) -> Self {
        let args = serde_json::to_string(args).unwrap_or_else(|_| "null".to_string());
        Self(format!("{endpoint}({args})"))
    }

    /// Key for an endpoint that takes no arguments.
    pub fn endpoint(endpoint: &str) -> Self {
        Self(format!("{endpoint}(null)"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle for a fetch that was started against this cache.
///
/// A ticket remembers the cache generation at issue time; results delivered
/// with a ticket from before the last [`QueryCache::reset`] are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    entries: HashMap<QueryKey, CacheEntry>,
    subscribers: HashMap<QueryKey, usize>,
}

/// Query results for one [`CacheDomainId`].
#[derive(Debug)]
pub struct QueryCache {
    domain: CacheDomainId,
    state: RwLock<State>,
}

impl QueryCache {
    pub fn new(domain: CacheDomainId) -> Self {
        Self {
            domain,
            state: RwLock::new(State::default()),
        }
    }

    pub fn domain(&self) -> CacheDomainId {
        self.domain
    }

    /// Number of resets so far.
    pub fn generation(&self) -> u64 {
        self.state.read().map(|s| s.generation).unwrap_or(0)
    }

    pub fn get(&self, key: &QueryKey) -> Option<Value> {
        let state = self.state.read().ok()?;
        state.entries.get(key).map(|e| e.value.clone())
    }

    /// When the cached value for `key` was stored.
    pub fn fetched_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        let state = self.state.read().ok()?;
        state.entries.get(key).map(|e| e.fetched_at)
    }

    pub fn insert(&self, key: QueryKey, value: Value) {
        if let Ok(mut state) = self.state.write() {
            state.entries.insert(
                key,
                CacheEntry {
                    value,
                    fetched_at: Utc::now(),
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register the start of a network fetch for `key`.
    pub fn begin_fetch(&self, key: QueryKey) -> FetchTicket {
        FetchTicket {
            key,
            generation: self.generation(),
        }
    }

    /// Store a fetch result if the cache was not reset since the ticket was issued.
    ///
    /// Returns whether the value was stored.
    pub fn complete_fetch(&self, ticket: FetchTicket, value: Value) -> bool {
        let Ok(mut state) = self.state.write() else {
            return false;
        };
        if state.generation != ticket.generation {
            tracing::debug!(
                domain = %self.domain,
                key = %ticket.key,
                "dropping result fetched before cache reset"
            );
            return false;
        }
        state.entries.insert(
            ticket.key,
            CacheEntry {
                value,
                fetched_at: Utc::now(),
            },
        );
        true
    }

    pub fn subscribe(&self, key: &QueryKey) {
        if let Ok(mut state) = self.state.write() {
            *state.subscribers.entry(key.clone()).or_insert(0) += 1;
        }
    }

    pub fn unsubscribe(&self, key: &QueryKey) {
        if let Ok(mut state) = self.state.write() {
            if let Some(count) = state.subscribers.get_mut(key) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    state.subscribers.remove(key);
                }
            }
        }
    }

    pub fn subscribers(&self, key: &QueryKey) -> usize {
        self.state
            .read()
            .ok()
            .and_then(|s| s.subscribers.get(key).copied())
            .unwrap_or(0)
    }

    /// Edit a cached value in place.
    ///
    /// Returns `None` when `key` is not cached; there is nothing to patch.
    pub fn patch<F>(&self, key: &QueryKey, edit: F) -> Option<CachePatch>
    where
        F: FnOnce(&mut Value),
    {
        self.try_patch(key, |value| {
            edit(value);
            true
        })
    }

    /// Like [`QueryCache::patch`], but `edit` may decline by returning `false`,
    /// in which case the entry is left as it was and no patch is returned.
    fn try_patch<F>(&self, key: &QueryKey, edit: F) -> Option<CachePatch>
    where
        F: FnOnce(&mut Value) -> bool,
    {
        let mut state = self.state.write().ok()?;
        let generation = state.generation;
        let entry = state.entries.get_mut(key)?;
        let previous = entry.value.clone();
        if !edit(&mut entry.value) {
            return None;
        }

        Some(CachePatch {
            key: key.clone(),
            previous,
            generation,
        })
    }

    /// Optimistically append `item` to the cached list at `key`.
    pub fn add_item(&self, key: &QueryKey, item: Value) -> Option<CachePatch> {
        self.patch_list(key, |list| patch::push_item(list, item))
    }

    /// Optimistically replace the element of the cached list with the same `id_key`.
    pub fn update_item(&self, key: &QueryKey, id_key: &str, item: Value) -> Option<CachePatch> {
        self.patch_list(key, |list| {
            patch::replace_item(list, id_key, item);
        })
    }

    /// Optimistically drop the elements of the cached list whose `id_key` is `id`.
    pub fn remove_item(&self, key: &QueryKey, id_key: &str, id: &Value) -> Option<CachePatch> {
        self.patch_list(key, |list| patch::remove_items(list, id_key, id))
    }

    fn patch_list<F>(&self, key: &QueryKey, edit: F) -> Option<CachePatch>
    where
        F: FnOnce(&mut Vec<Value>),
    {
        self.try_patch(key, |value| match value {
            Value::Array(list) => {
                edit(list);
                true
            }
            _ => {
                tracing::debug!(domain = %self.domain, key = %key, "list patch skipped: entry is not a list");
                false
            }
        })
    }

    /// Roll back an optimistic edit after the server rejected the mutation.
    ///
    /// A patch taken before the last reset is stale and is ignored.
    pub fn undo(&self, patch: CachePatch) -> bool {
        let Ok(mut state) = self.state.write() else {
            return false;
        };
        if state.generation != patch.generation {
            return false;
        }
        match state.entries.get_mut(&patch.key) {
            Some(entry) => {
                entry.value = patch.previous;
                true
            }
            None => false,
        }
    }
}

impl CacheDomain for QueryCache {
    fn id(&self) -> CacheDomainId {
        self.domain
    }

    fn reset(&self) {
        let Ok(mut state) = self.state.write() else {
            tracing::error!(domain = %self.domain, "cache lock poisoned; reset skipped");
            return;
        };
        let dropped = state.entries.len();
        state.entries.clear();
        state.subscribers.clear();
        state.generation += 1;

        tracing::debug!(domain = %self.domain, dropped, generation = state.generation, "cache reset");
    }
}
