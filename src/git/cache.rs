//! Per-document cache of blame, log and diff queries.
//!
//! Each file (keyed by its lowercased absolute path) owns a `DocumentCacheEntry`
//! with one slot map per result kind. A slot holds the *shared query* rather
//! than its value: the future is stored before it first resolves, so every
//! concurrent caller for the same (file, slot) awaits the same git invocation.
//!
//! A failed query is replaced by a ready `Ok(None)` placeholder that carries
//! the error message, which keeps known-failing files from re-running git on
//! every render.
//!
//! Used by: `GitService` query methods in blame.rs, history.rs, diff.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{self, BoxFuture, Shared};
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::GitError;
use crate::models::{GitBlame, GitDiff, GitLog};

pub type QueryResult<T> = std::result::Result<Option<Arc<T>>, Arc<GitError>>;
pub type SharedQuery<T> = Shared<BoxFuture<'static, QueryResult<T>>>;

/// Wrap a query future so several awaiters can join it
pub fn share<T, F>(query: F) -> SharedQuery<T>
where
    T: Send + Sync + 'static,
    F: std::future::Future<Output = QueryResult<T>> + Send + 'static,
{
    query.boxed().shared()
}

/// Already-resolved empty result
pub fn placeholder<T: Send + Sync + 'static>() -> SharedQuery<T> {
    share(future::ready(Ok(None)))
}

pub struct CacheItem<T> {
    /// Distinguishes this query from a later one stored under the same slot
    pub id: u64,
    pub query: SharedQuery<T>,
    pub error_message: Option<String>,
}

impl<T> CacheItem<T> {
    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}

#[derive(Default)]
pub struct DocumentCacheEntry {
    /// Normalized repository root the file belongs to
    pub repo_path: String,
    pub blames: HashMap<String, CacheItem<GitBlame>>,
    pub logs: HashMap<String, CacheItem<GitLog>>,
    pub diffs: HashMap<String, CacheItem<GitDiff>>,
}

impl DocumentCacheEntry {
    fn new(repo_path: &str) -> Self {
        Self {
            repo_path: repo_path.to_string(),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.blames.len() + self.logs.len() + self.diffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when every stored slot is a failure placeholder
    pub fn is_only_errors(&self) -> bool {
        !self.is_empty()
            && self.blames.values().all(CacheItem::is_error)
            && self.logs.values().all(CacheItem::is_error)
            && self.diffs.values().all(CacheItem::is_error)
    }
}

/// Result kinds that live in a `DocumentCacheEntry`
pub trait Cacheable: Send + Sync + Sized + 'static {
    const KIND: &'static str;
    fn slots(entry: &DocumentCacheEntry) -> &HashMap<String, CacheItem<Self>>;
    fn slots_mut(entry: &mut DocumentCacheEntry) -> &mut HashMap<String, CacheItem<Self>>;
}

impl Cacheable for GitBlame {
    const KIND: &'static str = "blame";
    fn slots(entry: &DocumentCacheEntry) -> &HashMap<String, CacheItem<Self>> {
        &entry.blames
    }
    fn slots_mut(entry: &mut DocumentCacheEntry) -> &mut HashMap<String, CacheItem<Self>> {
        &mut entry.blames
    }
}

impl Cacheable for GitLog {
    const KIND: &'static str = "log";
    fn slots(entry: &DocumentCacheEntry) -> &HashMap<String, CacheItem<Self>> {
        &entry.logs
    }
    fn slots_mut(entry: &mut DocumentCacheEntry) -> &mut HashMap<String, CacheItem<Self>> {
        &mut entry.logs
    }
}

impl Cacheable for GitDiff {
    const KIND: &'static str = "diff";
    fn slots(entry: &DocumentCacheEntry) -> &HashMap<String, CacheItem<Self>> {
        &entry.diffs
    }
    fn slots_mut(entry: &mut DocumentCacheEntry) -> &mut HashMap<String, CacheItem<Self>> {
        &mut entry.diffs
    }
}

/// Outcome of `DocumentCache::get_or_insert`
pub struct Lookup<T> {
    pub id: u64,
    pub query: SharedQuery<T>,
    /// False when an existing slot was joined
    pub inserted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub documents: usize,
    pub blames: usize,
    pub logs: usize,
    pub diffs: usize,
    pub errors: usize,
}

#[derive(Default)]
pub struct DocumentCache {
    entries: Mutex<HashMap<String, DocumentCacheEntry>>,
    next_id: AtomicU64,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Cacheable>(&self, key: &str, slot: &str) -> Option<SharedQuery<T>> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .and_then(|entry| T::slots(entry).get(slot))
            .map(|item| item.query.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn error_message<T: Cacheable>(&self, key: &str, slot: &str) -> Option<String> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .and_then(|entry| T::slots(entry).get(slot))
            .and_then(|item| item.error_message.clone())
    }

    /// Return the stored query for the slot, or store the one `make` builds.
    /// Lookup and insert happen under one lock, so two callers can never both
    /// insert.
    pub fn get_or_insert<T, F>(&self, repo_path: &str, key: &str, slot: &str, make: F) -> Lookup<T>
    where
        T: Cacheable,
        F: FnOnce() -> SharedQuery<T>,
    {
        let mut entries = self.entries.lock();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| DocumentCacheEntry::new(repo_path));
        let slots = T::slots_mut(entry);

        if let Some(item) = slots.get(slot) {
            return Lookup {
                id: item.id,
                query: item.query.clone(),
                inserted: false,
            };
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let query = make();
        slots.insert(
            slot.to_string(),
            CacheItem {
                id,
                query: query.clone(),
                error_message: None,
            },
        );
        tracing::trace!(key, slot, kind = T::KIND, "Cached query");
        Lookup {
            id,
            query,
            inserted: true,
        }
    }

    /// Swap the query `id` for an empty placeholder carrying `message`.
    /// Returns false when the slot has since been evicted, replaced, or was
    /// already marked failed by another awaiter.
    pub fn set_error<T: Cacheable>(&self, key: &str, slot: &str, id: u64, message: &str) -> bool {
        let mut entries = self.entries.lock();
        let Some(item) = entries
            .get_mut(key)
            .and_then(|entry| T::slots_mut(entry).get_mut(slot))
        else {
            return false;
        };
        if item.id != id || item.is_error() {
            return false;
        }
        item.query = placeholder();
        item.error_message = Some(message.to_string());
        true
    }

    /// Store a ready failure placeholder, used when a query is refused up front
    pub fn insert_error<T: Cacheable>(&self, repo_path: &str, key: &str, slot: &str, message: &str) {
        let mut entries = self.entries.lock();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| DocumentCacheEntry::new(repo_path));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        T::slots_mut(entry).insert(
            slot.to_string(),
            CacheItem {
                id,
                query: placeholder(),
                error_message: Some(message.to_string()),
            },
        );
    }

    pub fn remove(&self, key: &str) -> Option<DocumentCacheEntry> {
        self.entries.lock().remove(key)
    }

    pub fn is_only_errors(&self, key: &str) -> bool {
        self.entries
            .lock()
            .get(key)
            .is_some_and(DocumentCacheEntry::is_only_errors)
    }

    /// Drop every entry of one repository; returns how many were removed
    pub fn clear_repo(&self, repo_path: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.repo_path.eq_ignore_ascii_case(repo_path));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let mut stats = CacheStats {
            documents: entries.len(),
            ..Default::default()
        };
        for entry in entries.values() {
            stats.blames += entry.blames.len();
            stats.logs += entry.logs.len();
            stats.diffs += entry.diffs.len();
            stats.errors += entry.blames.values().filter(|i| i.is_error()).count()
                + entry.logs.values().filter(|i| i.is_error()).count()
                + entry.diffs.values().filter(|i| i.is_error()).count();
        }
        stats
    }
}
