//! Repository model: one per working-tree root.
//!
//! Owns the repository-level lists (branches, remotes, tags, stashes) as shared
//! queries, independent of the per-file document cache, plus a change event
//! stream. Changes under `.git` are classified into `RepositoryChange` kinds,
//! each of which drops only the lists it can affect.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::cache::SharedQuery;
use crate::events::EventEmitter;
use crate::models::{GitBranch, GitRemote, GitStash, GitTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryChange {
    Config,
    Index,
    Heads,
    Remotes,
    Stashes,
    Tags,
    Closed,
    Unknown,
}

/// Classify a path relative to the `.git` directory
pub fn classify_change(relative: &str) -> Option<RepositoryChange> {
    let path = relative.replace('\\', "/");
    let path = path.trim_start_matches('/');

    // Lock files and object writes are noise; the final rename is reported separately
    if path.ends_with(".lock") || path.starts_with("objects/") {
        return None;
    }

    let change = match path {
        "config" => RepositoryChange::Config,
        "index" => RepositoryChange::Index,
        "HEAD" | "ORIG_HEAD" => RepositoryChange::Heads,
        "FETCH_HEAD" => RepositoryChange::Remotes,
        "refs/stash" | "logs/refs/stash" => RepositoryChange::Stashes,
        p if p.starts_with("refs/heads") => RepositoryChange::Heads,
        p if p.starts_with("refs/remotes") => RepositoryChange::Remotes,
        p if p.starts_with("refs/tags") => RepositoryChange::Tags,
        p if p.starts_with("logs/") => return None,
        _ => RepositoryChange::Unknown,
    };
    Some(change)
}

/// One lazily filled shared query
pub struct QuerySlot<T> {
    query: Mutex<Option<SharedQuery<T>>>,
}

impl<T> Default for QuerySlot<T> {
    fn default() -> Self {
        Self {
            query: Mutex::new(None),
        }
    }
}

impl<T: Send + Sync + 'static> QuerySlot<T> {
    pub fn get_or_insert_with<F>(&self, make: F) -> SharedQuery<T>
    where
        F: FnOnce() -> SharedQuery<T>,
    {
        self.query.lock().get_or_insert_with(make).clone()
    }

    pub fn is_cached(&self) -> bool {
        self.query.lock().is_some()
    }

    pub fn clear(&self) {
        self.query.lock().take();
    }

    /// Clear only if `query` is still the stored one
    pub fn clear_if(&self, query: &SharedQuery<T>) {
        let mut slot = self.query.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(query)) {
            slot.take();
        }
    }
}

pub struct Repository {
    /// Normalized working-tree root
    pub path: String,
    pub name: String,
    pub branches: QuerySlot<Vec<GitBranch>>,
    pub remotes: QuerySlot<Vec<GitRemote>>,
    pub tags: QuerySlot<Vec<GitTag>>,
    pub stash: QuerySlot<GitStash>,
    pub on_did_change: EventEmitter<RepositoryChange>,
}

pub type SharedRepository = Arc<Repository>;

impl Repository {
    pub fn new(path: &str) -> Self {
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string());
        Self {
            path: path.to_string(),
            name,
            branches: QuerySlot::default(),
            remotes: QuerySlot::default(),
            tags: QuerySlot::default(),
            stash: QuerySlot::default(),
            on_did_change: EventEmitter::new(),
        }
    }

    /// Drop the lists affected by `change`, then notify subscribers
    pub fn apply_change(&self, change: RepositoryChange) {
        match change {
            RepositoryChange::Config => {
                self.branches.clear();
                self.remotes.clear();
            }
            RepositoryChange::Heads => self.branches.clear(),
            RepositoryChange::Remotes => {
                self.branches.clear();
                self.remotes.clear();
            }
            RepositoryChange::Stashes => self.stash.clear(),
            RepositoryChange::Tags => self.tags.clear(),
            RepositoryChange::Index => {}
            RepositoryChange::Closed | RepositoryChange::Unknown => self.reset(),
        }
        tracing::debug!(repo = %self.path, ?change, "Repository changed");
        self.on_did_change.fire(&change);
    }

    pub fn reset(&self) {
        self.branches.clear();
        self.remotes.clear();
        self.tags.clear();
        self.stash.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::cache::share;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ready_tags() -> SharedQuery<Vec<GitTag>> {
        share(futures::future::ready(Ok(Some(Arc::new(Vec::new())))))
    }

    #[test]
    fn classifies_git_dir_paths() {
        assert_eq!(classify_change("index"), Some(RepositoryChange::Index));
        assert_eq!(classify_change("config"), Some(RepositoryChange::Config));
        assert_eq!(classify_change("refs/heads/main"), Some(RepositoryChange::Heads));
        assert_eq!(classify_change("refs/remotes/origin/main"), Some(RepositoryChange::Remotes));
        assert_eq!(classify_change("refs/tags/v1"), Some(RepositoryChange::Tags));
        assert_eq!(classify_change("logs/refs/stash"), Some(RepositoryChange::Stashes));
        assert_eq!(classify_change("packed-refs"), Some(RepositoryChange::Unknown));
        assert_eq!(classify_change("index.lock"), None);
        assert_eq!(classify_change("objects/ab/cdef"), None);
        assert_eq!(classify_change("logs/HEAD"), None);
    }

    #[test]
    fn changes_clear_matching_lists() {
        let repo = Repository::new("/work/project");
        assert_eq!(repo.name, "project");

        repo.tags.get_or_insert_with(ready_tags);
        repo.apply_change(RepositoryChange::Heads);
        assert!(repo.tags.is_cached());

        repo.apply_change(RepositoryChange::Tags);
        assert!(!repo.tags.is_cached());
    }

    #[test]
    fn change_event_fires() {
        let repo = Repository::new("/work/project");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        repo.on_did_change.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        repo.apply_change(RepositoryChange::Config);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_if_ignores_replaced_query() {
        let slot: QuerySlot<Vec<GitTag>> = QuerySlot::default();
        let first = slot.get_or_insert_with(ready_tags);
        slot.clear();
        slot.get_or_insert_with(ready_tags);
        slot.clear_if(&first);
        assert!(slot.is_cached());
    }
}
