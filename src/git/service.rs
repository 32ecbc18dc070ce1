//! `GitService`: the cache and query facade over the git runner.
//!
//! Query methods live in per-concern files (blame.rs, history.rs, diff.rs,
//! status.rs, refs.rs, tree.rs); this file holds the service state, the shared
//! cached-query flow and the invalidation hooks.
//!
//! Invalidation:
//! - index change: every document of the repository plus its remotes list
//! - document saved: that document, unless all it holds are failures
//! - document closed: that document, silently
//! - caching disabled: everything, and watchers stop

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use super::cache::{CacheStats, Cacheable, DocumentCache, QueryResult, share};
use super::ignore::IgnoreMatchers;
use super::locator::find_git;
use super::paths;
use super::repository::{QuerySlot, Repository, RepositoryChange, SharedRepository};
use super::runner::GitRunner;
use super::watcher::RepositoryWatcher;
use crate::config::Config;
use crate::error::{GitError, Result};
use crate::events::EventEmitter;
use crate::models::GitUri;
use crate::parsers::PorcelainVersion;

/// Identifies a failed (or refused) document query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    /// Document cache key (lowercased absolute path)
    pub path: String,
    pub slot: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    #[serde(flatten)]
    pub cache: CacheStats,
    pub repositories: usize,
    pub watchers: usize,
    pub ignore_matchers: usize,
    pub git_in_flight: usize,
}

pub struct GitService {
    pub(crate) runner: Arc<GitRunner>,
    config: RwLock<Config>,
    pub(crate) cache: DocumentCache,
    ignore: IgnoreMatchers,
    repositories: Mutex<HashMap<String, SharedRepository>>,
    /// Directory cache key -> repository root (None: not in a repository)
    pub(crate) repo_paths: Mutex<HashMap<String, Option<String>>>,
    watchers: Mutex<HashMap<String, RepositoryWatcher>>,
    /// Fired whenever cached results may be stale
    pub on_did_change_cache: EventEmitter<()>,
    /// Fired when a blame, log or diff query fails or is refused
    pub on_did_blame_fail: EventEmitter<CacheKey>,
}

impl GitService {
    pub fn new(config: Config, runner: GitRunner) -> Self {
        tracing::info!(
            git = %runner.git_path().display(),
            version = %runner.version(),
            caching = config.caching_enabled,
            "Git service ready"
        );
        Self {
            runner: Arc::new(runner),
            config: RwLock::new(config),
            cache: DocumentCache::new(),
            ignore: IgnoreMatchers::new(),
            repositories: Mutex::new(HashMap::new()),
            repo_paths: Mutex::new(HashMap::new()),
            watchers: Mutex::new(HashMap::new()),
            on_did_change_cache: EventEmitter::new(),
            on_did_blame_fail: EventEmitter::new(),
        }
    }

    /// Locate git (honoring `config.git_path`) and build a service that spawns
    /// real processes
    pub async fn discover(config: Config) -> Result<Self> {
        let location = find_git(config.git_path.as_deref()).await?;
        Ok(Self::new(config, GitRunner::with_tokio(location)))
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub(crate) fn with_config<R>(&self, f: impl FnOnce(&Config) -> R) -> R {
        f(&self.config.read())
    }

    pub(crate) fn caching_enabled(&self) -> bool {
        self.config.read().caching_enabled
    }

    pub(crate) fn porcelain_version(&self) -> PorcelainVersion {
        let forced = self.config.read().use_status_v2;
        match forced.unwrap_or_else(|| self.runner.version().supports_status_v2()) {
            true => PorcelainVersion::V2,
            false => PorcelainVersion::V1,
        }
    }

    pub fn repository(&self, repo_path: &str) -> SharedRepository {
        let normalized = paths::normalize_path(repo_path);
        let key = paths::to_cache_key(&normalized);
        self.repositories
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(Repository::new(&normalized)))
            .clone()
    }

    /// Run a document query through the cache.
    ///
    /// Concurrent callers for the same (document, slot) share one query. If it
    /// fails, every joined caller sees the error, the slot is replaced by an
    /// empty placeholder carrying the message, and `on_did_blame_fail` fires
    /// once.
    pub(crate) async fn cached_query<T, F>(
        &self,
        uri: &GitUri,
        slot: &str,
        make: F,
    ) -> Result<Option<Arc<T>>>
    where
        T: Cacheable,
        F: FnOnce() -> BoxFuture<'static, QueryResult<T>>,
    {
        if !self.caching_enabled() {
            return make().await.map_err(GitError::Shared);
        }

        let key = uri.cache_key();
        let lookup = self
            .cache
            .get_or_insert(&uri.repo_path, &key, slot, || share(make()));
        if !lookup.inserted {
            tracing::trace!(key = %key, slot, kind = T::KIND, "Cache hit");
        }

        match lookup.query.await {
            Ok(value) => Ok(value),
            Err(err) => {
                let message = err.to_string();
                if self.cache.set_error::<T>(&key, slot, lookup.id, &message) {
                    tracing::warn!(key = %key, slot, kind = T::KIND, "Caching failed query: {}", message);
                    self.on_did_blame_fail.fire(&CacheKey {
                        path: key,
                        slot: slot.to_string(),
                    });
                }
                Err(GitError::Shared(err))
            }
        }
    }

    /// If `uri` is matched by the repository's `.gitignore`, store a failure
    /// placeholder for `slot`, fire `on_did_blame_fail` and return true
    pub(crate) fn refuse_ignored<T: Cacheable>(&self, uri: &GitUri, slot: &str) -> bool {
        if !self.config.read().respect_gitignore
            || !self.ignore.is_ignored(&uri.repo_path, &uri.file_name)
        {
            return false;
        }

        let key = uri.cache_key();
        let message = format!("File '{}' is ignored", uri.file_name);
        tracing::debug!(key = %key, slot, "{}", message);
        if self.caching_enabled() {
            self.cache
                .insert_error::<T>(&uri.repo_path, &key, slot, &message);
        }
        self.on_did_blame_fail.fire(&CacheKey {
            path: key,
            slot: slot.to_string(),
        });
        true
    }

    /// Repository-level query (branches, remotes, tags, stashes) through the
    /// repository's slot. Failures are not kept.
    pub(crate) async fn repository_query<T, F>(&self, slot: &QuerySlot<T>, make: F) -> Result<Option<Arc<T>>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> BoxFuture<'static, QueryResult<T>>,
    {
        if !self.caching_enabled() {
            return make().await.map_err(GitError::Shared);
        }
        let query = slot.get_or_insert_with(|| share(make()));
        match query.clone().await {
            Ok(value) => Ok(value),
            Err(err) => {
                slot.clear_if(&query);
                Err(GitError::Shared(err))
            }
        }
    }

    // Invalidation hooks

    /// The index of `repo_path` changed: anything cached for it may be stale
    pub fn on_index_changed(&self, repo_path: &str) {
        let repo_path = paths::normalize_path(repo_path);
        let evicted = self.cache.clear_repo(&repo_path);
        let repository = self.repository(&repo_path);
        repository.remotes.clear();
        tracing::info!(repo = %repo_path, evicted, "Index changed, cache cleared");
        repository.on_did_change.fire(&RepositoryChange::Index);
        self.on_did_change_cache.fire(&());
    }

    pub fn on_document_saved(&self, uri: &GitUri) {
        let key = uri.cache_key();
        if !self.cache.contains(&key) {
            return;
        }
        if self.cache.is_only_errors(&key) {
            tracing::debug!(key = %key, "Saved document only has failed queries, keeping them");
            return;
        }
        self.cache.remove(&key);
        tracing::debug!(key = %key, "Document saved, cache entry evicted");
        self.on_did_change_cache.fire(&());
    }

    pub fn on_document_closed(&self, uri: &GitUri) {
        let key = uri.cache_key();
        if self.cache.remove(&key).is_some() {
            tracing::debug!(key = %key, "Document closed, cache entry evicted");
        }
    }

    /// Route a classified `.git` change
    pub fn on_repository_change(&self, repo_path: &str, change: RepositoryChange) {
        match change {
            RepositoryChange::Index => self.on_index_changed(repo_path),
            RepositoryChange::Closed => {
                let repo_path = paths::normalize_path(repo_path);
                let key = paths::to_cache_key(&repo_path);
                self.cache.clear_repo(&repo_path);
                self.watchers.lock().remove(&key);
                if let Some(repository) = self.repositories.lock().remove(&key) {
                    repository.apply_change(RepositoryChange::Closed);
                }
                self.on_did_change_cache.fire(&());
            }
            other => self.repository(repo_path).apply_change(other),
        }
    }

    pub fn on_configuration_changed(&self, config: Config) {
        let previous = std::mem::replace(&mut *self.config.write(), config.clone());
        self.ignore.clear();

        if previous.git_path != config.git_path {
            tracing::warn!("git path changes take effect when the service is recreated");
        }

        if !config.caching_enabled {
            if previous.caching_enabled {
                tracing::info!("Caching disabled, clearing caches and stopping watchers");
                self.reset();
                self.watchers.lock().clear();
                self.on_did_change_cache.fire(&());
            }
            return;
        }

        if previous.blame_ignore_whitespace != config.blame_ignore_whitespace
            || previous.respect_gitignore != config.respect_gitignore
        {
            tracing::info!("Blame settings changed, clearing document cache");
            self.cache.clear();
            self.on_did_change_cache.fire(&());
        }
    }

    /// Drop every cached result
    pub fn reset(&self) {
        self.cache.clear();
        self.repo_paths.lock().clear();
        for repository in self.repositories.lock().values() {
            repository.reset();
        }
    }

    /// Watch `<repo>/.git` and feed classified changes back into the service.
    /// A no-op while caching is disabled or when already watching.
    pub fn watch_repository(self: &Arc<Self>, repo_path: &str) -> Result<()> {
        if !self.caching_enabled() {
            return Ok(());
        }
        let repo_path = paths::normalize_path(repo_path);
        let key = paths::to_cache_key(&repo_path);
        if self.watchers.lock().contains_key(&key) {
            return Ok(());
        }

        let service: Weak<Self> = Arc::downgrade(self);
        let watched = repo_path.clone();
        let watcher = RepositoryWatcher::start(
            Path::new(&repo_path),
            Arc::new(move |change| {
                if let Some(service) = service.upgrade() {
                    service.on_repository_change(&watched, change);
                }
            }),
        )?;
        self.watchers.lock().insert(key, watcher);
        Ok(())
    }

    pub fn is_watching(&self, repo_path: &str) -> bool {
        let key = paths::to_cache_key(&paths::normalize_path(repo_path));
        self.watchers.lock().contains_key(&key)
    }

    pub fn cache_stats(&self) -> ServiceStats {
        ServiceStats {
            cache: self.cache.stats(),
            repositories: self.repositories.lock().len(),
            watchers: self.watchers.lock().len(),
            ignore_matchers: self.ignore.len(),
            git_in_flight: self.runner.pending_count(),
        }
    }
}
