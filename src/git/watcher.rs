//! Filesystem watch on a repository's `.git` directory.
//!
//! Events are classified with `classify_change` and handed to a callback on
//! the watcher thread. Dropping the `RepositoryWatcher` stops watching.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::repository::{RepositoryChange, classify_change};
use crate::error::{GitError, Result};

pub type ChangeHandler = Arc<dyn Fn(RepositoryChange) + Send + Sync>;

pub struct RepositoryWatcher {
    git_dir: PathBuf,
    // Kept alive to continue watching
    _watcher: RecommendedWatcher,
}

impl RepositoryWatcher {
    pub fn start(repo_path: &Path, on_change: ChangeHandler) -> Result<Self> {
        let git_dir = repo_path.join(".git");
        if !git_dir.is_dir() {
            return Err(GitError::RepoNotFound(repo_path.display().to_string()));
        }

        let root = git_dir.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "Repository watch error");
                        return;
                    }
                };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                for change in changes_for(&root, &event.paths) {
                    on_change(change);
                }
            },
            Config::default(),
        )
        .map_err(|e| GitError::Internal(format!("failed to create watcher: {}", e)))?;

        watcher
            .watch(&git_dir, RecursiveMode::Recursive)
            .map_err(|e| GitError::Internal(format!("failed to watch {}: {}", git_dir.display(), e)))?;

        tracing::info!(path = %git_dir.display(), "Repository watcher started");
        Ok(Self {
            git_dir,
            _watcher: watcher,
        })
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

impl Drop for RepositoryWatcher {
    fn drop(&mut self) {
        tracing::info!(path = %self.git_dir.display(), "Repository watcher stopped");
    }
}

/// Distinct changes for one batch of event paths, in first-seen order
fn changes_for(git_dir: &Path, paths: &[PathBuf]) -> Vec<RepositoryChange> {
    let mut changes = Vec::new();
    for path in paths {
        let Ok(relative) = path.strip_prefix(git_dir) else {
            continue;
        };
        if let Some(change) = classify_change(&relative.to_string_lossy()) {
            if !changes.contains(&change) {
                changes.push(change);
            }
        }
    }
    changes
}
