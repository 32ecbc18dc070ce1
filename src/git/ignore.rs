//! Root `.gitignore` matchers, one per repository.
//!
//! Loaded lazily on the first query for a repository and dropped on every
//! configuration change, so edits to `.gitignore` are picked up then.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use parking_lot::Mutex;

use super::paths;

#[derive(Default)]
pub struct IgnoreMatchers {
    matchers: Mutex<HashMap<String, Arc<Gitignore>>>,
}

impl IgnoreMatchers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `file_name` (repo-relative) is matched by the root `.gitignore`.
    /// Files outside `repo_path` are never ignored.
    pub fn is_ignored(&self, repo_path: &str, file_name: &str) -> bool {
        let path = Path::new(repo_path).join(file_name);
        if path.strip_prefix(repo_path).is_err() {
            return false;
        }
        let matcher = self.matcher(repo_path);
        if matcher.is_empty() {
            return false;
        }
        matcher.matched_path_or_any_parents(&path, false).is_ignore()
    }

    fn matcher(&self, repo_path: &str) -> Arc<Gitignore> {
        let key = paths::to_cache_key(repo_path);
        if let Some(matcher) = self.matchers.lock().get(&key) {
            return matcher.clone();
        }
        let matcher = Arc::new(load(repo_path));
        self.matchers.lock().entry(key).or_insert(matcher).clone()
    }

    pub fn clear(&self) {
        self.matchers.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.matchers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load(repo_path: &str) -> Gitignore {
    let root = Path::new(repo_path);
    let file = root.join(".gitignore");
    if !file.is_file() {
        return Gitignore::empty();
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(err) = builder.add(&file) {
        tracing::warn!(path = %file.display(), error = %err, "Problem reading .gitignore");
    }
    match builder.build() {
        Ok(matcher) => {
            tracing::debug!(path = %file.display(), rules = matcher.num_ignores(), "Loaded .gitignore");
            matcher
        }
        Err(err) => {
            tracing::warn!(path = %file.display(), error = %err, "Invalid .gitignore, ignoring it");
            Gitignore::empty()
        }
    }
}
